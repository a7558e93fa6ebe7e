use log::{trace, warn};
use serde_json::Value;

use crate::error::GenerateError;
use crate::model::{PropertyDef, Rule, TypeDef, TypeKind, TypeRef};
use crate::schema::{NodeId, SchemaType};

use super::Generation;
use super::decorate::{parse_bool, parse_decimal, parse_integer, parse_number};

const NOT_BLANK_PATTERN: &str = r"^.*\S+.*$";

impl<'g> Generation<'g> {
    /// Populate `node` with the schema for `ty`.
    ///
    /// `level` is zero only for the root type. `property` is the property
    /// whose type is being visited, if the visit starts directly beneath one;
    /// its annotations decorate the fragment.
    pub(crate) fn visit(
        &mut self,
        ty: &TypeRef,
        node: NodeId,
        level: usize,
        property: Option<&'g PropertyDef>,
    ) -> Result<(), GenerateError> {
        let model = self.model;
        let def = model.resolve(ty)?;
        match def.kind {
            TypeKind::String => self.visit_string(ty, node, property),
            TypeKind::Enum => {
                self.visit_string(ty, node, property)?;
                let values: Vec<Value> = def.values.iter().map(|v| Value::from(v.as_str())).collect();
                self.arena.put(node, "enum", values);
                Ok(())
            }
            TypeKind::Number => self.visit_number(ty, node, property),
            TypeKind::Integer => self.visit_integer(ty, node, property),
            TypeKind::Boolean => {
                trace!("expect boolean format {}", ty);
                self.arena.put_type(node, SchemaType::Boolean);
                self.put_default(node, property, |v| Ok(parse_bool(v)))
            }
            TypeKind::Null => {
                trace!("expect null format {}", ty);
                self.arena.put_type(node, SchemaType::Null);
                Ok(())
            }
            TypeKind::Array => self.visit_array(ty, def, node, level, property),
            TypeKind::Map => self.visit_map(ty, node, level, property),
            TypeKind::Optional => {
                let inner = self.remap(&optional_content(ty, property));
                trace!("expect optional format {} - content {}", ty, inner);
                self.visit(&inner, node, level, property)
            }
            TypeKind::Object => self.visit_object(ty, def, node, level, property),
            TypeKind::Opaque => {
                warn!(
                    "unable to process {} - it is probably using a custom serializer which does not expose its shape",
                    ty
                );
                Ok(())
            }
        }
    }

    fn visit_string(
        &mut self,
        ty: &TypeRef,
        node: NodeId,
        property: Option<&'g PropertyDef>,
    ) -> Result<(), GenerateError> {
        trace!("expect string format {}", ty);
        self.arena.put_type(node, SchemaType::String);

        let not_blank = self.has_constraint(property, |r| matches!(r, Rule::NotBlank));
        if not_blank {
            self.arena.put(node, "pattern", NOT_BLANK_PATTERN);
        }
        if let Some(Rule::Pattern { regexp }) =
            self.constraint(property, |r| matches!(r, Rule::Pattern { .. }))
        {
            self.arena.put(node, "pattern", regexp.as_str());
        }
        if let Some(Rule::PatternList { regexps }) =
            self.constraint(property, |r| matches!(r, Rule::PatternList { .. }))
        {
            let mut pattern = String::from("^");
            for regexp in regexps {
                pattern.push_str("(?=");
                pattern.push_str(regexp);
                pattern.push(')');
            }
            pattern.push_str(".*$");
            self.arena.put(node, "pattern", pattern);
        }

        self.put_default(node, property, |v| Ok(Value::from(v)))?;
        self.put_examples(node, property);

        if self.has_constraint(property, |r| matches!(r, Rule::Email)) {
            self.arena.put(node, "format", "email");
        }

        if let Some(Rule::Size { min, max }) =
            self.constraint(property, |r| matches!(r, Rule::Size { .. }))
        {
            if *min != 0 {
                self.arena.put(node, "minLength", *min);
            }
            if let Some(max) = max {
                self.arena.put(node, "maxLength", *max);
            }
        } else if self.config.use_min_length_for_not_null
            && self.has_constraint(property, |r| matches!(r, Rule::NotNull))
        {
            self.arena.put(node, "minLength", 1);
        } else if not_blank || self.has_constraint(property, |r| matches!(r, Rule::NotEmpty)) {
            self.arena.put(node, "minLength", 1);
        }
        Ok(())
    }

    fn visit_number(
        &mut self,
        ty: &TypeRef,
        node: NodeId,
        property: Option<&'g PropertyDef>,
    ) -> Result<(), GenerateError> {
        trace!("expect number format {}", ty);
        self.arena.put_type(node, SchemaType::Number);

        self.put_bounds(node, property);
        if let Some(Rule::DecimalMin { value }) =
            self.constraint(property, |r| matches!(r, Rule::DecimalMin { .. }))
        {
            self.arena.put(node, "minimum", parse_decimal(value)?);
        }
        if let Some(Rule::DecimalMax { value }) =
            self.constraint(property, |r| matches!(r, Rule::DecimalMax { .. }))
        {
            self.arena.put(node, "maximum", parse_decimal(value)?);
        }

        self.put_default(node, property, parse_number)?;
        self.put_examples(node, property);
        Ok(())
    }

    fn visit_integer(
        &mut self,
        ty: &TypeRef,
        node: NodeId,
        property: Option<&'g PropertyDef>,
    ) -> Result<(), GenerateError> {
        trace!("expect integer format {}", ty);
        self.arena.put_type(node, SchemaType::Integer);

        self.put_bounds(node, property);
        self.put_default(node, property, parse_integer)?;
        self.put_examples(node, property);
        Ok(())
    }

    /// `min` / `max` constraints as `minimum` / `maximum`.
    fn put_bounds(&mut self, node: NodeId, property: Option<&'g PropertyDef>) {
        if let Some(Rule::Min { value }) = self.constraint(property, |r| matches!(r, Rule::Min { .. })) {
            self.arena.put(node, "minimum", *value);
        }
        if let Some(Rule::Max { value }) = self.constraint(property, |r| matches!(r, Rule::Max { .. })) {
            self.arena.put(node, "maximum", *value);
        }
    }

    fn visit_array(
        &mut self,
        ty: &TypeRef,
        def: &'g TypeDef,
        node: NodeId,
        level: usize,
        property: Option<&'g PropertyDef>,
    ) -> Result<(), GenerateError> {
        trace!("expect array format {}", ty);
        self.arena.put_type(node, SchemaType::Array);

        if self.is_unique_item_type(def) {
            self.arena.put(node, "uniqueItems", true);
            self.arena.put(node, "format", "checkbox");
        } else if let Some(format) = &self.config.default_array_format {
            self.arena.put(node, "format", format.as_str());
        }

        if let Some(Rule::Size { min, max }) =
            self.constraint(property, |r| matches!(r, Rule::Size { .. }))
        {
            self.arena.put(node, "minItems", *min);
            if let Some(max) = max {
                self.arena.put(node, "maxItems", *max);
            }
        }
        if self.has_constraint(property, |r| matches!(r, Rule::NotEmpty)) {
            self.arena.put(node, "minItems", 1);
        }

        self.put_default(node, property, |v| Ok(Value::from(v)))?;

        let items = self.arena.child(node, "items");
        let element = self.remap(&ty.args.first().cloned().unwrap_or_else(TypeRef::unit));
        trace!("array element type {}", element);
        self.visit(&element, items, level + 1, None)
    }

    fn is_unique_item_type(&self, def: &TypeDef) -> bool {
        self.config
            .unique_item_types
            .iter()
            .any(|t| *t == def.name || self.model.is_subtype_of(t, &def.name))
    }

    fn visit_map(
        &mut self,
        ty: &TypeRef,
        node: NodeId,
        level: usize,
        property: Option<&'g PropertyDef>,
    ) -> Result<(), GenerateError> {
        trace!("expect map format {}", ty);
        // No map type in JSON Schema: an object whose values all share a schema.
        self.arena.put_type(node, SchemaType::Object);

        if self.has_constraint(property, |r| matches!(r, Rule::NotEmpty)) {
            self.arena.put(node, "minProperties", 1);
        }
        self.put_default(node, property, |v| Ok(Value::from(v)))?;

        let additional = self.arena.create();
        let value_ty = self.remap(&ty.args.get(1).cloned().unwrap_or_else(TypeRef::unit));
        self.with_suspended_work(|g| g.visit(&value_ty, additional, level + 1, None))?;
        self.arena.attach(node, "additionalProperties", additional);
        Ok(())
    }
}

/// The type wrapped by an optional. An erased argument falls back to the
/// property's declared content type.
pub(crate) fn optional_content(ty: &TypeRef, property: Option<&PropertyDef>) -> TypeRef {
    let content_type = property.and_then(|p| p.annotations.content_type.as_ref());
    match (ty.args.first(), content_type) {
        (Some(arg), Some(content)) if *arg == TypeRef::unit() => content.clone(),
        (Some(arg), _) => arg.clone(),
        (None, Some(content)) => content.clone(),
        (None, None) => TypeRef::unit(),
    }
}
