use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::Value;

use crate::error::GenerateError;
use crate::model::{PropertyDef, TypeDef, TypeKind, TypeRef};
use crate::schema::{NodeId, SchemaType};

use super::Generation;
use super::naming::camel_case_to_sentence_case;
use super::visitor::optional_content;

const NOT_INCLUDED_TITLE: &str = "Not included";

impl<'g> Generation<'g> {
    pub(crate) fn visit_object(
        &mut self,
        ty: &TypeRef,
        def: &'g TypeDef,
        node: NodeId,
        level: usize,
        property: Option<&'g PropertyDef>,
    ) -> Result<(), GenerateError> {
        trace!("expect object format {}", ty);
        self.put_default(node, property, |v| Ok(Value::from(v)))?;

        let subtypes = self.discover_subtypes(def)?;
        if !subtypes.is_empty() {
            return self.build_union(&subtypes, node, level);
        }

        // The root document is the root type's schema; it never gets a definition.
        if level == 0 {
            return self.build_object(ty, def, node, level);
        }

        let info = self.get_or_create_definition(ty, |g, definition| {
            g.build_object(ty, def, definition, level)
        })?;
        if let Some(reference) = info.reference {
            self.arena.put(node, "$ref", reference);
        }
        Ok(())
    }

    /// Fill `node` with the object body of `ty`: class level decoration, the
    /// discriminator of a polymorphic subtype, then every property.
    fn build_object(
        &mut self,
        ty: &TypeRef,
        def: &'g TypeDef,
        node: NodeId,
        level: usize,
    ) -> Result<(), GenerateError> {
        let config = self.config;
        let annotations = &def.annotations;
        self.arena.put_type(node, SchemaType::Object);
        self.arena
            .put(node, "additionalProperties", !config.fail_on_unknown_properties);

        if let Some(format) = annotations
            .format
            .as_ref()
            .or_else(|| config.custom_type_format_mapping.get(&def.name))
        {
            self.arena.put(node, "format", format.as_str());
        }
        if let Some(description) = &annotations.description {
            self.arena.put(node, "description", description.as_str());
        }
        if let Some(title) = &annotations.title {
            self.arena.put(node, "title", title.as_str());
        }
        if !annotations.options.is_empty() {
            let options = self.arena.child(node, "options");
            for (name, value) in &annotations.options {
                self.arena.put(options, name, value.as_str());
            }
        }

        if let Some(inject) = annotations.inject.as_ref().filter(|i| self.inject_applies(i)) {
            if self.inject(node, inject)? {
                return Ok(());
            }
        }

        let properties = self.arena.child(node, "properties");

        if let Some(poly) = self.polymorphism_info(def)? {
            if annotations.title.is_none() {
                self.arena.put(node, "title", poly.value.as_str());
            }

            // A single-valued enum, so data built from this branch of the
            // union carries the right discriminator.
            let discriminator = self.arena.child(properties, &poly.property);
            self.arena.put_type(discriminator, SchemaType::String);
            self.arena
                .put(discriminator, "enum", vec![Value::from(poly.value.as_str())]);
            self.arena.put(discriminator, "default", poly.value.as_str());
            if config.hide_polymorphism_type_property {
                let options = self.arena.child(discriminator, "options");
                self.arena.put(options, "hidden", true);
            }

            self.arena
                .append(node, "required", Value::from(poly.property.as_str()));

            if config.use_multiple_editor_select_via_property {
                let options = self.arena.child(node, "options");
                let select = self.arena.child(options, "multiple_editor_select_via_property");
                self.arena.put(select, "property", poly.property.as_str());
                self.arena.put(select, "value", poly.value.as_str());
            }
        }

        let mut next_property_order: u64 = 1;
        for (property, property_ty) in self.collect_properties(ty, def) {
            if self.arena.contains(properties, &property.name) {
                debug!(
                    "ignoring property '{}' in {} since it has already been added, probably as the polymorphism type property",
                    property.name, ty
                );
                continue;
            }
            if config.use_property_ordering {
                let meta = self.arena.child(properties, &property.name);
                self.arena.put(meta, "propertyOrder", next_property_order);
                next_property_order += 1;
            }
            self.build_property(node, properties, property, &property_ty, level)?;
        }
        Ok(())
    }

    /// Properties of `def` with their types resolved: inherited ones first,
    /// farthest ancestor first. A redeclared property keeps the position of
    /// the one it overrides.
    fn collect_properties(&self, ty: &TypeRef, def: &'g TypeDef) -> Vec<(&'g PropertyDef, TypeRef)> {
        let model = self.model;
        let mut collected: IndexMap<&str, (&'g PropertyDef, TypeRef)> = IndexMap::new();
        for (ancestor, ancestor_ty) in model.supertype_refs(ty).into_iter().rev() {
            for property in &ancestor.properties {
                let property_ty = model.property_type(&ancestor_ty, ancestor, property);
                collected.insert(property.name.as_str(), (property, property_ty));
            }
        }
        for property in &def.properties {
            let property_ty = model.property_type(ty, def, property);
            collected.insert(property.name.as_str(), (property, property_ty));
        }
        collected.into_values().collect()
    }

    fn build_property(
        &mut self,
        object: NodeId,
        properties: NodeId,
        property: &'g PropertyDef,
        property_ty: &TypeRef,
        level: usize,
    ) -> Result<(), GenerateError> {
        trace!("property {}: {}", property.name, property_ty);
        let model = self.model;
        let config = self.config;
        let declared = model.resolve(property_ty)?;

        let required =
            declared.primitive || property.required || self.validation_required(property);
        let optional_type = declared.kind == TypeKind::Optional;

        // Title, description and options describe the property as a whole and
        // go on `meta`; the structural schema goes on `main`.
        let meta = self.arena.child(properties, &property.name);
        let nullable = !required
            && ((config.use_one_of_for_option && optional_type)
                || (config.use_one_of_for_nullables && !optional_type));
        let main = if nullable {
            self.arena.list(meta, "oneOf");
            let null = self.arena.create();
            self.arena.put_type(null, SchemaType::Null);
            self.arena.put(null, "title", NOT_INCLUDED_TITLE);
            self.arena.append(meta, "oneOf", null);
            let real = self.arena.create();
            self.arena.append(meta, "oneOf", real);
            real
        } else {
            meta
        };

        let target = self.remap(property_ty);
        self.with_suspended_work(|g| g.visit(&target, main, level + 1, Some(property)))?;

        if required {
            self.arena
                .append(object, "required", Value::from(property.name.as_str()));
        }

        let annotations = &property.annotations;
        let value_ty = if optional_type {
            optional_content(property_ty, Some(property))
        } else {
            property_ty.clone()
        };

        if let Some(format) = annotations
            .format
            .as_ref()
            .or_else(|| config.custom_type_format_mapping.get(&value_ty.name))
        {
            self.arena.put(main, "format", format.as_str());
        }

        if let Some(description) = &annotations.description {
            self.arena.put(meta, "description", description.as_str());
        }
        if let Some(title) = &annotations.title {
            self.arena.put(meta, "title", title.as_str());
        } else if config.auto_generate_title_for_properties {
            self.arena
                .put(meta, "title", camel_case_to_sentence_case(&property.name));
        }

        if !annotations.options.is_empty() {
            let options = self.arena.child(meta, "options");
            for (name, value) in &annotations.options {
                self.arena.put(options, name, value.as_str());
            }
        }

        // Enums cannot be annotated per use, so fall back to the type's own injection.
        let inject = annotations
            .inject
            .as_ref()
            .filter(|i| self.inject_applies(i))
            .or_else(|| {
                model
                    .get(&value_ty.name)
                    .and_then(|d| d.annotations.inject.as_ref())
                    .filter(|i| self.inject_applies(i))
            });
        if let Some(inject) = inject {
            self.inject(meta, inject)?;
        }
        Ok(())
    }
}
