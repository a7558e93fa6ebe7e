//! Annotation driven overlays applied to the structural schema fragments.

use serde_json::{Map, Value};

use crate::error::GenerateError;
use crate::model::annotations::groups_apply;
use crate::model::{Inject, PropertyDef, Rule};
use crate::schema::{NodeId, merge_value};

use super::Generation;

impl<'g> Generation<'g> {
    /// The first active constraint on `property` matching `pred`.
    pub(crate) fn constraint<F>(&self, property: Option<&'g PropertyDef>, pred: F) -> Option<&'g Rule>
    where
        F: Fn(&Rule) -> bool,
    {
        property?
            .annotations
            .constraint(&self.config.validation_groups, pred)
    }

    pub(crate) fn has_constraint<F>(&self, property: Option<&'g PropertyDef>, pred: F) -> bool
    where
        F: Fn(&Rule) -> bool,
    {
        self.constraint(property, pred).is_some()
    }

    /// Whether a not-null, not-blank or not-empty constraint applies.
    pub(crate) fn validation_required(&self, property: &'g PropertyDef) -> bool {
        self.has_constraint(Some(property), |r| {
            matches!(r, Rule::NotNull | Rule::NotBlank | Rule::NotEmpty)
        })
    }

    pub(crate) fn inject_applies(&self, inject: &Inject) -> bool {
        groups_apply(&inject.groups, &self.config.validation_groups)
    }

    /// Write the property's declared default under `default`, converted by
    /// `convert`.
    pub(crate) fn put_default<F>(
        &mut self,
        node: NodeId,
        property: Option<&'g PropertyDef>,
        convert: F,
    ) -> Result<(), GenerateError>
    where
        F: FnOnce(&str) -> Result<Value, GenerateError>,
    {
        if let Some(default) = property.and_then(|p| p.annotations.default_value.as_deref()) {
            let value = convert(default)?;
            self.arena.put(node, "default", value);
        }
        Ok(())
    }

    pub(crate) fn put_examples(&mut self, node: NodeId, property: Option<&'g PropertyDef>) {
        let Some(property) = property else {
            return;
        };
        if property.annotations.examples.is_empty() {
            return;
        }
        let examples: Vec<Value> = property
            .annotations
            .examples
            .iter()
            .map(|e| Value::String(e.clone()))
            .collect();
        self.arena.put(node, "examples", examples);
    }

    /// Build the injected JSON and merge it into `node`. Returns whether the
    /// injection replaced the node's content entirely.
    pub(crate) fn inject(&mut self, node: NodeId, inject: &Inject) -> Result<bool, GenerateError> {
        let mut injected: Value =
            serde_json::from_str(&inject.json).map_err(GenerateError::InjectJson)?;

        if let Some(supplied) = inject.supplier.as_ref().and_then(|s| s.supply()) {
            merge_value(&mut injected, &supplied);
        }

        if let Some(key) = inject.supplier_lookup.as_deref().filter(|k| !k.is_empty()) {
            let supplier = self
                .config
                .json_suppliers
                .get(key)
                .ok_or_else(|| GenerateError::UnknownJsonSupplier(key.to_string()))?;
            if let Some(supplied) = supplier.supply() {
                merge_value(&mut injected, &supplied);
            }
        }

        for v in &inject.strings {
            set_path(&mut injected, &v.path, Value::from(v.value.clone()));
        }
        for v in &inject.ints {
            set_path(&mut injected, &v.path, Value::from(v.value));
        }
        for v in &inject.bools {
            set_path(&mut injected, &v.path, Value::from(v.value));
        }

        if inject.override_all {
            self.arena.clear(node);
        }
        self.arena.merge(node, &injected);
        Ok(inject.override_all)
    }
}

pub(crate) fn parse_number(value: &str) -> Result<Value, GenerateError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| GenerateError::InvalidDefault {
            value: value.to_string(),
            kind: "number",
        })
}

pub(crate) fn parse_integer(value: &str) -> Result<Value, GenerateError> {
    value
        .trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|_| GenerateError::InvalidDefault {
            value: value.to_string(),
            kind: "integer",
        })
}

pub(crate) fn parse_bool(value: &str) -> Value {
    Value::Bool(value.eq_ignore_ascii_case("true"))
}

pub(crate) fn parse_decimal(value: &str) -> Result<Value, GenerateError> {
    parse_number(value).map_err(|_| GenerateError::InvalidDecimal(value.to_string()))
}

/// Write `leaf` at the `/`-separated `path`, creating intermediate objects.
fn set_path(target: &mut Value, path: &str, leaf: Value) {
    let mut parts: Vec<&str> = path.split('/').collect();
    let last = parts.pop().unwrap_or_default();
    let mut current = target;
    for part in parts {
        let Value::Object(map) = current else {
            return;
        };
        let child = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        current = child;
    }
    if let Value::Object(map) = current {
        map.insert(last.to_string(), leaf);
    }
}
