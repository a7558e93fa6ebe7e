use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::type_ref::TypeRef;

/// Validation group every constraint belongs to when it names none.
pub const DEFAULT_GROUP: &str = "Default";

/// Annotations declared on a type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeAnnotations {
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    /// Editor options copied verbatim into an `options` object.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, String>,
    pub inject: Option<Inject>,
    /// Overrides the simple name in definition names and name-based type ids.
    pub type_name: Option<String>,
}

/// Annotations declared on a property.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyAnnotations {
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    #[serde(rename = "default")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, String>,
    pub inject: Option<Inject>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Content type of an optional whose argument was erased.
    pub content_type: Option<TypeRef>,
}

impl PropertyAnnotations {
    /// The first constraint matching `pred` whose groups are active.
    pub fn constraint<'a, F>(&'a self, active_groups: &[String], pred: F) -> Option<&'a Rule>
    where
        F: Fn(&Rule) -> bool,
    {
        self.constraints
            .iter()
            .find(|c| pred(&c.rule) && groups_apply(&c.groups, active_groups))
            .map(|c| &c.rule)
    }
}

/// A validation constraint together with the groups it applies under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(flatten)]
    pub rule: Rule,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

impl Constraint {
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            groups: Vec::new(),
        }
    }

    pub fn in_groups(mut self, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    NotNull,
    NotBlank,
    NotEmpty,
    Pattern {
        regexp: String,
    },
    PatternList {
        regexps: Vec<String>,
    },
    Size {
        #[serde(default)]
        min: u64,
        #[serde(default)]
        max: Option<u64>,
    },
    Min {
        value: i64,
    },
    Max {
        value: i64,
    },
    DecimalMin {
        value: String,
    },
    DecimalMax {
        value: String,
    },
    Email,
}

/// Whether an annotation declared for `declared` groups is honoured when the
/// generator runs with `active` groups. Empty sets mean the default group.
pub fn groups_apply(declared: &[String], active: &[String]) -> bool {
    let default = [DEFAULT_GROUP.to_string()];
    let active = if active.is_empty() { &default[..] } else { active };
    let declared = if declared.is_empty() {
        &default[..]
    } else {
        declared
    };
    declared.iter().any(|g| active.contains(g))
}

/// Raw JSON merged into (or replacing) a generated schema node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Inject {
    pub json: String,
    #[serde(skip)]
    pub supplier: Option<SupplierRef>,
    /// Key into the generator's configured json suppliers.
    pub supplier_lookup: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub strings: Vec<InjectValue<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ints: Vec<InjectValue<i64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bools: Vec<InjectValue<bool>>,
    /// Wipe the generated node before merging.
    pub override_all: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

impl Default for Inject {
    fn default() -> Self {
        Self {
            json: "{}".to_string(),
            supplier: None,
            supplier_lookup: None,
            strings: Vec::new(),
            ints: Vec::new(),
            bools: Vec::new(),
            override_all: false,
            groups: Vec::new(),
        }
    }
}

impl Inject {
    pub fn json(json: impl Into<String>) -> Self {
        Self {
            json: json.into(),
            ..Self::default()
        }
    }
}

/// A `/`-separated path and the value written at its end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectValue<T> {
    pub path: String,
    pub value: T,
}

/// Produces raw JSON on demand for an injection.
pub trait JsonSupplier: Send + Sync {
    fn supply(&self) -> Option<Value>;
}

impl<F> JsonSupplier for F
where
    F: Fn() -> Option<Value> + Send + Sync,
{
    fn supply(&self) -> Option<Value> {
        self()
    }
}

/// Shared handle to a [`JsonSupplier`].
#[derive(Clone)]
pub struct SupplierRef(pub Arc<dyn JsonSupplier>);

impl SupplierRef {
    pub fn new(supplier: impl JsonSupplier + 'static) -> Self {
        Self(Arc::new(supplier))
    }

    pub fn supply(&self) -> Option<Value> {
        self.0.supply()
    }
}

impl fmt::Debug for SupplierRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SupplierRef(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_group_matches_default_group() {
        assert!(groups_apply(&[], &[]));
        assert!(groups_apply(&groups(&["Default"]), &[]));
        assert!(groups_apply(&[], &groups(&["Default"])));
    }

    #[test]
    fn test_named_group_requires_activation() {
        assert!(!groups_apply(&groups(&["Group1"]), &[]));
        assert!(groups_apply(&groups(&["Group1"]), &groups(&["Group1"])));
        assert!(!groups_apply(&[], &groups(&["Group1"])));
        assert!(groups_apply(
            &groups(&["Group1", "Group2"]),
            &groups(&["Group2"])
        ));
    }

    #[test]
    fn test_parse_constraints_yaml() {
        let yaml = r#"
- rule: not_null
- rule: size
  max: 20
  groups: [Group1]
- rule: pattern
  regexp: "^a"
"#;
        let parsed: Vec<Constraint> = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(parsed[0].rule, Rule::NotNull);
        assert_eq!(
            parsed[1].rule,
            Rule::Size {
                min: 0,
                max: Some(20)
            }
        );
        assert_eq!(parsed[1].groups, groups(&["Group1"]));
        assert_eq!(
            parsed[2].rule,
            Rule::Pattern {
                regexp: "^a".to_string()
            }
        );
    }

    #[test]
    fn test_inject_defaults_to_empty_object() {
        let inject: Inject = serde_yaml_ng::from_str("override_all: true").unwrap();
        assert_eq!(inject.json, "{}");
        assert!(inject.override_all);
        assert!(inject.supplier.is_none());
    }
}
