use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::model::{ModelScanner, SubtypeScanner, SupplierRef, TypeDef, TypeRef};

/// Generator options. Immutable once handed to a
/// [`SchemaGenerator`](crate::generate::SchemaGenerator).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Property `someName` gets `"title": "Some Name"`.
    pub auto_generate_title_for_properties: bool,
    pub default_array_format: Option<String>,
    /// Render `Option<T>` properties as `oneOf: [null, T]`.
    pub use_one_of_for_option: bool,
    /// Render every other non-required property as `oneOf: [null, T]`.
    pub use_one_of_for_nullables: bool,
    pub use_property_ordering: bool,
    pub hide_polymorphism_type_property: bool,
    pub use_min_length_for_not_null: bool,
    /// Name definitions after qualified type names instead of simple names.
    pub use_type_id_for_definition_name: bool,
    pub custom_type_format_mapping: IndexMap<String, String>,
    pub use_multiple_editor_select_via_property: bool,
    /// Array types rendered with `uniqueItems`.
    pub unique_item_types: Vec<String>,
    /// Substitute the value type wherever the key type is referenced.
    pub type_remapping: IndexMap<String, TypeRef>,
    pub fail_on_unknown_properties: bool,
    pub validation_groups: Vec<String>,
    pub draft: SchemaDraft,
    /// Suppliers reachable through `inject.supplier_lookup`.
    #[serde(skip)]
    pub json_suppliers: IndexMap<String, SupplierRef>,
    /// Subtype discovery for bases not discriminated by name.
    #[serde(skip)]
    pub subclass_resolver: Arc<dyn SubtypeScanner>,
    /// Strategies for `use: { custom: <name> }` discrimination.
    #[serde(skip)]
    pub type_id_resolvers: IndexMap<String, Arc<dyn TypeIdResolver>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            auto_generate_title_for_properties: false,
            default_array_format: None,
            use_one_of_for_option: false,
            use_one_of_for_nullables: false,
            use_property_ordering: false,
            hide_polymorphism_type_property: false,
            use_min_length_for_not_null: false,
            use_type_id_for_definition_name: false,
            custom_type_format_mapping: IndexMap::new(),
            use_multiple_editor_select_via_property: false,
            unique_item_types: Vec::new(),
            type_remapping: IndexMap::new(),
            fail_on_unknown_properties: true,
            validation_groups: Vec::new(),
            draft: SchemaDraft::default(),
            json_suppliers: IndexMap::new(),
            subclass_resolver: Arc::new(ModelScanner),
            type_id_resolvers: IndexMap::new(),
        }
    }
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field(
                "auto_generate_title_for_properties",
                &self.auto_generate_title_for_properties,
            )
            .field("default_array_format", &self.default_array_format)
            .field("use_one_of_for_option", &self.use_one_of_for_option)
            .field("use_one_of_for_nullables", &self.use_one_of_for_nullables)
            .field("use_property_ordering", &self.use_property_ordering)
            .field(
                "hide_polymorphism_type_property",
                &self.hide_polymorphism_type_property,
            )
            .field("use_min_length_for_not_null", &self.use_min_length_for_not_null)
            .field(
                "use_type_id_for_definition_name",
                &self.use_type_id_for_definition_name,
            )
            .field("custom_type_format_mapping", &self.custom_type_format_mapping)
            .field(
                "use_multiple_editor_select_via_property",
                &self.use_multiple_editor_select_via_property,
            )
            .field("unique_item_types", &self.unique_item_types)
            .field("type_remapping", &self.type_remapping)
            .field("fail_on_unknown_properties", &self.fail_on_unknown_properties)
            .field("validation_groups", &self.validation_groups)
            .field("draft", &self.draft)
            .field("json_suppliers", &self.json_suppliers.keys().collect::<Vec<_>>())
            .field(
                "type_id_resolvers",
                &self.type_id_resolvers.keys().collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Formats applied to the date-like builtins by the json-editor preset.
pub const DEFAULT_DATE_FORMAT_MAPPING: &[(&str, &str)] = &[
    ("chrono::NaiveDateTime", "datetime-local"),
    ("chrono::DateTime", "datetime"),
    ("chrono::NaiveDate", "date"),
];

impl GeneratorConfig {
    /// Options suited to generating HTML5 editors with json-editor.
    pub fn json_editor() -> Self {
        Self {
            auto_generate_title_for_properties: true,
            default_array_format: Some("table".to_string()),
            use_one_of_for_option: true,
            use_property_ordering: true,
            hide_polymorphism_type_property: true,
            use_min_length_for_not_null: true,
            custom_type_format_mapping: DEFAULT_DATE_FORMAT_MAPPING
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            use_multiple_editor_select_via_property: true,
            unique_item_types: vec!["HashSet".to_string(), "BTreeSet".to_string()],
            ..Self::default()
        }
    }

    /// Vanilla output, except that optional and nullable properties accept `null`.
    pub fn nullable() -> Self {
        Self {
            use_one_of_for_option: true,
            use_one_of_for_nullables: true,
            ..Self::default()
        }
    }

    pub fn with_json_supplier(mut self, key: impl Into<String>, supplier: SupplierRef) -> Self {
        self.json_suppliers.insert(key.into(), supplier);
        self
    }

    pub fn with_type_id_resolver(
        mut self,
        key: impl Into<String>,
        resolver: Arc<dyn TypeIdResolver>,
    ) -> Self {
        self.type_id_resolvers.insert(key.into(), resolver);
        self
    }

    pub fn with_subclass_resolver(mut self, resolver: Arc<dyn SubtypeScanner>) -> Self {
        self.subclass_resolver = resolver;
        self
    }
}

/// Computes discriminator values for `use: { custom: <name> }` bases.
pub trait TypeIdResolver: Send + Sync {
    fn id_for(&self, base: &TypeDef, subtype: &TypeDef) -> Option<String>;
}

/// JSON Schema dialect announced in `$schema`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SchemaDraft {
    #[default]
    #[serde(rename = "draft-04")]
    Draft04,
    #[serde(rename = "draft-06")]
    Draft06,
    #[serde(rename = "draft-07")]
    Draft07,
    #[serde(rename = "draft-2019-09")]
    Draft201909,
}

impl SchemaDraft {
    pub fn url(self) -> &'static str {
        match self {
            SchemaDraft::Draft04 => "http://json-schema.org/draft-04/schema#",
            SchemaDraft::Draft06 => "http://json-schema.org/draft-06/schema#",
            SchemaDraft::Draft07 => "http://json-schema.org/draft-07/schema#",
            SchemaDraft::Draft201909 => "http://json-schema.org/draft/2019-09/schema#",
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".jsg.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<GeneratorConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: GeneratorConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# jsg configuration: https://github.com/urmzd/jsonschema-generator
draft: draft-04                  # draft-04 | draft-06 | draft-07 | draft-2019-09

auto_generate_title_for_properties: false   # someName → "Some Name"
# default_array_format: table
use_one_of_for_option: false     # Option<T> → oneOf [null, T]
use_one_of_for_nullables: false  # any non-required property → oneOf [null, T]
use_property_ordering: false     # emit propertyOrder
hide_polymorphism_type_property: false
use_min_length_for_not_null: false
use_type_id_for_definition_name: false
use_multiple_editor_select_via_property: false
fail_on_unknown_properties: true # additionalProperties: false

custom_type_format_mapping: {}
  # chrono::NaiveDate: date
unique_item_types: []
  # - HashSet
type_remapping: {}
  # shapes::Shape: shapes::Circle
validation_groups: []
"#
}
