use std::fmt;

use serde::{Deserialize, Serialize};

use super::annotations::{PropertyAnnotations, TypeAnnotations};
use super::type_ref::{PATH_SEPARATOR, TypeRef, simple_name};

/// The shape of a type, as far as schema generation cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// A string restricted to the declared `values`.
    Enum,
    /// Sequence or set; the element type is the first type argument.
    Array,
    /// Key/value map; the value type is the second type argument.
    Map,
    /// Optional wrapper around the first type argument.
    Optional,
    #[default]
    Object,
    /// Serialized by custom code that exposes no shape.
    Opaque,
}

/// A declared type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDef {
    /// Qualified name, `::`-separated.
    pub name: String,
    pub kind: TypeKind,
    /// Primitive values can never be absent.
    pub primitive: bool,
    /// External names of enum constants, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
    /// Direct supertypes (parent type first, then implemented interfaces).
    /// Their arguments may name this type's parameters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<TypeRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDef>,
    pub annotations: TypeAnnotations,
    /// Present on polymorphism bases: how instances are discriminated.
    pub type_info: Option<TypeInfo>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Object)
    }

    pub fn primitive(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            primitive: true,
            ..Self::new(name, kind)
        }
    }

    pub fn enumeration(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Self::new(name, TypeKind::Enum)
        }
    }

    pub fn params(mut self, params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(TypeRef::named(supertype));
        self
    }

    /// Declare a generic instantiation as a supertype, e.g. `Page<T>`.
    pub fn extends_type(mut self, supertype: TypeRef) -> Self {
        self.supertypes.push(supertype);
        self
    }

    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn annotated(mut self, annotations: TypeAnnotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn polymorphic(mut self, type_info: TypeInfo) -> Self {
        self.type_info = Some(type_info);
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Module path including the trailing separator, e.g. `shapes::`.
    /// Types declared at the top level yield the bare separator.
    pub fn package_prefix(&self) -> &str {
        match self.name.rfind(PATH_SEPARATOR) {
            Some(ix) => &self.name[..ix + PATH_SEPARATOR.len()],
            None => PATH_SEPARATOR,
        }
    }

    /// Name used for definitions and name-based type ids.
    pub fn declared_name(&self) -> &str {
        self.annotations
            .type_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.simple_name())
    }
}

/// A declared property of an object type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Always present when serialized.
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub annotations: PropertyAnnotations,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            annotations: PropertyAnnotations::default(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn annotated(mut self, annotations: PropertyAnnotations) -> Self {
        self.annotations = annotations;
        self
    }
}

/// How instances of a polymorphism base carry their concrete type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeInfo {
    #[serde(rename = "use")]
    pub use_id: TypeIdKind,
    pub include: Inclusion,
    /// Discriminator property name; defaults per [`TypeIdKind`].
    pub property: Option<String>,
    /// Explicit closed subtype list, in declaration order.
    pub subtypes: Option<Vec<SubtypeDecl>>,
}

impl TypeInfo {
    pub fn by_name(property: impl Into<String>) -> Self {
        Self {
            property: Some(property.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, use_id: TypeIdKind) -> Self {
        self.use_id = use_id;
        self
    }

    pub fn include(mut self, include: Inclusion) -> Self {
        self.include = include;
        self
    }

    pub fn subtype(mut self, ty: impl Into<String>, name: Option<&str>) -> Self {
        self.subtypes.get_or_insert_with(Vec::new).push(SubtypeDecl {
            ty: ty.into(),
            name: name.map(str::to_string),
        });
        self
    }

    pub fn property_name(&self) -> &str {
        match self.property.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => self.use_id.default_property(),
        }
    }
}

/// What identifies a concrete subtype.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeIdKind {
    /// A logical name: declared subtype name, type name annotation or simple name.
    #[default]
    Name,
    /// The fully qualified type name.
    Class,
    /// The qualified name relative to the base type's module.
    MinimalClass,
    /// A named strategy registered in the generator config.
    Custom(String),
}

impl TypeIdKind {
    pub fn default_property(&self) -> &'static str {
        match self {
            TypeIdKind::Class => "@class",
            TypeIdKind::MinimalClass => "@c",
            TypeIdKind::Name | TypeIdKind::Custom(_) => "@type",
        }
    }
}

/// Where the discriminator lives in serialized form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusion {
    #[default]
    Property,
    ExistingProperty,
    WrapperObject,
    WrapperArray,
    ExternalProperty,
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Inclusion::Property => "property",
            Inclusion::ExistingProperty => "existing_property",
            Inclusion::WrapperObject => "wrapper_object",
            Inclusion::WrapperArray => "wrapper_array",
            Inclusion::ExternalProperty => "external_property",
        };
        f.write_str(s)
    }
}

/// One entry of an explicit subtype list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtypeDecl {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_prefix() {
        assert_eq!(TypeDef::object("zoo::animals::Dog").package_prefix(), "zoo::animals::");
        assert_eq!(TypeDef::object("Dog").package_prefix(), "::");
    }

    #[test]
    fn test_declared_name_prefers_type_name() {
        let plain = TypeDef::object("zoo::Dog");
        assert_eq!(plain.declared_name(), "Dog");

        let renamed = TypeDef::object("zoo::Dog").annotated(TypeAnnotations {
            type_name: Some("doggy".to_string()),
            ..TypeAnnotations::default()
        });
        assert_eq!(renamed.declared_name(), "doggy");
    }

    #[test]
    fn test_default_property_names() {
        assert_eq!(TypeInfo::default().property_name(), "@type");
        assert_eq!(
            TypeInfo::default()
                .with_id(TypeIdKind::MinimalClass)
                .property_name(),
            "@c"
        );
        assert_eq!(TypeInfo::by_name("kind").property_name(), "kind");
    }

    #[test]
    fn test_parse_type_info_yaml() {
        let yaml = r#"
use: minimal_class
include: existing_property
property: clazz
"#;
        let info: TypeInfo = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(info.use_id, TypeIdKind::MinimalClass);
        assert_eq!(info.include, Inclusion::ExistingProperty);
        assert!(info.subtypes.is_none());

        let custom: TypeInfo = serde_yaml_ng::from_str("use: { custom: tags }").unwrap();
        assert_eq!(custom.use_id, TypeIdKind::Custom("tags".to_string()));
    }
}
