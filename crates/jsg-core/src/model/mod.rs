pub mod annotations;
mod builtins;
pub mod type_ref;
pub mod types;

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{GenerateError, ModelError};

pub use annotations::{
    Constraint, Inject, InjectValue, JsonSupplier, PropertyAnnotations, Rule, SupplierRef,
    TypeAnnotations,
};
pub use type_ref::TypeRef;
pub use types::{Inclusion, PropertyDef, SubtypeDecl, TypeDef, TypeIdKind, TypeInfo, TypeKind};

/// The declared types schemas are generated from.
///
/// Stands in for runtime reflection: every type a schema may mention must be
/// declared here, either as a builtin or by the caller.
#[derive(Debug, Clone)]
pub struct TypeModel {
    types: IndexMap<String, TypeDef>,
}

#[derive(Debug, Deserialize)]
struct ModelDocument {
    #[serde(default)]
    types: Vec<TypeDef>,
}

impl Default for TypeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeModel {
    /// A model holding only the builtin types.
    pub fn new() -> Self {
        let mut types = IndexMap::new();
        for def in builtins::builtin_types() {
            types.insert(def.name.clone(), def);
        }
        Self { types }
    }

    /// Parse a model document (`types: [...]`) from YAML.
    pub fn from_yaml(input: &str) -> Result<Self, ModelError> {
        let doc: ModelDocument = serde_yaml_ng::from_str(input)?;
        Self::from_document(doc)
    }

    /// Parse a model document from JSON.
    pub fn from_json(input: &str) -> Result<Self, ModelError> {
        let doc: ModelDocument = serde_json::from_str(input)?;
        Self::from_document(doc)
    }

    fn from_document(doc: ModelDocument) -> Result<Self, ModelError> {
        let mut model = Self::new();
        let mut declared = HashSet::new();
        for def in doc.types {
            if !declared.insert(def.name.clone()) {
                return Err(ModelError::DuplicateType(def.name));
            }
            model.types.insert(def.name.clone(), def);
        }
        Ok(model)
    }

    /// Add or replace a type declaration.
    pub fn define(mut self, def: TypeDef) -> Self {
        self.insert(def);
        self
    }

    pub fn insert(&mut self, def: TypeDef) {
        self.types.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn resolve(&self, ty: &TypeRef) -> Result<&TypeDef, GenerateError> {
        self.get(&ty.name)
            .ok_or_else(|| GenerateError::UnknownType(ty.to_string()))
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// The declared type of `property` inside the instantiation `owner`.
    pub fn property_type(&self, owner: &TypeRef, def: &TypeDef, property: &PropertyDef) -> TypeRef {
        property.ty.substitute(&def.type_params, &owner.args)
    }

    /// All supertypes of `name`, nearest first, each listed once.
    pub fn supertypes_of(&self, name: &str) -> Vec<&TypeDef> {
        self.supertype_refs(&TypeRef::named(name))
            .into_iter()
            .map(|(def, _)| def)
            .collect()
    }

    /// Supertypes of the instantiation `ty`, nearest first, each with the
    /// type arguments the inheritance chain binds it to.
    pub fn supertype_refs(&self, ty: &TypeRef) -> Vec<(&TypeDef, TypeRef)> {
        let mut out = Vec::new();
        let Some(def) = self.get(&ty.name) else {
            return out;
        };
        let mut seen = HashSet::from([ty.name.clone()]);
        let mut queue: Vec<TypeRef> = def
            .supertypes
            .iter()
            .map(|s| s.substitute(&def.type_params, &ty.args))
            .collect();
        let mut i = 0;
        while i < queue.len() {
            let current = queue[i].clone();
            i += 1;
            if !seen.insert(current.name.clone()) {
                continue;
            }
            if let Some(def) = self.get(&current.name) {
                queue.extend(
                    def.supertypes
                        .iter()
                        .map(|s| s.substitute(&def.type_params, &current.args)),
                );
                out.push((def, current));
            }
        }
        out
    }

    pub fn is_subtype_of(&self, name: &str, base: &str) -> bool {
        self.supertypes_of(name).iter().any(|s| s.name == base)
    }

    /// Every declared type assignable to `base`, excluding `base` itself,
    /// in declaration order.
    pub fn subtypes_of(&self, base: &str) -> Vec<&TypeDef> {
        self.types
            .values()
            .filter(|def| def.name != base && self.is_subtype_of(&def.name, base))
            .collect()
    }
}

/// Finds the subtypes of a polymorphism base when the base does not list
/// them by name.
pub trait SubtypeScanner: Send + Sync {
    fn subtypes_of(&self, model: &TypeModel, base: &str) -> Vec<String>;
}

/// Scans the whole model for assignable types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelScanner;

impl SubtypeScanner for ModelScanner {
    fn subtypes_of(&self, model: &TypeModel, base: &str) -> Vec<String> {
        model
            .subtypes_of(base)
            .into_iter()
            .map(|d| d.name.clone())
            .collect()
    }
}

/// Restricts a model scan to types under the given module prefixes.
#[derive(Debug, Clone, Default)]
pub struct ModuleScanner {
    pub modules: Vec<String>,
}

impl SubtypeScanner for ModuleScanner {
    fn subtypes_of(&self, model: &TypeModel, base: &str) -> Vec<String> {
        model
            .subtypes_of(base)
            .into_iter()
            .filter(|d| self.modules.iter().any(|m| d.name.starts_with(m.as_str())))
            .map(|d| d.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoo() -> TypeModel {
        TypeModel::new()
            .define(TypeDef::object("zoo::Animal"))
            .define(TypeDef::object("zoo::Pet").extends("zoo::Animal"))
            .define(TypeDef::object("zoo::Dog").extends("zoo::Pet"))
            .define(TypeDef::object("wild::Wolf").extends("zoo::Animal"))
    }

    #[test]
    fn test_builtins_present() {
        let model = TypeModel::new();
        assert_eq!(model.get("String").unwrap().kind, TypeKind::String);
        assert!(model.get("i32").unwrap().primitive);
        assert_eq!(model.get("Vec").unwrap().kind, TypeKind::Array);
        assert_eq!(model.get("()").unwrap().kind, TypeKind::Null);
    }

    #[test]
    fn test_supertypes_nearest_first() {
        let model = zoo();
        let names: Vec<_> = model
            .supertypes_of("zoo::Dog")
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["zoo::Pet", "zoo::Animal"]);
    }

    #[test]
    fn test_supertype_refs_bind_arguments() {
        let model = TypeModel::new()
            .define(TypeDef::object("Base").params(["T"]))
            .define(
                TypeDef::object("Mid")
                    .params(["U"])
                    .extends_type(TypeRef::parse("Base<Vec<U>>").unwrap()),
            )
            .define(TypeDef::object("Leaf").extends_type(TypeRef::parse("Mid<String>").unwrap()));

        let chain: Vec<_> = model
            .supertype_refs(&TypeRef::named("Leaf"))
            .into_iter()
            .map(|(def, ty)| (def.name.as_str(), ty.to_string()))
            .collect();
        assert_eq!(
            chain,
            vec![("Mid", "Mid<String>".to_string()), ("Base", "Base<Vec<String>>".to_string())]
        );
    }

    #[test]
    fn test_subtypes_transitive() {
        let model = zoo();
        let names = ModelScanner.subtypes_of(&model, "zoo::Animal");
        assert_eq!(names, vec!["zoo::Pet", "zoo::Dog", "wild::Wolf"]);

        let scoped = ModuleScanner {
            modules: vec!["wild::".to_string()],
        };
        assert_eq!(scoped.subtypes_of(&model, "zoo::Animal"), vec!["wild::Wolf"]);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
types:
  - name: pets::Pet
    properties:
      - name: name
        type: String
        required: true
      - name: tags
        type: Vec<String>
"#;
        let model = TypeModel::from_yaml(yaml).unwrap();
        let pet = model.get("pets::Pet").unwrap();
        assert_eq!(pet.kind, TypeKind::Object);
        assert_eq!(pet.properties.len(), 2);
        assert!(pet.properties[0].required);
        assert_eq!(pet.properties[1].ty.to_string(), "Vec<String>");
    }

    #[test]
    fn test_from_yaml_rejects_duplicates() {
        let yaml = r#"
types:
  - name: A
  - name: A
"#;
        assert!(matches!(
            TypeModel::from_yaml(yaml),
            Err(ModelError::DuplicateType(_))
        ));
    }

    #[test]
    fn test_property_type_substitution() {
        let model = TypeModel::new().define(
            TypeDef::object("Boxed")
                .params(["T"])
                .property(PropertyDef::new("value", TypeRef::named("T"))),
        );
        let def = model.get("Boxed").unwrap();
        let owner = TypeRef::parse("Boxed<String>").unwrap();
        let ty = model.property_type(&owner, def, &def.properties[0]);
        assert_eq!(ty, TypeRef::named("String"));

        let raw = TypeRef::named("Boxed");
        assert_eq!(model.property_type(&raw, def, &def.properties[0]), TypeRef::unit());
    }
}
