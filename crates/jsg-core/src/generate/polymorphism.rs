use log::{debug, trace};

use crate::error::GenerateError;
use crate::model::{Inclusion, TypeDef, TypeIdKind, TypeRef};
use crate::schema::NodeId;

use super::Generation;
use super::naming;

/// How a concrete subtype announces itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolymorphismInfo {
    /// Name of the discriminator property.
    pub property: String,
    /// The discriminator value identifying the subtype.
    pub value: String,
}

impl<'g> Generation<'g> {
    /// Concrete subtypes of `base`, or nothing when `base` is not a
    /// polymorphism base. Only the type's own discrimination descriptor is
    /// consulted, never an inherited one.
    pub(crate) fn discover_subtypes(&self, base: &TypeDef) -> Result<Vec<String>, GenerateError> {
        let mut expanding = Vec::new();
        self.expand_subtypes(base, &mut expanding)
    }

    /// `expanding` holds the bases whose lists are being expanded above this
    /// call; meeting one of them again means the lists form a cycle.
    fn expand_subtypes<'m>(
        &'m self,
        base: &'m TypeDef,
        expanding: &mut Vec<&'m str>,
    ) -> Result<Vec<String>, GenerateError> {
        let Some(info) = &base.type_info else {
            return Ok(Vec::new());
        };

        if info.use_id != TypeIdKind::Name {
            return Ok(self
                .config
                .subclass_resolver
                .subtypes_of(self.model, &base.name));
        }

        let Some(declared) = &info.subtypes else {
            let found: Vec<String> = self
                .model
                .subtypes_of(&base.name)
                .into_iter()
                .map(|d| d.name.clone())
                .collect();
            debug!(
                "no subtype list on {} - scanned the model and found {:?}",
                base.name, found
            );
            return Ok(found);
        };

        expanding.push(base.name.as_str());
        let mut found = Vec::new();
        for decl in declared {
            if expanding.contains(&decl.ty.as_str()) {
                return Err(GenerateError::CyclicSubtypes {
                    base: base.name.clone(),
                    subtype: decl.ty.clone(),
                });
            }
            let nested = match self.model.get(&decl.ty) {
                Some(def) => self.expand_subtypes(def, expanding)?,
                None => Vec::new(),
            };
            if nested.is_empty() {
                found.push(decl.ty.clone());
            } else {
                found.extend(nested);
            }
        }
        expanding.pop();
        Ok(found)
    }

    /// Discriminator for `subtype`, if one of its supertypes is a
    /// polymorphism base.
    pub(crate) fn polymorphism_info(
        &self,
        subtype: &TypeDef,
    ) -> Result<Option<PolymorphismInfo>, GenerateError> {
        let Some((base, info)) = self
            .model
            .supertypes_of(&subtype.name)
            .into_iter()
            .find_map(|s| s.type_info.as_ref().map(|info| (s, info)))
        else {
            return Ok(None);
        };

        if !matches!(info.include, Inclusion::Property | Inclusion::ExistingProperty) {
            return Err(GenerateError::UnsupportedInclusion {
                base: base.name.clone(),
                inclusion: info.include,
            });
        }

        let value = match self.declared_subtype_name(subtype) {
            Some(name) => name,
            None => match &info.use_id {
                TypeIdKind::Name => subtype.declared_name().to_string(),
                TypeIdKind::Class => subtype.name.clone(),
                TypeIdKind::MinimalClass => naming::minimal_class_id(base, subtype),
                TypeIdKind::Custom(key) => {
                    let resolver = self
                        .config
                        .type_id_resolvers
                        .get(key)
                        .ok_or_else(|| GenerateError::UnknownTypeIdResolver(key.clone()))?;
                    resolver
                        .id_for(base, subtype)
                        .unwrap_or_else(|| subtype.declared_name().to_string())
                }
            },
        };

        Ok(Some(PolymorphismInfo {
            property: info.property_name().to_string(),
            value,
        }))
    }

    /// A name given to `subtype` in the subtype list of any of its bases.
    fn declared_subtype_name(&self, subtype: &TypeDef) -> Option<String> {
        self.model
            .supertypes_of(&subtype.name)
            .into_iter()
            .filter_map(|s| s.type_info.as_ref()?.subtypes.as_ref())
            .flatten()
            .find(|decl| decl.ty == subtype.name)
            .and_then(|decl| decl.name.clone())
            .filter(|name| !name.is_empty())
    }

    /// Render `node` as a `oneOf` over the definitions of `subtypes`, in the
    /// given order.
    pub(crate) fn build_union(
        &mut self,
        subtypes: &[String],
        node: NodeId,
        level: usize,
    ) -> Result<(), GenerateError> {
        self.arena.list(node, "oneOf");

        for subtype in subtypes {
            trace!("polymorphism - subtype {}", subtype);
            let sub_ref = TypeRef::named(subtype.clone());
            let info = self.get_or_create_definition(&sub_ref, |g, definition| {
                let target = g.remap(&sub_ref);
                g.visit(&target, definition, level + 1, None)
            })?;

            let entry = self.arena.create();
            let reference = info
                .reference
                .or_else(|| self.registry.reference(&sub_ref).map(str::to_string));
            if let Some(reference) = reference {
                self.arena.put(entry, "$ref", reference);
            }
            let title = self
                .model
                .get(subtype)
                .and_then(|def| def.annotations.title.clone());
            if let Some(title) = title {
                self.arena.put(entry, "title", title);
            }
            self.arena.append(node, "oneOf", entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{GeneratorConfig, TypeIdResolver};
    use crate::model::{ModuleScanner, TypeInfo, TypeModel};

    fn shapes() -> TypeModel {
        TypeModel::new()
            .define(
                TypeDef::object("shapes::Shape").polymorphic(
                    TypeInfo::by_name("kind")
                        .subtype("shapes::Square", Some("square"))
                        .subtype("shapes::Round", None),
                ),
            )
            .define(TypeDef::object("shapes::Square").extends("shapes::Shape"))
            .define(
                TypeDef::object("shapes::Round")
                    .extends("shapes::Shape")
                    .polymorphic(
                        TypeInfo::by_name("kind")
                            .subtype("shapes::Circle", None)
                            .subtype("shapes::Oval", Some("oval")),
                    ),
            )
            .define(TypeDef::object("shapes::Circle").extends("shapes::Round"))
            .define(TypeDef::object("shapes::Oval").extends("shapes::Round"))
    }

    #[test]
    fn test_nested_lists_expand_to_leaves() {
        let model = shapes();
        let config = GeneratorConfig::default();
        let generation = Generation::new(&model, &config);
        let base = model.get("shapes::Shape").unwrap();
        assert_eq!(
            generation.discover_subtypes(base).unwrap(),
            vec!["shapes::Square", "shapes::Circle", "shapes::Oval"]
        );
        assert!(generation
            .discover_subtypes(model.get("shapes::Square").unwrap())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_discriminator_values() {
        let model = shapes();
        let config = GeneratorConfig::default();
        let generation = Generation::new(&model, &config);

        let square = generation
            .polymorphism_info(model.get("shapes::Square").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(
            square,
            PolymorphismInfo {
                property: "kind".to_string(),
                value: "square".to_string()
            }
        );

        // The nearest base wins; names declared on it are honoured.
        let oval = generation
            .polymorphism_info(model.get("shapes::Oval").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(oval.value, "oval");
        let circle = generation
            .polymorphism_info(model.get("shapes::Circle").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(circle.value, "Circle");

        assert!(generation
            .polymorphism_info(model.get("shapes::Shape").unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_class_based_ids() {
        let model = TypeModel::new()
            .define(
                TypeDef::object("zoo::Animal")
                    .polymorphic(TypeInfo::default().with_id(TypeIdKind::MinimalClass)),
            )
            .define(TypeDef::object("zoo::Dog").extends("zoo::Animal"))
            .define(TypeDef::object("wild::Wolf").extends("zoo::Animal"))
            .define(
                TypeDef::object("cars::Car").polymorphic(TypeInfo::default().with_id(TypeIdKind::Class)),
            )
            .define(TypeDef::object("cars::Volvo").extends("cars::Car"));
        let config = GeneratorConfig::default().with_subclass_resolver(Arc::new(ModuleScanner {
            modules: vec!["zoo::".to_string(), "cars::".to_string()],
        }));
        let generation = Generation::new(&model, &config);

        assert_eq!(
            generation
                .discover_subtypes(model.get("zoo::Animal").unwrap())
                .unwrap(),
            vec!["zoo::Dog"]
        );
        let dog = generation
            .polymorphism_info(model.get("zoo::Dog").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(dog.property, "@c");
        assert_eq!(dog.value, "::Dog");
        let wolf = generation
            .polymorphism_info(model.get("wild::Wolf").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(wolf.value, "wild::Wolf");

        let volvo = generation
            .polymorphism_info(model.get("cars::Volvo").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(volvo.property, "@class");
        assert_eq!(volvo.value, "cars::Volvo");
    }

    struct Upper;

    impl TypeIdResolver for Upper {
        fn id_for(&self, _base: &TypeDef, subtype: &TypeDef) -> Option<String> {
            Some(subtype.simple_name().to_uppercase())
        }
    }

    #[test]
    fn test_custom_resolver() {
        let model = TypeModel::new()
            .define(
                TypeDef::object("Event")
                    .polymorphic(TypeInfo::default().with_id(TypeIdKind::Custom("upper".to_string()))),
            )
            .define(TypeDef::object("Click").extends("Event"));

        let missing = GeneratorConfig::default();
        let generation = Generation::new(&model, &missing);
        assert!(matches!(
            generation.polymorphism_info(model.get("Click").unwrap()),
            Err(GenerateError::UnknownTypeIdResolver(key)) if key == "upper"
        ));

        let config = GeneratorConfig::default().with_type_id_resolver("upper", Arc::new(Upper));
        let generation = Generation::new(&model, &config);
        let click = generation
            .polymorphism_info(model.get("Click").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(click.value, "CLICK");
        assert_eq!(click.property, "@type");
    }

    #[test]
    fn test_wrapper_inclusion_is_rejected() {
        let model = TypeModel::new()
            .define(
                TypeDef::object("Msg")
                    .polymorphic(TypeInfo::by_name("t").include(Inclusion::WrapperObject)),
            )
            .define(TypeDef::object("Ping").extends("Msg"));
        let config = GeneratorConfig::default();
        let generation = Generation::new(&model, &config);
        let err = generation
            .polymorphism_info(model.get("Ping").unwrap())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "polymorphism using include = wrapper_object is not supported (base type Msg)"
        );
    }
}
