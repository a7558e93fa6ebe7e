use std::collections::{HashMap, HashSet};

use log::trace;

use crate::error::GenerateError;
use crate::model::TypeRef;
use crate::schema::{NodeId, SchemaArena, definition_ref};

use super::Generation;

/// Outcome of [`Generation::get_or_create_definition`].
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionInfo<R> {
    /// `$ref` target to emit, or `None` when the caller is already inside
    /// the definition being populated.
    pub reference: Option<String>,
    /// What the builder returned, when it ran.
    pub result: Option<R>,
}

#[derive(Debug, Clone)]
struct WorkInProgress {
    type_in_progress: TypeRef,
    node_in_progress: NodeId,
}

/// What the registry knows about a type at lookup time.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lookup {
    /// Never seen: a definition must be created.
    Create,
    /// Already defined; emit a `$ref`.
    Existing(String),
    /// Currently being populated; keep writing into this node.
    Reentrant(NodeId),
}

/// Maps types to shared definitions for one generation.
///
/// Holds a single current work-in-progress marker plus a stack of suspended
/// ones. While a definition is populated, a nested lookup of the very same
/// type is routed back into the in-progress node instead of starting a
/// duplicate definition.
#[derive(Debug)]
pub(crate) struct DefinitionRegistry {
    refs: HashMap<TypeRef, String>,
    long_refs: HashSet<String>,
    container: NodeId,
    work_in_progress: Option<WorkInProgress>,
    suspended: Vec<Option<WorkInProgress>>,
}

impl DefinitionRegistry {
    pub(crate) fn new(arena: &mut SchemaArena) -> Self {
        Self {
            refs: HashMap::new(),
            long_refs: HashSet::new(),
            container: arena.create(),
            work_in_progress: None,
            suspended: Vec::new(),
        }
    }

    pub(crate) fn lookup(&self, ty: &TypeRef) -> Result<Lookup, GenerateError> {
        let Some(reference) = self.refs.get(ty) else {
            return Ok(Lookup::Create);
        };
        match &self.work_in_progress {
            None => Ok(Lookup::Existing(reference.clone())),
            Some(wip) if wip.type_in_progress == *ty => Ok(Lookup::Reentrant(wip.node_in_progress)),
            Some(wip) => Err(GenerateError::WrongTypeInProgress {
                in_progress: wip.type_in_progress.clone(),
                requested: ty.clone(),
            }),
        }
    }

    pub(crate) fn reference(&self, ty: &TypeRef) -> Option<&str> {
        self.refs.get(ty).map(String::as_str)
    }

    /// Register `ty` under `name` (suffixed `_1`, `_2`, ... on collision),
    /// attach an empty node to the definitions container and mark it as the
    /// current work in progress. Returns the long reference and the node.
    pub(crate) fn register(
        &mut self,
        arena: &mut SchemaArena,
        ty: &TypeRef,
        name: &str,
    ) -> (String, NodeId) {
        let mut short_ref = name.to_string();
        let mut long_ref = definition_ref(&short_ref);
        let mut retry_count = 0;
        while self.long_refs.contains(&long_ref) {
            retry_count += 1;
            short_ref = format!("{}_{}", name, retry_count);
            long_ref = definition_ref(&short_ref);
        }
        trace!("new definition {} for {}", short_ref, ty);

        self.refs.insert(ty.clone(), long_ref.clone());
        self.long_refs.insert(long_ref.clone());

        let node = arena.create();
        arena.attach(self.container, &short_ref, node);
        self.work_in_progress = Some(WorkInProgress {
            type_in_progress: ty.clone(),
            node_in_progress: node,
        });
        (long_ref, node)
    }

    pub(crate) fn finish_current(&mut self) {
        self.work_in_progress = None;
    }

    /// Save the current marker and clear it.
    pub(crate) fn push_work_in_progress(&mut self) {
        self.suspended.push(self.work_in_progress.take());
    }

    /// Restore the marker saved by the matching push.
    pub(crate) fn pop_work_in_progress(&mut self) {
        self.work_in_progress = self.suspended.pop().flatten();
    }

    /// The definitions container, or `None` if nothing was ever defined.
    pub(crate) fn finalize(&self) -> Option<NodeId> {
        if self.refs.is_empty() {
            None
        } else {
            Some(self.container)
        }
    }
}

impl Generation<'_> {
    /// Either create the definition for `ty` (running `build` on its fresh
    /// node), return a `$ref` to the existing one, or, when `ty` is the
    /// definition currently under construction, run `build` on the
    /// in-progress node and return no reference.
    pub(crate) fn get_or_create_definition<R, F>(
        &mut self,
        ty: &TypeRef,
        build: F,
    ) -> Result<DefinitionInfo<R>, GenerateError>
    where
        F: FnOnce(&mut Self, NodeId) -> Result<R, GenerateError>,
    {
        match self.registry.lookup(ty)? {
            Lookup::Existing(reference) => Ok(DefinitionInfo {
                reference: Some(reference),
                result: None,
            }),
            Lookup::Reentrant(node) => {
                trace!("reentrant definition of {}", ty);
                let result = build(self, node)?;
                Ok(DefinitionInfo {
                    reference: None,
                    result: Some(result),
                })
            }
            Lookup::Create => {
                let name = self.definition_name(ty)?;
                let (reference, node) = self.registry.register(&mut self.arena, ty, &name);
                let built = build(self, node);
                self.registry.finish_current();
                Ok(DefinitionInfo {
                    reference: Some(reference),
                    result: Some(built?),
                })
            }
        }
    }

    /// Run `f` with the current work in progress suspended, restoring it
    /// afterwards whether or not `f` fails.
    pub(crate) fn with_suspended_work<R, F>(&mut self, f: F) -> Result<R, GenerateError>
    where
        F: FnOnce(&mut Self) -> Result<R, GenerateError>,
    {
        self.registry.push_work_in_progress();
        let result = f(self);
        self.registry.pop_work_in_progress();
        result
    }

    /// `Name`, or `Name(Arg1,Arg2)` for generic instantiations.
    pub(crate) fn definition_name(&self, ty: &TypeRef) -> Result<String, GenerateError> {
        let def = self.model.resolve(ty)?;
        let base = if self.config.use_type_id_for_definition_name {
            def.name.clone()
        } else {
            def.declared_name().to_string()
        };
        if !ty.is_generic() {
            return Ok(base);
        }
        let args = ty
            .args
            .iter()
            .map(|a| self.definition_name(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{}({})", base, args.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::GeneratorConfig;
    use crate::model::{TypeDef, TypeModel};

    #[test]
    fn test_register_suffixes_collisions() {
        let mut arena = SchemaArena::new();
        let mut registry = DefinitionRegistry::new(&mut arena);

        let (first, _) = registry.register(&mut arena, &TypeRef::named("a::Item"), "Item");
        registry.finish_current();
        let (second, _) = registry.register(&mut arena, &TypeRef::named("b::Item"), "Item");
        registry.finish_current();
        let (third, _) = registry.register(&mut arena, &TypeRef::named("c::Item"), "Item");
        registry.finish_current();

        assert_eq!(first, "#/definitions/Item");
        assert_eq!(second, "#/definitions/Item_1");
        assert_eq!(third, "#/definitions/Item_2");
    }

    #[test]
    fn test_lookup_states() {
        let mut arena = SchemaArena::new();
        let mut registry = DefinitionRegistry::new(&mut arena);
        let a = TypeRef::named("A");
        let b = TypeRef::named("B");

        assert_eq!(registry.lookup(&a).unwrap(), Lookup::Create);
        let (_, node) = registry.register(&mut arena, &a, "A");
        assert_eq!(registry.lookup(&a).unwrap(), Lookup::Reentrant(node));

        registry.push_work_in_progress();
        assert_eq!(
            registry.lookup(&a).unwrap(),
            Lookup::Existing("#/definitions/A".to_string())
        );
        registry.pop_work_in_progress();
        assert_eq!(registry.lookup(&a).unwrap(), Lookup::Reentrant(node));

        let (_, _) = registry.register(&mut arena, &b, "B");
        registry.finish_current();
        let (_, _) = registry.register(&mut arena, &TypeRef::named("C"), "C");
        assert!(matches!(
            registry.lookup(&b),
            Err(GenerateError::WrongTypeInProgress { .. })
        ));
    }

    #[test]
    fn test_finalize_empty() {
        let mut arena = SchemaArena::new();
        let registry = DefinitionRegistry::new(&mut arena);
        assert!(registry.finalize().is_none());
    }

    #[test]
    fn test_get_or_create_runs_builder_once() {
        let model = TypeModel::new().define(TypeDef::object("Thing"));
        let config = GeneratorConfig::default();
        let mut generation = Generation::new(&model, &config);
        let thing = TypeRef::named("Thing");

        let first = generation
            .get_or_create_definition(&thing, |g, node| {
                g.arena.put(node, "type", "object");
                Ok(1)
            })
            .unwrap();
        assert_eq!(first.reference.as_deref(), Some("#/definitions/Thing"));
        assert_eq!(first.result, Some(1));

        let second = generation
            .get_or_create_definition(&thing, |_, _| Ok(2))
            .unwrap();
        assert_eq!(second.reference.as_deref(), Some("#/definitions/Thing"));
        assert_eq!(second.result, None);

        let container = generation.registry.finalize().unwrap();
        assert_eq!(
            generation.render(container),
            json!({"Thing": {"type": "object"}})
        );
    }

    #[test]
    fn test_get_or_create_reentrant_writes_same_node() {
        let model = TypeModel::new().define(TypeDef::object("Thing"));
        let config = GeneratorConfig::default();
        let mut generation = Generation::new(&model, &config);
        let thing = TypeRef::named("Thing");

        let outer = generation
            .get_or_create_definition(&thing, |g, outer_node| {
                let inner = g.get_or_create_definition(&thing, |g, inner_node| {
                    assert_eq!(inner_node, outer_node);
                    g.arena.put(inner_node, "type", "object");
                    Ok(())
                })?;
                assert!(inner.reference.is_none());
                Ok(())
            })
            .unwrap();
        assert!(outer.reference.is_some());
    }

    #[test]
    fn test_suspended_work_restored_on_error() {
        let model = TypeModel::new().define(TypeDef::object("Thing"));
        let config = GeneratorConfig::default();
        let mut generation = Generation::new(&model, &config);
        let thing = TypeRef::named("Thing");

        let _ = generation.get_or_create_definition(&thing, |g, node| {
            let failed: Result<(), _> = g.with_suspended_work(|_| {
                Err(GenerateError::UnknownType("Missing".to_string()))
            });
            assert!(failed.is_err());
            assert_eq!(g.registry.lookup(&thing).unwrap(), Lookup::Reentrant(node));
            Ok(())
        });
    }

    #[test]
    fn test_definition_name_generics() {
        let model = TypeModel::new()
            .define(TypeDef::object("gen::Boxed").params(["T"]))
            .define(TypeDef::object("gen::Other"));
        let config = GeneratorConfig::default();
        let generation = Generation::new(&model, &config);

        let ty = TypeRef::parse("gen::Boxed<gen::Other>").unwrap();
        assert_eq!(generation.definition_name(&ty).unwrap(), "Boxed(Other)");
        let nested = TypeRef::parse("gen::Boxed<Vec<String>>").unwrap();
        assert_eq!(
            generation.definition_name(&nested).unwrap(),
            "Boxed(Vec(String))"
        );

        let qualified = GeneratorConfig {
            use_type_id_for_definition_name: true,
            ..GeneratorConfig::default()
        };
        let generation = Generation::new(&model, &qualified);
        assert_eq!(
            generation.definition_name(&ty).unwrap(),
            "gen::Boxed(gen::Other)"
        );
    }
}
