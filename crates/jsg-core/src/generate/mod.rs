//! Schema generation: walks a [`TypeModel`] from a root type and builds a
//! JSON Schema document, sharing object types through `definitions`.

mod decorate;
mod definitions;
pub mod naming;
mod object;
mod polymorphism;
mod visitor;

use log::trace;
use serde_json::Value;

use crate::config::GeneratorConfig;
use crate::error::GenerateError;
use crate::model::{TypeModel, TypeRef};
use crate::schema::{NodeId, SchemaArena};

use definitions::DefinitionRegistry;

pub use definitions::DefinitionInfo;
pub use polymorphism::PolymorphismInfo;

/// Generates JSON Schema documents for types of a [`TypeModel`].
pub struct SchemaGenerator<'m> {
    model: &'m TypeModel,
    config: GeneratorConfig,
}

impl<'m> SchemaGenerator<'m> {
    pub fn new(model: &'m TypeModel, config: GeneratorConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn model(&self) -> &TypeModel {
        self.model
    }

    /// Generate the schema for `root`, titled after its simple name.
    pub fn generate(&self, root: &TypeRef) -> Result<Value, GenerateError> {
        self.generate_with(root, None, None)
    }

    /// Generate the schema for `root` with an explicit title and description.
    /// An empty title leaves the document untitled. Title and description
    /// annotations on the root type take precedence over both.
    pub fn generate_with(
        &self,
        root: &TypeRef,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Value, GenerateError> {
        let root = remap(&self.config, root);
        let mut generation = Generation::new(self.model, &self.config);
        let node = generation.arena.create();

        generation
            .arena
            .put(node, "$schema", self.config.draft.url());

        let title = match title {
            Some(t) => t.to_string(),
            None => naming::camel_case_to_sentence_case(root.simple_name()),
        };
        if !title.is_empty() {
            generation.arena.put(node, "title", title);
        }
        if let Some(description) = description {
            generation.arena.put(node, "description", description);
        }

        generation.visit(&root, node, 0, None)?;

        if let Some(definitions) = generation.registry.finalize() {
            generation.arena.attach(node, "definitions", definitions);
        }

        Ok(generation.arena.render(node))
    }
}

/// State of a single `generate` call. Never shared between calls.
pub(crate) struct Generation<'g> {
    model: &'g TypeModel,
    config: &'g GeneratorConfig,
    arena: SchemaArena,
    registry: DefinitionRegistry,
}

impl<'g> Generation<'g> {
    fn new(model: &'g TypeModel, config: &'g GeneratorConfig) -> Self {
        let mut arena = SchemaArena::new();
        let registry = DefinitionRegistry::new(&mut arena);
        Self {
            model,
            config,
            arena,
            registry,
        }
    }

    fn remap(&self, ty: &TypeRef) -> TypeRef {
        remap(self.config, ty)
    }

    #[cfg(test)]
    pub(crate) fn render(&self, node: NodeId) -> Value {
        self.arena.render(node)
    }
}

fn remap(config: &GeneratorConfig, ty: &TypeRef) -> TypeRef {
    match config.type_remapping.get(&ty.name) {
        Some(to) => {
            trace!("type {} is remapped to {}", ty, to);
            to.clone()
        }
        None => ty.clone(),
    }
}
