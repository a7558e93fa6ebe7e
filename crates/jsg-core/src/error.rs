use thiserror::Error;

use crate::model::{Inclusion, TypeRef};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid type reference: {0}")]
    InvalidTypeRef(String),

    #[error("type declared twice: {0}")]
    DuplicateType(String),
}

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The definition registry was asked for a type other than the one whose
    /// definition is currently being populated. Push/pop bracketing is broken.
    #[error("wrong type - working on {in_progress} - got {requested}")]
    WrongTypeInProgress {
        in_progress: TypeRef,
        requested: TypeRef,
    },

    #[error("polymorphism using include = {inclusion} is not supported (base type {base})")]
    UnsupportedInclusion { base: String, inclusion: Inclusion },

    #[error("could not parse injected json: {0}")]
    InjectJson(#[source] serde_json::Error),

    #[error("json supplier lookup '{0}' does not exist in the configured json suppliers")]
    UnknownJsonSupplier(String),

    #[error("no custom type id resolver named '{0}' is configured")]
    UnknownTypeIdResolver(String),

    /// An explicit subtype list leads back to a base still being expanded.
    #[error("subtype list of {base} lists {subtype}, which is one of its own bases")]
    CyclicSubtypes { base: String, subtype: String },

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("invalid default value '{value}' for {kind} property")]
    InvalidDefault { value: String, kind: &'static str },

    #[error("invalid decimal bound '{0}'")]
    InvalidDecimal(String),
}
