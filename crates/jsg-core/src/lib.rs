pub mod config;
pub mod error;
pub mod generate;
pub mod model;
pub mod schema;

pub use config::GeneratorConfig;
pub use error::{GenerateError, ModelError};
pub use generate::SchemaGenerator;
pub use model::{TypeDef, TypeModel, TypeRef};
