pub mod error;
pub mod model;
pub mod resolver;
pub mod validator;

pub use error::SchemaError;
pub use model::{FieldDef, FieldType, Mapping, SchemaVersion};
pub use resolver::SchemaResolver;
pub use validator::{validate, ValidationResult, Violation, ViolationKind};
