pub mod bind;
pub mod error;
pub mod object;
pub mod record;
pub mod shape;
pub mod value;
pub mod violation;

// Re-export commonly used types
pub use bind::bind;
pub use error::ContractError;
pub use object::Object;
pub use record::{ArgumentRecord, CallArgs};
pub use shape::{Parameter, ParameterKind, ParameterShape, ShapeBuilder};
pub use value::{Stream, Value, ValueKind};
pub use violation::{ContractKind, ContractViolation};
