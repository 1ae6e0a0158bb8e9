pub mod case;
pub mod conversation;
pub mod enums;
pub mod feedback;

pub use case::*;
pub use conversation::*;
pub use enums::*;
pub use feedback::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
