//! Recipe domain model

pub mod entities;
pub mod value_objects;

pub use entities::{PostAction, RecipeDefinition, ToolCallSpec, VarSpec};
pub use value_objects::ArgValue;
