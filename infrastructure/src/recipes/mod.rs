//! Recipe storage adapters

pub mod schema;
pub mod store;

pub use store::FileRecipeStore;
