//! Application use cases

pub mod run_recipe;

pub use run_recipe::{RunRecipeError, RunRecipeInput, RunRecipeUseCase};
