//! Persona domain: role types and display-name allocation.

pub mod model;
pub mod names;

pub use model::PersonaType;
pub use names::{NAME_POOL, NameCategory, NameGenerator};
