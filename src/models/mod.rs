// src/models/mod.rs
pub mod farm;

// Re-export commonly used types so other modules can use `crate::models::X`
pub use farm::{ApiResponse, FarmRecord};
