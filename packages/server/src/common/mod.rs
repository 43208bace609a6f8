// Common types and utilities shared across the application

pub mod utils;

pub use utils::{generate_excerpt, slugify, strip_code_fence};
