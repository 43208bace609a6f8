//! Blog automation domain - scheduled draft generation with category rotation.

pub mod categories;
pub mod rotation;
pub mod service;

pub use categories::{build_prompt, default_categories, BLOG_CATEGORIES};
pub use rotation::{MemoryRotationStore, PostgresRotationStore, RotationState, RotationStore};
pub use service::{
    AutomationConfig, AutomationStatus, BlogAutomation, RotationSnapshot, StartOutcome, JOB_NAME,
};
