//! Blog domain - post storage and LLM-backed draft generation.

pub mod activities;
pub mod data;
pub mod models;
pub mod store;

pub use activities::*;
pub use data::{BlogPostData, BlogPostSummary};
pub use models::{BlogPost, BlogPostSource, BlogPostStatus, NewBlogPost};
pub use store::{BlogPostStore, MemoryBlogPostStore, PostgresBlogPostStore, StoreError};
