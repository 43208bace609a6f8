// Company Site CMS - API Core
//
// Backend for the marketing site's content management: blog storage plus the
// scheduled blog automation that drafts posts with an LLM.
//
// Architecture follows the domains/ kernel/ server/ split: domains hold
// models and business logic, kernel holds infrastructure (AI, job store,
// worker), server holds the HTTP surface.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
