pub mod automation;
pub mod blog;
