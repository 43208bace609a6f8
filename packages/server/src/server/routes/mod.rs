pub mod automation;
pub mod blog;
pub mod health;

pub use automation::*;
pub use blog::*;
pub use health::*;
