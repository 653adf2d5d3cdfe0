pub mod config;
pub mod extract;
pub mod flow;
pub mod llm;
pub mod reply;
pub mod store;
pub mod template;
pub mod types;

pub use types::*;
