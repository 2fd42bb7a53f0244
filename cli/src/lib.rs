pub mod commands;
pub mod context;
pub mod export;
pub mod logging;
pub mod render;
pub mod repl;

pub use context::CliContext;
pub use repl::readline;
