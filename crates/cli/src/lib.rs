//! Public library modules for the CLI crate
pub mod console;
pub mod logging;
pub mod output;
