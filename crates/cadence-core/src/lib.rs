pub mod catalog;
pub mod clock;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod gate;
pub mod graph;
pub mod instance;
pub mod io;
pub mod mode;
pub mod paths;
pub mod registry;
pub mod template;

pub use error::{CadenceError, Result};
