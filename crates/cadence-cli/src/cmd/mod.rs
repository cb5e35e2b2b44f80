pub mod config;
pub mod init;
pub mod mode;
pub mod stats;
pub mod template;
pub mod workflow;
