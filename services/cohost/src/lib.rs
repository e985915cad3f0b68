pub mod config;
pub mod transcript_loader;
