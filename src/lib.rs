// Public API for integration tests and the command line front end

pub mod ai;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod media;
pub mod prompts;
pub mod protocol;
pub mod room;
pub mod state;
pub mod transport;
pub mod types;
