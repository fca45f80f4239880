// Library interface for newsdigest modules
// This allows tests and the binary to import modules

pub mod llm;
pub mod models;
pub mod news;
pub mod server;
