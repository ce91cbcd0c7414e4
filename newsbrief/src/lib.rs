// Library interface for newsbrief modules
// This allows tests and other binaries to import modules

pub mod briefing;
pub mod cache;
pub mod feeds;
pub mod llm;
pub mod retry;
