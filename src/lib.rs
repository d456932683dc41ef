pub mod config;
pub mod error;
pub mod http;
pub mod input;
pub mod llm;
pub mod output;
pub mod repl;
pub mod session;
