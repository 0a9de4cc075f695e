//! # toolchat
//!
//! A conversational agent that connects a chat-completion endpoint to a
//! registry of callable local tools.
//!
//! This library provides:
//! - An append-only conversation store that forms the model context
//! - A dispatch loop that resolves model-requested tool calls
//! - A tool registry covering files, git, search, shell, web, text and
//!   archive operations
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Append the user message to the conversation
//! 2. Call the model with the full history and every tool schema
//! 3. Execute any requested tool calls, append the results
//! 4. Repeat until the model replies without tool calls or the round
//!    cap is reached
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolchat::{config::Config, session::Session};
//! use toolchat::llm::OpenRouterClient;
//! use toolchat::tools::ToolRegistry;
//!
//! let config = Config::from_env()?;
//! let llm = Arc::new(OpenRouterClient::new(config.api_key.clone()));
//! let tools = Arc::new(ToolRegistry::builtin()?);
//! let mut session = Session::new(config, llm, tools);
//! let reply = session.run("list the files in this directory").await?;
//! ```

pub mod config;
pub mod conversation;
pub mod llm;
pub mod session;
pub mod tools;

pub use config::Config;
