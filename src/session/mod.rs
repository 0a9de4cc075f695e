//! Session module - the dispatch loop that drives one exchange.
//!
//! A session owns its conversation and resolves model-requested tool
//! calls against the registry:
//! 1. Append the user message
//! 2. Call the model with the full history and every tool schema
//! 3. Execute requested tools, append results in request order
//! 4. Repeat until the model replies without tool calls or the round
//!    cap is hit

mod dispatch;
mod prompt;

pub use dispatch::{Session, SessionError};
pub use prompt::build_system_prompt;
