//! Agent module — the tool-calling control loop.
//!
//! This module contains:
//! - Message types and the conversation log
//! - LLM client trait and the Gemini implementation
//! - Agent loop alternating model and tool steps
//! - Context carrying the tool-side dependencies of a run
//!
//! # Adding a New LLM Provider
//!
//! See [`llm::ProviderRegistry`] for instructions.

mod context;
mod conversation;
mod loop_impl;
mod message;

// LLM providers in submodule
pub mod llm;

// Re-exports for convenience
pub use context::Context;
pub use conversation::Conversation;
pub use llm::{GeminiClient, LlmClient, LlmResponse, ProviderRegistry, Usage};
pub use loop_impl::{should_continue, AgentLoop, LoopState};
pub use message::{Message, Role, ToolCallRequest, ToolCallResult};
