//! Lounge Agent - tool-calling agent for airport lounge bookings
//!
//! This library provides the agent control loop that lets a language model
//! call tools, and the JSON-RPC tool server that exposes those tools.

pub mod agent;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod tools;
pub mod ui;
pub mod upstream;

pub use error::{Error, Result};
