//! Agent loop - alternates model steps and tool steps until the model answers

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::Error;
use crate::Result;

use super::context::Context;
use super::conversation::Conversation;
use super::llm::LlmClient;
use super::message::{Message, ToolCallRequest};

/// Where the control loop stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting on the model's next move
    Deciding,
    /// The last assistant message requested tools
    ToolsPending,
    /// The model answered without requesting tools
    Done,
}

/// Transition after a model step: tools if the last message asks for them.
pub fn should_continue(conversation: &Conversation) -> LoopState {
    match conversation.last() {
        Some(message) if message.requests_tools() => LoopState::ToolsPending,
        _ => LoopState::Done,
    }
}

/// The agent loop drives one conversation through model and tool steps
pub struct AgentLoop<C: LlmClient> {
    client: C,
    max_iterations: usize,
    model_timeout: Option<Duration>,
}

impl<C: LlmClient> AgentLoop<C> {
    /// Create a new agent loop
    pub fn new(client: C, max_iterations: usize) -> Self {
        Self {
            client,
            max_iterations,
            model_timeout: None,
        }
    }

    /// Bound each model step; expiry counts as the model being unavailable.
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = Some(timeout);
        self
    }

    /// Append a user message to `conversation` and run the loop.
    pub async fn ask(
        &self,
        conversation: &Conversation,
        message: impl Into<String>,
        ctx: &Context,
    ) -> Result<Conversation> {
        let mut seeded = conversation.clone();
        seeded.push_user(message);
        self.run(&seeded, ctx).await
    }

    /// Run the loop until the model stops requesting tools.
    ///
    /// Works on a copy: the returned conversation is `conversation` extended
    /// with every assistant and tool-result message of this run. Tool
    /// failures are recorded as tool results; a failed model step ends the
    /// run with [`Error::ModelUnavailable`].
    pub async fn run(&self, conversation: &Conversation, ctx: &Context) -> Result<Conversation> {
        if conversation.is_empty() {
            return Err(Error::Conversation("cannot run on an empty conversation".to_string()));
        }

        let mut conversation = conversation.clone();
        let mut state = if conversation.pending_calls().is_empty() {
            LoopState::Deciding
        } else {
            LoopState::ToolsPending
        };
        let mut iteration = 0;

        info!("Starting agent loop with {} messages", conversation.len());

        loop {
            state = match state {
                LoopState::Deciding => {
                    if iteration == self.max_iterations {
                        return Err(Error::MaxIterations(self.max_iterations));
                    }
                    iteration += 1;
                    debug!("Iteration {}/{}", iteration, self.max_iterations);

                    self.decide(&mut conversation, ctx).await?;
                    should_continue(&conversation)
                }
                LoopState::ToolsPending => {
                    self.run_tools(&mut conversation, ctx).await?;
                    LoopState::Deciding
                }
                LoopState::Done => {
                    info!(
                        "Agent completed with response: {} chars",
                        conversation.final_answer().map_or(0, str::len)
                    );
                    return Ok(conversation);
                }
            };
        }
    }

    /// Ask the model for its next move and append exactly one assistant message.
    async fn decide(&self, conversation: &mut Conversation, ctx: &Context) -> Result<()> {
        let request = self.client.chat(conversation.messages(), ctx.definitions());

        let mut response = match self.model_timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.map_err(|_| {
                Error::ModelUnavailable(format!("no response within {limit:?}"))
            })?,
            None => request.await,
        }
        .map_err(|e| match e {
            Error::ModelUnavailable(_) => e,
            other => Error::ModelUnavailable(other.to_string()),
        })?;

        debug!(
            finish_reason = %response.finish_reason,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Model step finished"
        );

        assign_call_ids(&mut response.tool_calls);
        if response.has_tool_calls() {
            debug!(
                "Model requested tools: {:?}",
                response.tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
            );
        }

        conversation.push(response.into_message())
    }

    /// Execute every pending call, in order, and append one result per call.
    async fn run_tools(&self, conversation: &mut Conversation, ctx: &Context) -> Result<()> {
        let calls: Vec<_> = conversation.pending_calls().into_iter().cloned().collect();

        for call in &calls {
            let result = ctx.invoke(call).await;
            conversation.push(Message::tool_result(call, result))?;
        }

        Ok(())
    }
}

/// Every call of one batch needs its own id for its result to pair with.
/// Empty or repeated ids are replaced.
fn assign_call_ids(calls: &mut [ToolCallRequest]) {
    let mut seen = HashSet::new();
    for call in calls.iter_mut() {
        if call.id.is_empty() || seen.contains(&call.id) {
            let fresh = ToolCallRequest::fresh_id();
            debug!(tool = %call.name, from = %call.id, to = %fresh, "Reassigned tool call id");
            call.id = fresh;
        }
        seen.insert(call.id.clone());
    }
}
