//! Chat session — carries one conversation across agent runs.
//!
//! Each user line extends the accumulated conversation, so later questions
//! can refer to earlier answers and tool results.

use std::io::{self, BufRead, Write};

use crate::agent::{AgentLoop, Context, Conversation, LlmClient};
use crate::ui;
use crate::Result;

/// Interactive or scripted session over a single conversation.
pub struct ChatSession<C: LlmClient> {
    agent: AgentLoop<C>,
    context: Context,
    conversation: Conversation,
}

impl<C: LlmClient> ChatSession<C> {
    /// Create a new session with an empty conversation.
    pub fn new(agent: AgentLoop<C>, context: Context) -> Self {
        Self {
            agent,
            context,
            conversation: Conversation::new(),
        }
    }

    /// Send one message and return the final answer.
    ///
    /// On failure the conversation is left as it was before the message.
    pub async fn send(&mut self, message: &str) -> Result<String> {
        let next = self.agent.ask(&self.conversation, message, &self.context).await?;
        let answer = next.final_answer().unwrap_or_default().to_string();
        self.conversation = next;
        Ok(answer)
    }

    /// Run interactive REPL loop.
    pub async fn run_interactive(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("\n> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                // EOF
                break;
            }

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q") {
                println!("Goodbye! 👋");
                break;
            }

            if input == "/reset" {
                self.reset();
                ui::print_step("Conversation cleared");
                continue;
            }

            match self.send(input).await {
                Ok(answer) => println!("\n{answer}"),
                Err(e) => ui::print_error(&format!("{e}")),
            }
        }

        Ok(())
    }

    /// Start over with an empty conversation.
    pub fn reset(&mut self) {
        self.conversation = Conversation::new();
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}
