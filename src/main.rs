//! Lounge agent CLI entry point

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lounge::agent::{AgentLoop, Context, Conversation, LlmClient, ProviderRegistry};
use lounge::client::{HttpToolClient, LocalToolClient, ToolClient};
use lounge::config::Config;
use lounge::server::{http, ToolServer};
use lounge::ui;

#[derive(Parser)]
#[command(name = "lounge")]
#[command(about = "✈️  Lounge Agent - tool-calling assistant for lounge bookings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the JSON-RPC tool server
    Serve {
        /// Bind host (defaults to config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the agent
    Agent {
        /// Message to send to the agent
        #[arg(short, long)]
        message: Option<String>,

        /// Use in-process tools instead of the configured tool server
        #[arg(long)]
        local: bool,
    },

    /// Run the scripted lounge and flight queries
    Demo {
        /// Use in-process tools instead of the configured tool server
        #[arg(long)]
        local: bool,
    },

    /// List the tools the server exposes
    Tools {
        /// Use in-process tools instead of the configured tool server
        #[arg(long)]
        local: bool,
    },

    /// Show configuration status
    Status,
}

const DEMO_SESSION: &str = "00009223581026309436128527";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = lounge::config::load()?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(&config).await?;
        }

        Commands::Agent { message, local } => {
            let tools = connect_tools(&config, local).await?;
            let ctx = build_context(&config, tools).await?;
            let agent = build_agent(&config)?;

            if let Some(msg) = message {
                let conversation = agent
                    .ask(&Conversation::new(), msg, &ctx)
                    .await
                    .context("agent run failed")?;
                ui::print_answer("Agent", conversation.final_answer().unwrap_or_default());
            } else {
                ui::print_header(&config.model, tool_source(&config, local));
                println!("Interactive mode (exit to quit, /reset to clear)\n");
                lounge::chat::ChatSession::new(agent, ctx).run_interactive().await?;
            }
        }

        Commands::Demo { local } => {
            let tools = connect_tools(&config, local).await?;
            let ctx = build_context(&config, tools).await?;
            let agent = build_agent(&config)?;

            if let Err(e) = run_demo(&agent, &ctx).await {
                ui::print_error(&format!("Error running demo: {e}"));
                eprintln!("{e:?}");
                return Err(e);
            }
        }

        Commands::Tools { local } => {
            let tools = connect_tools(&config, local).await?;
            let definitions = tools.list_tools().await?;
            ui::print_tools(&definitions);
        }

        Commands::Status => {
            println!("✈️  Lounge Agent Status\n");
            println!("Config: {:?}", lounge::config::config_path());
            println!("Provider: {}", config.provider);
            println!("Model: {}", config.model);
            println!("Tool server: {}", config.tool_server_url);
            println!("Max iterations: {}", config.max_iterations);
            println!(
                "Gemini API: {}",
                if config.gemini_api_key.is_empty() { "not set" } else { "✓" }
            );
            println!("Known sessions: {}", config.upstream.lounges.len());
        }
    }

    Ok(())
}

async fn run_server(config: &Config) -> Result<()> {
    let server = Arc::new(ToolServer::from_config(config)?);
    let handle = http::serve(server, &config.server.bind_addr()).await?;
    ui::print_success(&format!("MCP server running at http://{}", handle.addr));
    ui::print_step(&format!("Health check: http://{}/health", handle.addr));

    tokio::signal::ctrl_c().await?;
    println!();
    ui::print_step("Shutting down");
    handle.shutdown().await?;
    Ok(())
}

fn tool_source(config: &Config, local: bool) -> &str {
    if local {
        "in-process tools"
    } else {
        &config.tool_server_url
    }
}

async fn connect_tools(config: &Config, local: bool) -> Result<Arc<dyn ToolClient>> {
    if local {
        let server = Arc::new(ToolServer::from_config(config)?);
        return Ok(Arc::new(LocalToolClient::new(server)));
    }

    let client = HttpToolClient::connect(&config.tool_server_url)
        .await
        .with_context(|| format!("could not reach tool server at {}", config.tool_server_url))?;
    Ok(Arc::new(client))
}

async fn build_context(config: &Config, tools: Arc<dyn ToolClient>) -> Result<Context> {
    let ctx = Context::connect(tools).await?;
    Ok(match config.tool_timeout() {
        Some(limit) => ctx.with_tool_timeout(limit),
        None => ctx,
    })
}

fn build_agent(config: &Config) -> Result<AgentLoop<Box<dyn LlmClient>>> {
    let client = ProviderRegistry::create(config)?;
    let agent = AgentLoop::new(client, config.max_iterations);
    Ok(match config.model_timeout() {
        Some(limit) => agent.with_model_timeout(limit),
        None => agent,
    })
}

async fn run_demo(agent: &AgentLoop<Box<dyn LlmClient>>, ctx: &Context) -> Result<()> {
    ui::print_step("Getting available lounges...");
    let lounges = agent
        .ask(
            &Conversation::new(),
            format!("Get me the available lounges for session {DEMO_SESSION}"),
            ctx,
        )
        .await?;
    ui::print_answer("Lounge Response", lounges.final_answer().unwrap_or_default());

    ui::print_step("Getting flight information...");
    let flight = agent
        .ask(
            &lounges,
            format!(
                "Get flight data for session {DEMO_SESSION}, departure from NMIA on 20241225 for flight AC920"
            ),
            ctx,
        )
        .await?;
    ui::print_answer("Flight Response", flight.final_answer().unwrap_or_default());

    ui::print_step("Testing another flight query...");
    let another = agent
        .ask(
            &Conversation::new(),
            format!(
                "Please help me get flight information with these details:\n\
                 - Session ID: \"{DEMO_SESSION}\"\n\
                 - Direction: A (arrival)\n\
                 - Travel Date: 20250701\n\
                 - Airport: SIA\n\
                 - Flight: AC1804"
            ),
            ctx,
        )
        .await?;
    ui::print_answer("Another Flight Response", another.final_answer().unwrap_or_default());

    Ok(())
}
