//! tripgraph - conversational travel recommendations from the terminal

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tripgraph_cli::runtime::{build_service, ModelChoice};
use tripgraph_cli::{ConfigLoader, TripgraphConfig};
use tripgraph_travel::{TravelChatService, TravelRequest};

#[derive(Parser)]
#[command(name = "tripgraph")]
#[command(about = "Travel recommendations through a multi-turn conversation", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Use the built-in rule-based model instead of a provider
    #[arg(long, global = true)]
    offline: bool,

    /// Extra config file layered over the user and project files
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, env = "TRIPGRAPH_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Chat {
        /// Conversation to continue
        #[arg(short, long)]
        thread: String,
        /// User message
        message: String,
        /// Print the reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Chat interactively until EOF or "/quit"
    Repl {
        /// Conversation to continue; a new one is started when omitted
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Show the stored state of a conversation
    State {
        #[arg(short, long)]
        thread: String,
    },

    /// List stored conversations
    Threads,

    /// Print the workflow as a Mermaid flowchart
    Graph,
}

async fn load_config(cli: &Cli) -> anyhow::Result<TripgraphConfig> {
    let mut config = ConfigLoader::new().load(cli.config.as_deref()).await?;
    config.apply_env(|name| std::env::var(name).ok());
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

async fn repl(service: &TravelChatService, thread: String) -> anyhow::Result<()> {
    println!("대화 ID: {thread} (종료: /quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all("> ".as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message == "/quit" {
            break;
        }
        if message.is_empty() {
            continue;
        }

        match service.chat(TravelRequest::new(&thread, message)).await {
            Ok(reply) => println!("{}\n", reply.answer),
            // The thread keeps its pre-turn state, so the user can retry
            Err(e) => eprintln!("✗ {e}\n"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).await?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level()?)
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        Commands::Graph => {
            let graph = tripgraph_travel::build_travel_graph()?;
            println!("{}", graph.draw_mermaid());
            return Ok(());
        }
        command => command,
    };

    let service = build_service(&config, ModelChoice::from_flag(cli.offline)).await?;
    run(&service, command).await
}

async fn run(service: &TravelChatService, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Chat {
            thread,
            message,
            json,
        } => {
            let reply = service.chat(TravelRequest::new(thread, message)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                println!("{}", reply.answer);
            }
        }
        Commands::Repl { thread } => {
            let thread = thread.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            repl(service, thread).await?;
        }
        Commands::State { thread } => {
            let state = service.state(&thread).await?;
            let rendered =
                serde_json::to_string_pretty(&state).context("Failed to render state")?;
            println!("{rendered}");
        }
        Commands::Threads => {
            for thread in service.threads().await? {
                println!("{thread}");
            }
        }
        Commands::Graph => println!("{}", service.draw_mermaid()),
    }

    Ok(())
}
