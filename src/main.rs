//! refdesk CLI entry point

use clap::{Parser, Subcommand};
use refdesk::{
    config::Config,
    error::{Error, Result},
    http,
    mcp::{handle_tool_call, McpServer},
    openai::OpenAiClient,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "refdesk")]
#[command(version, about = "MCP adapter for OpenAI file-search answering and vector store search", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Serve the MCP endpoint over HTTP
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Start MCP server on stdio
    Mcp,

    /// Generate a detailed answer for one or more queries
    Ask {
        /// Queries or topics
        #[arg(required = true)]
        queries: Vec<String>,
    },

    /// Search the configured vector store
    Search {
        /// The search query
        query: String,

        /// Maximum number of results (1-50)
        #[arg(short, long, default_value = "10")]
        limit: i64,

        /// Drop results scoring below this value (0-1)
        #[arg(short, long, default_value = "0")]
        score_threshold: f64,

        /// Let the API rewrite the query for better recall
        #[arg(long)]
        rewrite: bool,

        /// Ranker to use (auto or none)
        #[arg(long)]
        ranker: Option<String>,

        /// Attribute filter as a JSON object
        #[arg(long)]
        filters: Option<String>,

        /// Vector store to search (overrides config)
        #[arg(long)]
        vector_store_id: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr: stdout belongs to the stdio protocol
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Init doesn't need an existing config
    if let Commands::Init { force } = cli.command {
        return handle_init(cli.config, force);
    }

    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Serve { host, port } => {
            let client = OpenAiClient::new(&config)?;
            let bind_host = host.unwrap_or_else(|| config.server.host.clone());
            let bind_port = port.unwrap_or(config.server.port);
            let server = McpServer::new(config, client);
            http::serve(server, &bind_host, bind_port).await?;
        }

        Commands::Mcp => {
            let client = OpenAiClient::new(&config)?;
            let server = McpServer::new(config, client);
            server.run_stdio().await?;
        }

        Commands::Ask { queries } => {
            let arguments = tool_arguments(json!({ "queries": queries }));
            run_tool("file_search_assistant", arguments, &config, cli.json).await?;
        }

        Commands::Search {
            query,
            limit,
            score_threshold,
            rewrite,
            ranker,
            filters,
            vector_store_id,
        } => {
            let mut arguments = tool_arguments(json!({
                "query": query,
                "max_num_results": limit,
                "score_threshold": score_threshold,
                "rewrite_query": rewrite,
            }));
            if let Some(ranker) = ranker {
                arguments.insert("ranking_options".to_string(), json!({ "ranker": ranker }));
            }
            if let Some(filters) = filters {
                let parsed: Value = serde_json::from_str(&filters)
                    .map_err(|e| Error::Config(format!("Invalid --filters JSON: {}", e)))?;
                arguments.insert("filters".to_string(), parsed);
            }
            if let Some(id) = vector_store_id {
                arguments.insert("vector_store_id".to_string(), json!(id));
            }
            run_tool("vector_store_search", arguments, &config, cli.json).await?;
        }
    }

    Ok(())
}

fn tool_arguments(value: Value) -> HashMap<String, Value> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}

/// Run one tool call directly and print its result
async fn run_tool(
    name: &str,
    arguments: HashMap<String, Value>,
    config: &Config,
    json_output: bool,
) -> Result<()> {
    let client = OpenAiClient::new(config)?;
    let result = handle_tool_call(name, &arguments, config, &client).await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.joined_text());
    }

    if result.is_error == Some(true) {
        std::process::exit(1);
    }

    Ok(())
}

fn handle_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = path.unwrap_or_else(Config::default_config_path);

    if config_path.exists() && !force {
        eprintln!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
        std::process::exit(1);
    }

    let config = Config::default();
    config.save(&config_path)?;

    println!("✓ refdesk initialized successfully");
    println!("  Config: {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit the config file to set your vector store ID");
    println!("  2. Export your API key: export OPENAI_API_KEY=sk-...");
    println!("  3. Try it out: refdesk search \"your query\"");

    Ok(())
}
