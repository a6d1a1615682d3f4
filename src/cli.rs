use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "embedex",
    about = "An in-memory semantic search engine with deterministic embeddings"
)]
pub struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start MCP server for AI agent integration
    Mcp,
    /// Load documents from a JSON file and run a one-shot search
    Search(SearchArgs),
    /// Print the fingerprint vector for a piece of text
    Embed(EmbedArgs),
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// JSON file holding an array of documents to index
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Number of results to return
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Metadata filter as key=value (exact match; repeatable, AND)
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Rerank by query terms appearing in titles
    #[arg(long)]
    pub rerank: bool,

    /// Result count for the rerank stage
    #[arg(long)]
    pub rerank_top_k: Option<usize>,

    /// Time-decay factor applied by document age
    #[arg(long)]
    pub time_decay: Option<f32>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Embed --

#[derive(Debug, Parser)]
pub struct EmbedArgs {
    /// Text to embed
    pub text: String,

    /// Output as a JSON array
    #[arg(long)]
    pub json: bool,
}
