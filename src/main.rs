use clap::Parser;
use tracing_subscriber::EnvFilter;

use embedex::{
    BatchOperations,
    Config,
    Embedder,
    HashEmbedder,
    NewDocument,
    SemanticIndex,
    cli::{Cli, Command, EmbedArgs, SearchArgs},
    document::Metadata,
    error::{Error, Result},
    ranking::DEFAULT_RERANK_TOP_K,
    search::{SearchParams, SearchResponse},
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("EMBEDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Mcp => embedex::mcp::run_mcp(Config::from_env()?)?,
        Command::Search(args) => cmd_search(&args)?,
        Command::Embed(args) => cmd_embed(&args),
    }

    Ok(())
}

fn cmd_search(args: &SearchArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)?;
    let documents: Vec<NewDocument> = serde_json::from_str(&raw)
        .map_err(|e| {
            Error::Validation(format!(
                "cannot parse {}: {e}",
                args.file.display()
            ))
        })?;

    let index = SemanticIndex::new(Config::from_env()?)?;
    let summary = BatchOperations::new(&index).batch_index(documents);
    for failure in &summary.failed {
        eprintln!("Warning: skipped document: {}", failure.error);
    }

    let params = SearchParams {
        query: args.query.clone(),
        filters: parse_filters(&args.filters)?,
        top_k: args.count,
        rerank: args.rerank.then(|| {
            args.rerank_top_k.unwrap_or(DEFAULT_RERANK_TOP_K)
        }),
        time_decay: args.time_decay,
    };
    let response = index.search(&params)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response).map_err(
            |e| Error::Internal(format!("failed to serialize results: {e}")),
        )?);
    } else {
        format_human(&response);
    }

    Ok(())
}

fn cmd_embed(args: &EmbedArgs) {
    let vector = HashEmbedder.embed(&args.text);
    if args.json {
        let rendered: Vec<String> =
            vector.iter().map(|v| format!("{v:.6}")).collect();
        println!("[{}]", rendered.join(","));
    } else {
        for (i, component) in vector.iter().enumerate() {
            println!("{i:>2}: {component:.6}");
        }
    }
}

/// Parse repeated `key=value` filter pairs. Values that parse as JSON
/// scalars keep their type, so `year=2024` matches a numeric metadata
/// field; everything else is matched as a string.
fn parse_filters(pairs: &[String]) -> Result<Metadata> {
    let mut filters = Metadata::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::Validation(format!("invalid filter '{pair}', expected key=value"))
        })?;
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        filters.insert(key.to_string(), value);
    }
    Ok(filters)
}

fn format_human(response: &SearchResponse) {
    if response.results.is_empty() {
        println!("No results found.");
        return;
    }

    for (i, hit) in response.results.iter().enumerate() {
        println!(
            "{:>3}. [{:.4}] {} (#{})",
            i + 1,
            hit.similarity_score,
            hit.title,
            hit.document_id
        );
        if !hit.content.is_empty() {
            println!("     {}", hit.content);
        }
    }
    println!("\n{} result(s)", response.results.len());
}
