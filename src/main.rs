use anyhow::{Context, Result};
use clap::Parser;
use snipq::engine::EngineChoice;
use snipq::{resolve, ResolveOptions};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "snipq")]
#[command(about = "Extract code snippets with a textual selector language", long_about = None)]
#[command(version)]
struct Cli {
    /// Query, e.g. ".hello", "10-12", ".greet:comments"
    query: String,

    /// Source file to extract from
    file: PathBuf,

    /// Parsing engine: javascript, typescript, tsx (default: by file extension)
    #[arg(short, long)]
    engine: Option<String>,

    /// Parse TypeScript with the TSX grammar
    #[arg(long)]
    tsx: bool,

    /// Only consider matches starting at or after this byte offset
    #[arg(long)]
    after: Option<usize>,

    /// Emit the full answer (code, offsets, lines) as JSON
    #[arg(long)]
    json: bool,
}

/// Pick an engine from the file extension when none was given explicitly.
fn engine_for_extension(path: &Path) -> EngineChoice {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("ts") | Some("mts") | Some("cts") => EngineChoice::TypeScript,
        Some("tsx") => EngineChoice::Named("tsx".to_string()),
        _ => EngineChoice::JavaScript,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let code = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let engine = match cli.engine {
        Some(name) => EngineChoice::Named(name),
        None => engine_for_extension(&cli.file),
    };

    let options = ResolveOptions {
        engine,
        parse: snipq::engine::ParseOptions { tsx: cli.tsx },
        after: cli.after,
    };

    let answer = resolve(&code, cli.query.trim(), options)
        .with_context(|| format!("query {:?} failed against {}", cli.query, cli.file.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", answer.code);
    }

    Ok(())
}
