use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use termspace_core::{build_index, DocId, SledStore};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    text: String,
}

#[derive(Debug, Serialize)]
struct MetaFile {
    num_docs: u32,
    num_terms: u32,
    rejected: u32,
    created_at: String,
    version: u32,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the n-gram TF-IDF inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from JSON/JSONL document files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory (sled store)
        #[arg(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build(&input, &output),
    }
}

fn build(input: &str, output: &str) -> Result<()> {
    let corpus = read_corpus(Path::new(input))?;
    tracing::info!(num_docs = corpus.len(), input, "corpus loaded");

    let store = SledStore::open(output)
        .with_context(|| format!("opening index store at {output}"))?;
    let stats = build_index(&store, &corpus)?;
    store.flush()?;

    let meta = MetaFile {
        num_docs: stats.indexed,
        num_terms: stats.terms,
        rejected: stats.rejected,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: 1,
    };
    fs::write(
        Path::new(output).join("meta.json"),
        serde_json::to_string_pretty(&meta)?,
    )?;

    tracing::info!(
        indexed = stats.indexed,
        rejected = stats.rejected,
        terms = stats.terms,
        output,
        "index build complete"
    );
    Ok(())
}

/// Collect documents in a fixed ingestion order: files sorted by path, then
/// record order within each file. Build determinism hangs off this order.
fn read_corpus(input: &Path) -> Result<Vec<(DocId, String)>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input path {} does not exist", input.display());
    }

    let mut corpus: Vec<(DocId, String)> = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut corpus)?;
        } else {
            read_json(&file, &mut corpus)?;
        }
    }
    Ok(corpus)
}

fn read_jsonl(file: &Path, corpus: &mut Vec<(DocId, String)>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        corpus.push((doc.id, doc.text));
    }
    Ok(())
}

fn read_json(file: &Path, corpus: &mut Vec<(DocId, String)>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for value in arr {
                let doc: InputDoc = serde_json::from_value(value)
                    .with_context(|| file.display().to_string())?;
                corpus.push((doc.id, doc.text));
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc =
                serde_json::from_value(json).with_context(|| file.display().to_string())?;
            corpus.push((doc.id, doc.text));
        }
        _ => bail!("{}: expected a JSON object or array", file.display()),
    }
    Ok(())
}
