use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::{EnvFilter, fmt};
use trie_index::persist::{read_json, write_json};
use trie_index::{Index, IndexOptions, IndexSettings, SearchResult, SerializedIndex, Source};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot on disk: the serialized index plus a small header.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    created_at: String,
    index: SerializedIndex,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query an in-memory trie text index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index JSON/JSONL documents and write a snapshot
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Snapshot file to write; prints to stdout when omitted
        #[arg(long)]
        output: Option<String>,
        /// JSON settings file (fields, exclusions, limit, caseSensitive, tokenizers)
        #[arg(long)]
        settings: Option<String>,
    },
    /// Search a snapshot written by `build`
    Search {
        /// Snapshot file
        #[arg(long)]
        index: String,
        #[arg(long)]
        query: String,
        #[arg(long)]
        settings: Option<String>,
        /// Override the configured result limit
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Index documents in memory and search them without writing a snapshot
    Query {
        #[arg(long)]
        input: String,
        #[arg(long)]
        query: String,
        #[arg(long)]
        settings: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, settings } => {
            let options = load_options(settings.as_deref(), None)?;
            let index = build_index(&input, options)?;
            match output {
                Some(path) => write_snapshot(&index, Path::new(&path)),
                None => {
                    write_json(std::io::stdout().lock(), &snapshot_file(&index))?;
                    Ok(())
                }
            }
        }
        Commands::Search { index, query, settings, limit } => {
            let options = load_options(settings.as_deref(), limit)?;
            let index = read_snapshot(Path::new(&index), options)?;
            print_results(&index.search(&query))
        }
        Commands::Query { input, query, settings, limit } => {
            let options = load_options(settings.as_deref(), limit)?;
            let index = build_index(&input, options)?;
            print_results(&index.search(&query))
        }
    }
}

fn load_options(settings: Option<&str>, limit: Option<usize>) -> Result<IndexOptions> {
    let mut settings: IndexSettings = match settings {
        Some(path) => {
            let f = File::open(path).with_context(|| format!("opening settings {path}"))?;
            serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parsing settings {path}"))?
        }
        None => IndexSettings::default(),
    };
    if let Some(limit) = limit {
        settings.limit = limit;
    }
    let options = IndexOptions::from(settings);
    options.validate()?;
    Ok(options)
}

fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
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
    Ok(files)
}

fn read_documents(file: &Path) -> Result<Vec<Value>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        let mut docs = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            docs.push(serde_json::from_str(&line)?);
        }
        return Ok(docs);
    }
    let json: Value = serde_json::from_reader(reader)?;
    match json {
        Value::Array(arr) => Ok(arr),
        Value::Object(_) => Ok(vec![json]),
        _ => {
            tracing::warn!(file = %file.display(), "skipping file without documents");
            Ok(Vec::new())
        }
    }
}

fn build_index(input: &str, options: IndexOptions) -> Result<Index> {
    let mut docs = Vec::new();
    for file in collect_files(Path::new(input))? {
        docs.extend(read_documents(&file)?);
    }
    let index = Index::new(options, Source::Documents(docs))?;
    tracing::info!(num_docs = index.document_count(), num_nodes = index.node_count(), "ingested documents");
    Ok(index)
}

fn snapshot_file(index: &Index) -> SnapshotFile {
    SnapshotFile {
        version: SNAPSHOT_VERSION,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        index: index.serialize(),
    }
}

fn write_snapshot(index: &Index, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut w = BufWriter::new(File::create(path)?);
    write_json(&mut w, &snapshot_file(index))?;
    w.flush()?;
    tracing::info!(output = %path.display(), "snapshot written");
    Ok(())
}

fn read_snapshot(path: &Path, options: IndexOptions) -> Result<Index> {
    let f = File::open(path).with_context(|| format!("opening snapshot {}", path.display()))?;
    let snapshot: SnapshotFile = read_json(BufReader::new(f))
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {}", snapshot.version);
    }
    Ok(Index::new(options, Source::Snapshot(snapshot.index))?)
}

fn print_results(results: &[SearchResult]) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for r in results {
        serde_json::to_writer(&mut out, r)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn builds_from_json_and_jsonl_directory() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("a.json"), r#"[{"id": "1", "title": "red apple"}, {"id": "2", "title": "green pear"}]"#);
        write(&dir.path().join("b.jsonl"), "{\"id\": \"3\", \"title\": \"red cherry\"}\n\n");
        write(&dir.path().join("notes.txt"), "ignored");

        let index = build_index(dir.path().to_str().unwrap(), IndexOptions::default()).unwrap();
        assert_eq!(index.document_count(), 3);
        assert_eq!(index.search("red").len(), 2);
    }

    #[test]
    fn snapshot_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("docs.json");
        write(&input, r#"{"id": "solo", "title": "lonely mountain"}"#);
        let index = build_index(input.to_str().unwrap(), IndexOptions::default()).unwrap();

        let snap = dir.path().join("out/index.json");
        write_snapshot(&index, &snap).unwrap();
        let restored = read_snapshot(&snap, IndexOptions::default()).unwrap();
        assert_eq!(restored.search("mount"), index.search("mount"));
        assert_eq!(restored.document_count(), 1);
    }

    #[test]
    fn long_documents_survive_the_snapshot_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("docs.jsonl");
        let body = "an ordinary article body with plenty of words in it ".repeat(100);
        let line = serde_json::to_string(&serde_json::json!({"id": "article", "body": body})).unwrap();
        write(&input, &format!("{line}\n"));
        let index = build_index(input.to_str().unwrap(), IndexOptions::default()).unwrap();

        let snap = dir.path().join("index.json");
        write_snapshot(&index, &snap).unwrap();
        let restored = read_snapshot(&snap, IndexOptions::default()).unwrap();
        let compound = body.trim().replace(' ', "_");
        assert_eq!(restored.search(&compound).len(), 1);
        assert_eq!(restored.search("plenty"), index.search("plenty"));
        assert_eq!(restored.node_count(), index.node_count());
    }

    #[test]
    fn settings_file_and_limit_override() {
        let dir = tempdir().unwrap();
        let settings = dir.path().join("settings.json");
        write(&settings, r#"{"fields": ["content"], "tokenizer": "phrase", "searchTokenizer": "trim", "limit": 4}"#);

        let opts = load_options(settings.to_str(), None).unwrap();
        assert_eq!(opts.limit, 4);
        assert_eq!(opts.fields, Some(vec!["content".to_string()]));
        assert_eq!(load_options(settings.to_str(), Some(2)).unwrap().limit, 2);
        assert!(load_options(None, Some(0)).is_err());
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(build_index(dir.path().join("nope").to_str().unwrap(), IndexOptions::default()).is_err());
    }
}
