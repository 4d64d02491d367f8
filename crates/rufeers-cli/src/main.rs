//! RUFEERS CLI - Command-line interface
//!
//! Usage:
//!   rufeers analyze <doc> [--format spacy|conllu] [--ground-truth <file>] [--json] [--html <file>] [--news]
//!   rufeers evaluate <extracted> <ground-truth>
//!   rufeers news <query>

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use rufeers_core::{AppConfig, LoggingConfig, RelationshipTriple};
use rufeers_extractor::render::render_page;
use rufeers_extractor::{evaluate, load_path, Analyzer, DocumentFormat, EvaluationSummary};
use rufeers_news::{NewsClient, NewsSource};

#[derive(Parser)]
#[command(name = "rufeers")]
#[command(about = "Entity, relationship and sentiment analysis of parsed text")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a parsed document
    Analyze {
        /// Path to the parsed document
        path: PathBuf,
        /// Input format (spacy, conllu); guessed from the extension if omitted
        #[arg(long)]
        format: Option<DocumentFormat>,
        /// Reference triples to score the extracted relationships against
        #[arg(long)]
        ground_truth: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Write the entity and dependency visualization to this file
        #[arg(long)]
        html: Option<PathBuf>,
        /// Search related news for the first entity
        #[arg(long)]
        news: bool,
    },
    /// Score extracted triples against reference triples
    Evaluate {
        /// Extracted triples (JSON)
        extracted: PathBuf,
        /// Reference triples (JSON)
        ground_truth: PathBuf,
    },
    /// Search news headlines
    News {
        /// Search query
        query: String,
    },
}

/// A single triple list, or one list per document
#[derive(Deserialize)]
#[serde(untagged)]
enum TripleSets {
    Single(Vec<RelationshipTriple>),
    Batch(Vec<Vec<RelationshipTriple>>),
}

impl TripleSets {
    fn into_documents(self) -> Vec<Vec<RelationshipTriple>> {
        match self {
            TripleSets::Single(triples) => vec![triples],
            TripleSets::Batch(docs) => docs,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Analyze {
            path,
            format,
            ground_truth,
            json,
            html,
            news,
        } => {
            let doc = load_path(&path, format)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            let analyzer = Analyzer::from_config(&config);

            let report = match ground_truth {
                Some(truth_path) => {
                    let truth: Vec<RelationshipTriple> = read_json(&truth_path)?;
                    analyzer.analyze_with_ground_truth(&doc, &truth)?
                }
                None => analyzer.analyze(&doc)?,
            };

            if let Some(html_path) = html {
                std::fs::write(&html_path, render_page(&doc, "RUFEERS"))
                    .with_context(|| format!("Failed to write {}", html_path.display()))?;
                tracing::info!(path = %html_path.display(), "Wrote visualization");
            }

            let headlines = if news {
                match report.first_entity() {
                    Some(entity) => {
                        let client = NewsClient::from_config(&config.news)?;
                        Some(fetch_news(&client, &entity.text).await)
                    }
                    None => {
                        eprintln!("No entities found to fetch news.");
                        None
                    }
                }
            } else {
                None
            };

            if json {
                let mut value = serde_json::to_value(&report)?;
                if let (Some(headlines), Some(map)) = (&headlines, value.as_object_mut()) {
                    map.insert("news".to_string(), serde_json::json!(headlines));
                }
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print!("{}", report.report());
                if let Some(headlines) = &headlines {
                    println!("\n=== Related News Headlines ===");
                    print_headlines(headlines);
                }
            }
        }
        Commands::Evaluate {
            extracted,
            ground_truth,
        } => {
            let extracted = read_json::<TripleSets>(&extracted)?.into_documents();
            let ground_truth = read_json::<TripleSets>(&ground_truth)?.into_documents();

            if extracted.len() != ground_truth.len() {
                anyhow::bail!(
                    "Document count mismatch: {} extracted, {} ground truth",
                    extracted.len(),
                    ground_truth.len()
                );
            }

            let results: Vec<_> = extracted
                .iter()
                .zip(&ground_truth)
                .map(|(e, g)| evaluate(e, g))
                .collect();
            let summary: EvaluationSummary = results.iter().collect();
            print!("{}", summary.report());
        }
        Commands::News { query } => {
            let client = NewsClient::from_config(&config.news)?;
            let headlines = fetch_news(&client, &query).await;
            print_headlines(&headlines);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // stdout carries the report
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Headlines for `query`; a failed search is reported and yields none
async fn fetch_news(source: &dyn NewsSource, query: &str) -> Vec<String> {
    match source.search(query).await {
        Ok(headlines) => headlines,
        Err(e) => {
            tracing::warn!(query, error = %e, "News search failed");
            eprintln!("Error fetching news: {e}");
            Vec::new()
        }
    }
}

fn print_headlines(headlines: &[String]) {
    if headlines.is_empty() {
        println!("No news found.");
    }
    for headline in headlines {
        println!("- {headline}");
    }
}
