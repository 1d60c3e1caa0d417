mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use config::{Config, ProviderKind, StoreBackend, resolve_config_path};
use reporag_index::{
    ChunkOutcome, FileOutcome, IngestReport, Ingestor, LocalFileSource, NoMatchReason, Retrieval,
    Retriever, Splitter,
};
use reporag_llm::LlmProvider;
use reporag_llm::any::AnyProvider;
use reporag_llm::ollama::OllamaProvider;
use reporag_llm::openai::OpenAiProvider;
#[cfg(feature = "qdrant")]
use reporag_store::QdrantChunkStore;
use reporag_store::{ChunkStore, InMemoryChunkStore, Scope, SqliteChunkStore};

#[derive(Parser, Debug)]
#[command(
    name = "reporag",
    version,
    about = "Answer questions about a repository from its nearest source chunk"
)]
struct Cli {
    /// Path to the TOML config (falls back to REPORAG_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split, annotate, embed and store every file under a directory
    Ingest {
        dir: PathBuf,
        #[arg(long)]
        repo: String,
        #[arg(long)]
        branch: String,
    },
    /// Answer a prompt from the closest chunk of one repository branch
    Ask {
        #[arg(long)]
        repo: String,
        #[arg(long)]
        branch: String,
        prompt: String,
    },
    /// Print the number of stored chunks
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    config.validate()?;

    let store = create_store(&config).await?;

    match cli.command {
        Command::Ingest { dir, repo, branch } => {
            let provider = Arc::new(create_provider(&config)?);
            let report = ingest(provider, store, &config, &dir, &Scope::new(repo, branch)).await?;
            print_ingest_report(&report);
        }
        Command::Ask {
            repo,
            branch,
            prompt,
        } => {
            let provider = Arc::new(create_provider(&config)?);
            ensure_embeddings(provider.as_ref())?;
            let retriever = Retriever::new(provider, store);
            let retrieval = retriever
                .retrieve(&Scope::new(repo, branch), &prompt)
                .await
                .context("retrieval failed")?;
            println!("{}", render_retrieval(&retrieval));
        }
        Command::Stats => {
            let total = store.count_all().await.context("count failed")?;
            println!("{} store: {total} chunks", store.name());
        }
    }

    Ok(())
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    match llm.provider {
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &llm.base_url,
            llm.model.clone(),
            llm.embedding_model.clone(),
        ))),
        ProviderKind::OpenAi | ProviderKind::Azure => {
            let api_key = config
                .secrets
                .api_key
                .clone()
                .context("REPORAG_LLM_API_KEY or OPENAI_API_KEY must be set")?;
            let provider = OpenAiProvider::new(
                api_key,
                llm.base_url.clone(),
                llm.model.clone(),
                llm.max_tokens,
                Some(llm.embedding_model.clone()).filter(|m| !m.is_empty()),
            );
            Ok(AnyProvider::OpenAi(
                if llm.provider == ProviderKind::Azure {
                    provider.azure(llm.api_version.clone())
                } else {
                    provider
                },
            ))
        }
    }
}

/// Both ingestion and retrieval embed text, so a chat-only provider is useless here.
fn ensure_embeddings<P: LlmProvider>(provider: &P) -> anyhow::Result<()> {
    if !provider.supports_embeddings() {
        bail!(
            "{} provider has no embedding model configured (set llm.embedding_model)",
            provider.name()
        );
    }
    Ok(())
}

async fn create_store(config: &Config) -> anyhow::Result<Arc<dyn ChunkStore>> {
    let store = &config.store;
    match store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryChunkStore::new(store.dimensions))),
        StoreBackend::Sqlite => {
            if let Some(parent) = Path::new(&store.sqlite_path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let sqlite = SqliteChunkStore::new(&store.sqlite_path, store.dimensions)
                .await
                .with_context(|| format!("opening sqlite store at {}", store.sqlite_path))?;
            Ok(Arc::new(sqlite))
        }
        #[cfg(feature = "qdrant")]
        StoreBackend::Qdrant => {
            let qdrant =
                QdrantChunkStore::new(&store.qdrant_url, &store.collection, store.dimensions)
                    .context("connecting to qdrant")?;
            qdrant
                .ensure_collection()
                .await
                .context("preparing qdrant collection")?;
            Ok(Arc::new(qdrant))
        }
        #[cfg(not(feature = "qdrant"))]
        StoreBackend::Qdrant => bail!("the qdrant backend requires building with --features qdrant"),
    }
}

async fn ingest<P: LlmProvider>(
    provider: Arc<P>,
    store: Arc<dyn ChunkStore>,
    config: &Config,
    dir: &Path,
    scope: &Scope,
) -> anyhow::Result<IngestReport> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    ensure_embeddings(provider.as_ref())?;
    let splitter = Splitter::new(config.chunking.clone()).context("invalid chunking config")?;
    let source = LocalFileSource::new(dir).with_max_file_bytes(config.source.max_file_bytes);
    let ingestor = Ingestor::new(provider, store, splitter);
    ingestor
        .ingest_source(scope, &source)
        .await
        .context("ingestion aborted")
}

fn print_ingest_report(report: &IngestReport) {
    for file in &report.files {
        match &file.outcome {
            FileOutcome::Split { strategy, chunks } => {
                println!(
                    "{}: {strategy:?}, {} stored, {} failed",
                    file.path,
                    file.stored(),
                    file.failed()
                );
                for chunk in chunks {
                    if let ChunkOutcome::Failed(e) = &chunk.outcome {
                        println!("  chunk {} ({:?}): {e}", chunk.index, chunk.byte_range);
                    }
                }
            }
            FileOutcome::Failed(e) => println!("{}: failed: {e}", file.path),
        }
    }
    println!(
        "{} chunks stored, {} failed, {} files failed in {} ms",
        report.chunks_stored, report.chunks_failed, report.files_failed, report.duration_ms
    );
}

fn render_retrieval(retrieval: &Retrieval) -> String {
    match retrieval {
        Retrieval::NoMatch(NoMatchReason::EmptyStore) => "No chunks have been ingested yet.".into(),
        Retrieval::NoMatch(NoMatchReason::EmptyScope) => {
            "No chunks found for this repository and branch.".into()
        }
        Retrieval::Answer {
            chunk,
            distance,
            answer,
        } => format!("{answer}\n\n[{} (distance {distance:.4})]", chunk.path),
    }
}
