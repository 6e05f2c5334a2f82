use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use photomosaic::api;
use photomosaic::models::{AppConfig, CorpusPhotoEntry, JobId, JobStatus};
use photomosaic::server::{self, AppState};
use photomosaic::services::sampler::analyze_image;
use photomosaic::services::ChunkRange;

#[derive(Parser)]
#[command(name = "photomosaic")]
#[command(about = "Chunked photo mosaic assembly over an HSL-indexed photo corpus")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Sample an image and queue a mosaic job
    Create {
        /// Image path or http(s) URL
        image: String,

        /// Page URL used for duplicate detection (defaults to the image)
        #[arg(short, long, default_value = "")]
        url: String,

        /// Assemble the job right away
        #[arg(long)]
        run: bool,
    },
    /// Drive queued jobs (or one job) chunk by chunk until complete
    Run {
        /// Resume this job instead of dispatching the queue
        #[arg(long)]
        id: Option<String>,
    },
    /// Assemble a single row range of a job
    Chunk {
        /// Job id
        #[arg(long)]
        id: String,

        /// First row
        #[arg(long)]
        start: u32,

        /// End row (exclusive)
        #[arg(long)]
        end: u32,
    },
    /// Compute corpus entries from image files
    Analyze {
        /// Images to analyze
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Write the JSON array here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Photomosaic API",
        description = "Chunked photo mosaic assembly over an HSL-indexed photo corpus",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_create,
        api::handle_get_mosaic,
        api::handle_dispatch,
        api::handle_iterator,
        api::handle_assemble,
        api::handle_photos,
    ),
    components(schemas(
        api::CreateMosaicRequest,
        api::CreateMosaicResponse,
        api::MosaicMeta,
        api::DispatchResponse,
        api::PhotosRequest,
        photomosaic::models::ChunkIterator,
        photomosaic::models::ChunkInvocation,
        photomosaic::models::ChunkOutcome,
        photomosaic::models::IteratorStep,
        photomosaic::models::CorpusPhotoEntry,
    )),
    tags(
        (name = "Mosaics", description = "Mosaic creation and retrieval"),
        (name = "Assembly", description = "Chunked assembly and scheduling"),
        (name = "Corpus", description = "Corpus photo lookup")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Create { image, url, run }) => run_create_command(&image, &url, run).await,
        Some(Commands::Run { id }) => run_scheduler_command(id).await,
        Some(Commands::Chunk { id, start, end }) => run_chunk_command(&id, start, end).await,
        Some(Commands::Analyze { images, output }) => run_analyze_command(&images, output),
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Minimal logging for CLI commands
fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photomosaic=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn cli_state() -> anyhow::Result<AppState> {
    let config = AppConfig::load_from_env();
    if config.storage.jobs_dir.is_none() {
        tracing::warn!("No storage.jobs_dir configured, jobs will not outlive this command");
    }
    server::create_app_state(config)
}

/// Queue a new job, optionally assembling it in-process
async fn run_create_command(image: &str, url: &str, run: bool) -> anyhow::Result<()> {
    init_cli_logging();
    let state = cli_state()?;

    let created = state.creator.create(image, url).await?;
    if created.created {
        println!("Queued mosaic {}", created.id);
    } else {
        println!("Mosaic {} already exists", created.id);
    }

    if run {
        drive_job(&state, &created.id).await?;
    }
    Ok(())
}

/// Local stand-in for the external scheduler
async fn run_scheduler_command(id: Option<String>) -> anyhow::Result<()> {
    init_cli_logging();
    let state = cli_state()?;

    match id {
        Some(id) => drive_job(&state, &JobId::new(id)).await,
        None => {
            let invocations = state.dispatcher.dispatch().await?;
            if invocations.is_empty() {
                println!("No queued mosaics.");
            }
            for invocation in invocations {
                let job_id = invocation.job_id.clone();
                let outcome = state
                    .dispatcher
                    .drive(&state.coordinator, invocation)
                    .await?;
                println!(
                    "Assembled mosaic {job_id} ({} rows)",
                    outcome.iterator.height
                );
            }
            Ok(())
        }
    }
}

async fn drive_job(state: &AppState, id: &JobId) -> anyhow::Result<()> {
    // forward-only, a complete job stays complete
    state.jobs.advance_status(id, JobStatus::Pending).await?;
    match state.dispatcher.resume(id).await? {
        Some(invocation) => {
            let outcome = state
                .dispatcher
                .drive(&state.coordinator, invocation)
                .await?;
            println!("Assembled mosaic {id} ({} rows)", outcome.iterator.height);
        }
        None => println!("Mosaic {id} is already complete"),
    }
    Ok(())
}

/// Run one row range and report the continuation
async fn run_chunk_command(id: &str, start: u32, end: u32) -> anyhow::Result<()> {
    init_cli_logging();
    let state = cli_state()?;

    let continuation = state
        .coordinator
        .run_chunk(&JobId::new(id), ChunkRange::new(start, end))
        .await?;
    println!(
        "jobId={} nextRangeStart={} totalHeight={} done={}",
        continuation.job_id,
        continuation.next_range_start,
        continuation.total_height,
        continuation.done
    );
    Ok(())
}

/// Compute corpus entries for local image files
fn run_analyze_command(images: &[PathBuf], output: Option<PathBuf>) -> anyhow::Result<()> {
    init_cli_logging();
    let config = AppConfig::load_from_env();

    let mut entries = Vec::with_capacity(images.len());
    for path in images {
        let bytes = std::fs::read(path)?;
        let stats = analyze_image(&bytes, config.sampling.target_size)
            .map_err(|e| anyhow::anyhow!("Failed to analyze {}: {e}", path.display()))?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        entries.push(CorpusPhotoEntry::new(
            id,
            stats,
            path.display().to_string(),
        ));
    }

    let json = serde_json::to_string_pretty(&entries)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("Wrote {} entries to {}", entries.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();

    println!("Photomosaic v{VERSION}");
    println!("Chunked photo mosaic assembly\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:3000 (default)")
    );
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("config.yaml (default)")
    );

    let path = PathBuf::from(config_file.as_deref().unwrap_or("config.yaml"));
    println!("\nConfig:");
    if path.exists() {
        let config = AppConfig::load(&path);
        println!("  Source:     {}", path.display());
        println!(
            "  Jobs:       {}",
            config
                .storage
                .jobs_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "in memory".to_string())
        );
        println!(
            "  Corpus:     {}",
            config
                .storage
                .corpus_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
        println!("  Row step:   {}", config.assembly.row_step);
        println!("  Hue window: {:?}", config.matcher.hue_window);
    } else {
        println!("  {} not found, using defaults", path.display());
    }

    println!("\nCommands:");
    println!("  photomosaic serve     Start the HTTP server");
    println!("  photomosaic create    Queue a mosaic for an image");
    println!("  photomosaic run       Assemble queued mosaics locally");
    println!("  photomosaic chunk     Assemble one row range");
    println!("  photomosaic analyze   Compute corpus entries from images");
    println!("\nRun 'photomosaic --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photomosaic=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let config = AppConfig::load_from_env();
    let state = server::create_app_state(config)?;

    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Photomosaic server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
