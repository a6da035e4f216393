use crate::{
    analysis::command::CommandAnalysisService,
    chunk_plan::{ChunkPlan, ServicePageRange},
    config::Config,
    orchestrator::{InvocationRequest, InvocationResponse, Orchestrator, Outcome},
    page_count::{PageCounter, PdfPageCounter},
    queue::SpoolQueue,
    store::FsDocumentStore,
    util::ensure_dir,
};
use anyhow::{Context, Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "chunk-dispatch")]
#[command(about = "Split a paginated document into page-range chunks and dispatch them for analysis")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./chunk-dispatch.toml if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch one document, plan its chunks and dispatch every chunk.
    Run {
        #[arg(long)]
        container: String,
        #[arg(long)]
        object_key: String,
        #[arg(long)]
        max_chunk_size: Option<u32>,
    },
    /// Print the chunk plan without dispatching anything.
    Plan {
        #[command(flatten)]
        source: PlanSource,
        #[arg(long)]
        max_chunk_size: Option<u32>,
    },
}

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
pub struct PlanSource {
    /// Total page count to plan for.
    #[arg(long)]
    pub pages: Option<u32>,
    /// Local PDF whose pages are counted.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

/// Returns the process exit code.
pub fn dispatch(args: Args) -> Result<i32> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    match &args.cmd {
        Command::Run {
            container,
            object_key,
            max_chunk_size,
        } => {
            if let Some(n) = max_chunk_size {
                cfg.dispatch.max_chunk_size = *n;
            }
            let _guard = init_logging(&args, &cfg)?;
            run(&cfg, container, object_key)
        }
        Command::Plan {
            source,
            max_chunk_size,
        } => {
            if let Some(n) = max_chunk_size {
                cfg.dispatch.max_chunk_size = *n;
            }
            let _guard = init_logging(&args, &cfg)?;
            plan(&cfg, source)
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("chunk-dispatch.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the JSON response, so human-readable logs go to stderr.
    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = match resolve_log_path(cfg) {
        Some(path) => {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            ensure_dir(parent)?;
            let file = std::fs::File::create(&path)
                .with_context(|| format!("create log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.work_dir).join("chunk-dispatch.log"))
}

fn run(cfg: &Config, container: &str, object_key: &str) -> Result<i32> {
    let response = invoke(cfg, container, object_key);
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(if response.status_code == 200 { 0 } else { 1 })
}

/// Runs one invocation against the configured collaborators. Setup errors
/// come back as a failure response like any other.
pub fn invoke(cfg: &Config, container: &str, object_key: &str) -> InvocationResponse {
    let orchestrator = match build_orchestrator(cfg) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            error!("invocation setup failed: {:#}", err);
            return Outcome::rejected(err).into_response();
        }
    };

    orchestrator.handle(&InvocationRequest {
        container: container.to_string(),
        object_key: object_key.to_string(),
    })
}

fn build_orchestrator(
    cfg: &Config,
) -> Result<Orchestrator<FsDocumentStore, PdfPageCounter, CommandAnalysisService, SpoolQueue>> {
    cfg.validate()?;

    let orchestrator = Orchestrator::new(
        cfg,
        FsDocumentStore::new(&cfg.store.root),
        PdfPageCounter,
        CommandAnalysisService::new(&cfg.analysis)?,
        SpoolQueue::new(&cfg.dispatch.queue_target),
    );
    info!(
        "store={} queue={} max_chunk_size={}",
        cfg.store.root, cfg.dispatch.queue_target, cfg.dispatch.max_chunk_size
    );
    Ok(orchestrator)
}

fn plan(cfg: &Config, source: &PlanSource) -> Result<i32> {
    let page_count = match (source.pages, source.input.as_deref()) {
        (Some(pages), _) => pages,
        (None, Some(input)) => PdfPageCounter.count_pages(input)?,
        (None, None) => return Err(anyhow!("either --pages or --input is required")),
    };
    let plan = ChunkPlan::from_page_count(page_count, cfg.dispatch.max_chunk_size)?;
    let service_ranges: Vec<ServicePageRange> =
        plan.chunks.iter().map(|c| c.to_service()).collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "plan": plan,
            "service_ranges": service_ranges,
        }))?
    );
    Ok(0)
}
