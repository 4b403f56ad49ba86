use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};

use curricula::gateway::Difficulty;
use curricula::processing::{BroadcastProgress, MaterialProgressEvent, ProgressReporter};
use curricula::{
    load_config, register_upload, BatchScheduler, CurriculaConfig, Database, ExtractorRegistry,
    GenerationConfig, GenerationService, HttpGenerationGateway, MaterialStore,
    ProcessingOrchestrator, ProcessingStatus, SqliteMaterialStore,
};

#[derive(Parser, Debug)]
#[command(
    name = "curricula-worker",
    version,
    about = "Extracts, validates and sweeps uploaded curriculum materials."
)]
pub struct Cli {
    /// Path to curricula.json (built-in defaults when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the batch scheduler until Ctrl-C
    Run {
        /// Log each material's progress through extraction and validation
        #[arg(long)]
        progress: bool,
    },
    /// Run a single sweep and print its summary
    Sweep,
    /// Re-process one material regardless of its current outcome
    Process { id: String },
    /// Print the processing status of a material
    Status { id: String },
    /// Register an uploaded file as a pending material
    Register(RegisterArgs),
    /// Archive (or restore) a material
    Archive {
        id: String,
        #[arg(long)]
        restore: bool,
    },
    /// Soft-delete a material
    Delete { id: String },
    /// Count materials per processing status
    Stats,
    /// Generate an assignment from a completed material
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    pub path: PathBuf,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub teacher: String,
    #[arg(long)]
    pub school: String,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    pub id: String,
    #[arg(long, default_value_t = 10)]
    pub questions: u32,
    #[arg(long, value_enum, default_value_t = DifficultyArg::Medium)]
    pub difficulty: DifficultyArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DifficultyArg {
    Easy,
    Medium,
    Hard,
    Mixed,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
            DifficultyArg::Mixed => Difficulty::Mixed,
        }
    }
}

/// Buffered progress events before a slow log subscriber starts dropping them.
const PROGRESS_CAPACITY: usize = 256;

/// Store, registry and orchestrator wired from one loaded config.
struct Worker {
    config: CurriculaConfig,
    store: Arc<dyn MaterialStore>,
    registry: Arc<ExtractorRegistry>,
    orchestrator: Arc<ProcessingOrchestrator>,
}

impl Worker {
    fn open(
        config_path: Option<&PathBuf>,
        progress: Option<Arc<dyn ProgressReporter>>,
    ) -> Result<Self> {
        let config = match config_path {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => CurriculaConfig::default(),
        };

        let db_path = config
            .database_path()
            .context("Could not determine database path (no home directory)")?;
        let db = Database::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        let store: Arc<dyn MaterialStore> = Arc::new(SqliteMaterialStore::new(db));
        let registry = Arc::new(ExtractorRegistry::new(config.upload_root_path()));
        let mut orchestrator = ProcessingOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            config.validation,
        )
        .with_stale_after(config.scheduler.stale_after());
        if let Some(progress) = progress {
            orchestrator = orchestrator.with_progress(progress);
        }

        Ok(Self {
            config,
            store,
            registry,
            orchestrator: Arc::new(orchestrator),
        })
    }

    fn scheduler(&self) -> BatchScheduler {
        BatchScheduler::new(
            Arc::clone(&self.orchestrator),
            self.config.scheduler.batch_size,
            self.config.scheduler.interval(),
        )
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let (reporter, progress_rx) = match self.command {
            Command::Run { progress: true } => {
                let (reporter, rx) = BroadcastProgress::channel(PROGRESS_CAPACITY);
                let reporter: Arc<dyn ProgressReporter> = Arc::new(reporter);
                (Some(reporter), Some(rx))
            }
            _ => (None, None),
        };
        let worker = Worker::open(self.config.as_ref(), reporter)?;

        match self.command {
            Command::Run { .. } => {
                if let Some(rx) = progress_rx {
                    spawn_progress_logger(rx);
                }
                run_scheduler(&worker)
            }
            Command::Sweep => {
                let summary = worker.scheduler().run_sweep()?;
                print_json(&summary)
            }
            Command::Process { id } => {
                let report = worker.orchestrator.reprocess(&id)?;
                print_json(&report)
            }
            Command::Status { id } => {
                let status = worker.orchestrator.status(&id)?;
                print_json(&status)
            }
            Command::Register(args) => {
                let material = register_upload(
                    worker.store.as_ref(),
                    &args.path,
                    &args.title,
                    &args.teacher,
                    &args.school,
                )?;
                if !worker.registry.supports(&material.file_type) {
                    log::warn!(
                        "Registered {} but '{}' files cannot be extracted (supported: {})",
                        material.id,
                        material.file_type,
                        worker.registry.supported_types().join(", ")
                    );
                }
                print_json(&material.status_view())
            }
            Command::Archive { id, restore } => {
                worker.store.archive(&id, !restore)?;
                print_json(&json!({ "materialId": id, "archived": !restore }))
            }
            Command::Delete { id } => {
                worker.store.soft_delete(&id)?;
                print_json(&json!({ "materialId": id, "deleted": true }))
            }
            Command::Stats => {
                let mut counts = serde_json::Map::new();
                for status in ProcessingStatus::ALL {
                    let count = worker.store.count_by_status(status)?;
                    counts.insert(status.as_str().to_string(), json!(count));
                }
                print_json(&counts)
            }
            Command::Generate(args) => generate(&worker, args),
        }
    }
}

fn run_scheduler(worker: &Worker) -> Result<()> {
    if !worker.config.scheduler.enabled {
        bail!("Scheduler is disabled in config (scheduler.enabled = false)");
    }

    let scheduler = worker.scheduler();
    let (trigger_tx, trigger_rx) = tokio::sync::broadcast::channel(4);
    let handle = scheduler.start(trigger_rx);

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("Failed to install Ctrl-C handler")?;

    log::info!("Worker running, press Ctrl-C to stop");
    let _ = stop_rx.recv();

    log::info!("Shutting down scheduler");
    scheduler.stop();
    // Wake the loop so it sees the shutdown flag without waiting a full interval.
    let _ = trigger_tx.send(());
    if handle.join().is_err() {
        bail!("Scheduler thread panicked");
    }
    Ok(())
}

/// Logs every published progress event until the channel closes.
fn spawn_progress_logger(mut rx: broadcast::Receiver<MaterialProgressEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || loop {
        match rx.blocking_recv() {
            Ok(event) => log_progress(&event),
            Err(RecvError::Lagged(missed)) => {
                log::warn!("Progress log fell behind, {} events dropped", missed);
            }
            Err(RecvError::Closed) => break,
        }
    })
}

fn log_progress(event: &MaterialProgressEvent) {
    match &event.error {
        Some(error) => tracing::warn!(
            material_id = %event.material_id,
            phase = %event.phase,
            "{}: {}",
            event.message,
            error
        ),
        None => tracing::info!(
            material_id = %event.material_id,
            phase = %event.phase,
            word_count = ?event.word_count,
            "{}",
            event.message
        ),
    }
}

fn generate(worker: &Worker, args: GenerateArgs) -> Result<()> {
    let Some(settings) = worker.config.generation.as_ref() else {
        bail!("No `generation` section in config");
    };

    let api_key = settings.api_key()?;
    let gateway = match settings.timeout() {
        Some(timeout) => HttpGenerationGateway::with_timeout(&settings.base_url, api_key, timeout)?,
        None => HttpGenerationGateway::new(&settings.base_url, api_key)?,
    };
    let service = GenerationService::new(
        Arc::clone(&worker.store),
        Arc::new(gateway),
        worker.config.validation,
    );

    let config = GenerationConfig {
        num_questions: args.questions,
        difficulty: args.difficulty.into(),
        ..GenerationConfig::default()
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let response = runtime.block_on(service.generate_from_material(&args.id, config))?;
    print_json(&response)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_register() {
        let cli = Cli::try_parse_from([
            "curricula-worker",
            "register",
            "/tmp/unit.pdf",
            "--title",
            "Unit 1",
            "--teacher",
            "t-1",
            "--school",
            "s-1",
        ])
        .unwrap();
        match cli.command {
            Command::Register(args) => {
                assert_eq!(args.path, PathBuf::from("/tmp/unit.pdf"));
                assert_eq!(args.title, "Unit 1");
                assert_eq!(args.teacher, "t-1");
                assert_eq!(args.school, "s-1");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "curricula-worker",
            "sweep",
            "--config",
            "curricula.json",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("curricula.json")));
        assert!(matches!(cli.command, Command::Sweep));
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["curricula-worker", "generate", "m-1"]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.questions, 10);
        assert_eq!(Difficulty::from(args.difficulty), Difficulty::Medium);
    }

    #[test]
    fn test_worker_opens_configured_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("curricula.json");
        let db_path = dir.path().join("data").join("curricula.db");
        std::fs::write(
            &config_path,
            json!({ "version": "1.0", "database": { "path": db_path } }).to_string(),
        )
        .unwrap();

        let worker = Worker::open(Some(&config_path), None).unwrap();
        assert!(db_path.exists());
        assert_eq!(worker.store.count_by_status(ProcessingStatus::Pending).unwrap(), 0);
        assert_eq!(worker.scheduler().batch_size(), 10);
    }

    #[test]
    fn test_parse_run_with_progress() {
        let cli = Cli::try_parse_from(["curricula-worker", "run", "--progress"]).unwrap();
        assert!(matches!(cli.command, Command::Run { progress: true }));

        let cli = Cli::try_parse_from(["curricula-worker", "run"]).unwrap();
        assert!(matches!(cli.command, Command::Run { progress: false }));
    }

    #[test]
    fn test_progress_events_reach_the_logger() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("curricula.json");
        std::fs::write(
            &config_path,
            json!({
                "version": "1.0",
                "upload_root": dir.path(),
                "database": { "path": dir.path().join("curricula.db") }
            })
            .to_string(),
        )
        .unwrap();
        let upload = dir.path().join("notes.txt");
        std::fs::write(&upload, b"plain notes").unwrap();

        let (reporter, mut rx) = BroadcastProgress::channel(PROGRESS_CAPACITY);
        let worker = Worker::open(Some(&config_path), Some(Arc::new(reporter))).unwrap();
        assert!(!worker.registry.supports("txt"));
        register_upload(worker.store.as_ref(), &upload, "Notes", "t-1", "s-1").unwrap();

        let summary = worker.scheduler().run_sweep().unwrap();
        assert_eq!(summary.failed, 1);

        let first = rx.try_recv().unwrap();
        assert_eq!(first.phase.to_string(), "Claimed");
        let mut last = first;
        while let Ok(event) = rx.try_recv() {
            last = event;
        }
        assert!(last.error.is_some());

        // The logger thread exits once the orchestrator, and with it the
        // sender, is gone.
        let logger = spawn_progress_logger(rx);
        drop(worker);
        logger.join().unwrap();
    }
}
