mod accounts;
mod artifacts;
mod config;

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use lmseed_core::{EntityKind, Severity};
use lmseed_generate::{GenerationError, GenerationPipeline};
use lmseed_load::{
    AUTH_USERS_TABLE, BatchLoader, MemoryStore, PgStore, SetupError, StoreError, TableAliases, TargetStore, clear_all,
    run_setup,
};

use accounts::{SampleAccount, sample_accounts};
use artifacts::{
    ArtifactError, RunConfig, RunContext, SeedReport, init_run_logging, start_run, write_accounts, write_report,
};
use config::{ConfigError, ConnectionArgs, CountOverrides, SeedConfig};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("schema setup failed: {0}")]
    Setup(#[from] SetupError),
}

impl CliError {
    fn severity(&self) -> Severity {
        match self {
            CliError::Store(err) => err.severity(),
            CliError::Setup(err) => err.severity(),
            CliError::Generation(err) => err.severity(),
            CliError::Config(_) | CliError::Artifact(_) => Severity::Fatal,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lmseed", version, about = "Seeds a learning-platform database with synthetic data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a dataset and load it.
    Seed(SeedArgs),
    /// Truncate every seeded table.
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
struct SeedArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(flatten)]
    counts: CountOverrides,
    /// TOML file with seed, batch size, counts and setup scripts.
    #[arg(long)]
    config: Option<PathBuf>,
    /// RNG seed, for reproducible datasets.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    batch_size: Option<usize>,
    /// Clear existing data before seeding.
    #[arg(long, default_value_t = false)]
    clear: bool,
    /// Skip the setup scripts.
    #[arg(long, default_value_t = false)]
    skip_schema: bool,
    /// Load into an in-memory store instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
}

#[derive(Args, Debug)]
struct ClearArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Seed(args) => run_seed(args).await,
        Command::Clear(args) => run_clear(args).await,
    };
    if let Err(err) = &result {
        error!(event = "run_failed", severity = ?err.severity(), error = %err);
    }
    result
}

async fn run_seed(args: SeedArgs) -> Result<(), CliError> {
    let mut config = SeedConfig::load(args.config.as_deref())?;
    args.counts.apply(&mut config.counts);
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    config.validate()?;
    let seed = config.seed.unwrap_or_else(random_seed);
    let run_setup_scripts = !args.skip_schema && !args.dry_run;

    let run_ctx = RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: Utc::now(),
        run_dir: args.run_dir,
    };
    let run_config = RunConfig {
        run_id: run_ctx.run_id.clone(),
        started_at: run_ctx.started_at.to_rfc3339(),
        command: "seed".to_string(),
        engine: if args.dry_run { "memory" } else { "postgres" }.to_string(),
        seed: Some(seed),
        batch_size: Some(config.batch_size),
        counts: Some(config.counts.clone()),
        scripts: config.scripts.clone(),
        clear: args.clear,
        skip_schema: !run_setup_scripts,
        dry_run: args.dry_run,
        connection: (!args.dry_run).then(|| args.connection.redacted()),
    };
    let paths = start_run(&run_ctx, &run_config)?;
    init_run_logging(&paths.logs_path)?;

    info!(event = "run_started", run_id = %run_ctx.run_id, seed, dry_run = args.dry_run);
    let timer = Instant::now();
    let mut report = SeedReport::new(&run_ctx.run_id);
    let aliases = TableAliases::default();

    let mut store: Box<dyn TargetStore> = if args.dry_run {
        Box::new(
            MemoryStore::new()
                .with_profile_trigger(AUTH_USERS_TABLE, EntityKind::Profile.table())
                .with_foreign_keys(&aliases),
        )
    } else {
        Box::new(PgStore::new(args.connection.connect_options()))
    };
    store.connect().await?;
    info!(event = "store_connected", engine = store.engine());

    let outcome = seed_with_store(
        store.as_mut(),
        &config,
        seed,
        &aliases,
        args.clear,
        run_setup_scripts,
        &mut report,
    )
    .await;

    if let Err(err) = store.close().await {
        warn!(error = %err, "closing the store failed");
    }
    report.elapsed_ms = timer.elapsed().as_millis() as u64;
    write_report(&paths, &report)?;
    let accounts = outcome?;
    write_accounts(&paths, &accounts)?;
    info!(event = "sample_accounts_written", count = accounts.len(), path = %paths.accounts_path.display());

    if let Some(generation) = &report.generation {
        info!(event = "generation_summary", total_records = generation.total_records);
    }
    if let Some(load) = &report.load {
        for table in &load.tables {
            info!(table = %table.table, loaded = table.loaded, failed = table.failed, "load summary");
        }
        info!(
            event = "load_summary",
            loaded = load.total_loaded(),
            failed = load.total_failed(),
            elapsed_ms = load.elapsed_ms
        );
    }
    info!(event = "run_finished", status = "success", duration_ms = report.elapsed_ms, run_dir = %paths.root.display());
    Ok(())
}

async fn seed_with_store(
    store: &mut dyn TargetStore,
    config: &SeedConfig,
    seed: u64,
    aliases: &TableAliases,
    clear: bool,
    run_setup_scripts: bool,
    report: &mut SeedReport,
) -> Result<Vec<SampleAccount>, CliError> {
    if clear {
        report.clear = Some(clear_all(&mut *store, aliases).await?);
    }
    if run_setup_scripts {
        report.setup = Some(run_setup(&mut *store, &config.scripts).await?);
    } else {
        info!(event = "schema_setup_skipped");
    }

    let dataset = GenerationPipeline::new(config.counts.clone(), seed, Utc::now())?.run();
    for failed in dataset.report.failed_phases() {
        warn!(phase = %failed.phase, "phase failed during generation");
    }

    let load = BatchLoader::new(&mut *store, config.batch_size)
        .with_aliases(aliases.clone())
        .load_registry(&dataset.registry)
        .await?;
    report.load = Some(load);

    let accounts = sample_accounts(&dataset.registry, &config.default_password);
    report.generation = Some(dataset.report);
    Ok(accounts)
}

async fn run_clear(args: ClearArgs) -> Result<(), CliError> {
    let run_ctx = RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: Utc::now(),
        run_dir: args.run_dir,
    };
    let run_config = RunConfig {
        run_id: run_ctx.run_id.clone(),
        started_at: run_ctx.started_at.to_rfc3339(),
        command: "clear".to_string(),
        engine: "postgres".to_string(),
        seed: None,
        batch_size: None,
        counts: None,
        scripts: Vec::new(),
        clear: true,
        skip_schema: true,
        dry_run: false,
        connection: Some(args.connection.redacted()),
    };
    let paths = start_run(&run_ctx, &run_config)?;
    init_run_logging(&paths.logs_path)?;
    info!(event = "run_started", run_id = %run_ctx.run_id, command = "clear");

    let timer = Instant::now();
    let mut store = PgStore::new(args.connection.connect_options());
    store.connect().await?;
    let cleared = clear_all(&mut store, &TableAliases::default()).await;
    if let Err(err) = store.close().await {
        warn!(error = %err, "closing the store failed");
    }

    let mut report = SeedReport::new(&run_ctx.run_id);
    report.clear = Some(cleared?);
    report.elapsed_ms = timer.elapsed().as_millis() as u64;
    write_report(&paths, &report)?;
    info!(event = "run_finished", status = "success", duration_ms = report.elapsed_ms);
    Ok(())
}

/// Seed for runs that did not ask for one; logged so the run can be replayed.
fn random_seed() -> u64 {
    Uuid::new_v4().as_u64_pair().0
}
