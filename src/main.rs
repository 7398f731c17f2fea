use anyhow::Result;
use clap::Parser;
use rollcall::{
    classify::SystemClock,
    cli,
    config::Config,
    journal::Journal,
    policy::Session,
    scanner::ScanFeed,
    store::{FileStore, MemoryStore, Store},
    tracker::{AppState, Tracker},
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rollcall", about = "Badge-scan attendance tracker")]
pub struct Args {
    #[arg(short, long, help = "Run one line (command or badge id) and exit")]
    pub command: Option<String>,

    #[arg(long, help = "Read badge ids from stdin, one per line")]
    pub scan_stdin: bool,

    #[arg(
        long,
        env = "ROLLCALL_ROLE",
        help = "Acting role: Admin or Employee (overrides config)"
    )]
    pub role: Option<String>,

    #[arg(long, env = "ROLLCALL_DATA_DIR", help = "Directory for stored data")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Session journal directory")]
    pub journal_dir: Option<PathBuf>,

    #[arg(long, help = "Do not write a session journal")]
    pub no_journal: bool,

    #[arg(long, help = "Load stored data but keep every change in memory")]
    pub dry_run: bool,

    #[arg(long, help = "Verbose output (log state changes)")]
    pub verbose: bool,

    #[arg(long, help = "Debug output (log storage and scanner details)")]
    pub debug: bool,
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = if args.debug {
        "debug".to_string()
    } else if args.verbose {
        "info".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string())
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args)?;

    let mut cfg = if let Some(config_path) = &args.config {
        Config::load_from(config_path)?
    } else {
        Config::load()?
    };

    // CLI overrides
    if let Some(role) = &args.role {
        cfg.session.role = Some(role.clone());
    }
    if let Some(dir) = &args.data_dir {
        cfg.storage.data_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.journal_dir {
        cfg.journal.dir = Some(dir.clone());
    }
    if args.no_journal {
        cfg.journal.enabled = Some(false);
    }

    if let Err(errors) = cfg.validate() {
        for e in &errors {
            eprintln!("Config error {}", e);
        }
        return Err(anyhow::anyhow!(
            "Invalid configuration ({} error(s))",
            errors.len()
        ));
    }

    let root = std::env::current_dir()?;
    let data_dir = cfg.data_dir(&root);

    if args.dry_run {
        // Seed a memory store so nothing is written back
        let mut memory = MemoryStore::new();
        AppState::load(&FileStore::at(&data_dir))?.save(&mut memory)?;
        eprintln!("Dry run: changes will not be saved");
        run(&args, cfg, root, memory)
    } else {
        let store = FileStore::open(&data_dir)?;
        tracing::debug!(data_dir = %store.dir().display(), "store opened");
        run(&args, cfg, root, store)
    }
}

fn run<S: Store>(args: &Args, cfg: Config, root: PathBuf, store: S) -> Result<()> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let mut tracker = Tracker::open(store)?.with_timestamp_format(cfg.timestamp_format());

    if cfg.journal_enabled() {
        tracker = tracker.with_journal(open_journal(&cfg.journal_dir(&root), &session_id, &root)?);
    }

    let session = Session::new(cfg.role());
    let feed = ScanFeed::new(cfg.cooldown_ms());

    let ctx = cli::Context {
        root,
        session_id,
        session: RefCell::new(session),
        config: cfg,
        tracker: RefCell::new(tracker),
        feed: RefCell::new(feed),
        clock: Box::new(SystemClock),
    };

    if args.scan_stdin {
        cli::run_scan_stream(&ctx, std::io::stdin().lock(), &mut std::io::stdout().lock())
    } else if let Some(line) = &args.command {
        cli::run_once(&ctx, line)
    } else {
        cli::run_repl(ctx)
    }
}

fn open_journal(dir: &Path, session_id: &str, root: &Path) -> Result<Journal> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.jsonl", session_id));
    Journal::new(&path, session_id, root)
}
