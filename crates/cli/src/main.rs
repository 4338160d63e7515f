use std::path::PathBuf;

use clap::Parser;

use pinjam_cli::{Session, Settings, build_engine};
use pinjam_observability::LogFormat;

/// Inventory loan bookkeeping for one interactive session.
#[derive(Parser, Debug)]
#[command(name = "pinjam", version)]
struct Args {
    /// Settings file (defaults to ./pinjam.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Inventory CSV to start from instead of the built-in seed.
    #[arg(long)]
    seed: Option<PathBuf>,
    /// Directory used for export/import file names.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Log output format: pretty or json.
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    if let Some(dir) = args.data_dir {
        settings.data_dir = dir;
    }
    if let Some(format) = args.log_format {
        settings.log_format = format;
    }

    pinjam_observability::init(settings.log_format);
    tracing::info!(data_dir = %settings.data_dir.display(), "session starting");

    let engine = build_engine(&settings)?;
    let mut session = Session::new(engine, settings);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    session.run(stdin.lock(), &mut stdout)?;

    tracing::info!("session ended");
    Ok(())
}
