//! `pinjam-cli` — interactive front end for a single bookkeeping session.
//!
//! The session engine is built once at startup and passed to the prompt loop;
//! nothing survives the process except explicit CSV exports.

pub mod repl;
pub mod settings;

use anyhow::Context;

use pinjam_engine::{LoanEngine, TableKind};

pub use repl::{Flow, Session};
pub use settings::Settings;

/// Build the session engine: built-in seed, or the configured seed CSV.
pub fn build_engine(settings: &Settings) -> anyhow::Result<LoanEngine> {
    let mut engine = LoanEngine::seeded();
    if let Some(seed) = &settings.seed {
        let bytes = std::fs::read(seed)
            .with_context(|| format!("failed to read seed inventory {}", seed.display()))?;
        engine
            .import_table(TableKind::Inventory, &bytes)
            .with_context(|| format!("invalid seed inventory {}", seed.display()))?;
        tracing::info!(seed = %seed.display(), items = engine.inventory().len(), "seed inventory loaded");
    }
    Ok(engine)
}
