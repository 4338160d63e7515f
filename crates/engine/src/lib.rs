//! `pinjam-engine` — borrow/return bookkeeping over the session tables.
//!
//! [`LoanEngine`] owns the inventory and the loan ledger and is the only
//! component allowed to change them together. Backups go through the CSV
//! codec in [`codec`].

pub mod clock;
pub mod codec;
pub mod engine;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::TableKind;
pub use engine::LoanEngine;
