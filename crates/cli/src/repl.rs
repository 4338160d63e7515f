//! Interactive session: reads one command per line and renders engine state.
//!
//! This layer owns no domain rules. It parses input, calls the engine and
//! prints whatever the engine returns, errors included.

use std::fs;
use std::io::{BufRead, Write};

use anyhow::Context;
use clap::{Parser, Subcommand};

use pinjam_core::{DomainError, ItemCode, LoanId};
use pinjam_engine::{Clock, LoanEngine, TableKind};
use pinjam_ledger::LoanRecord;

use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true, disable_help_subcommand = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// List all items with their current stock.
    Items,
    /// Show name and stock of one item.
    Item { code: String },
    /// List every loan record.
    Loans,
    /// List loans that can still be returned.
    Returnable,
    /// Borrow items: borrow "<name>" <code> <quantity>
    Borrow {
        name: String,
        code: String,
        quantity: u32,
    },
    /// Return a borrowed loan by id.
    Return { loan_id: String },
    /// Export a table to CSV: export <inventory|ledger> [file]
    Export { table: String, file: Option<String> },
    /// Restore a table from CSV: import <inventory|ledger> [file]
    Import { table: String, file: Option<String> },
    Help,
    #[command(alias = "exit")]
    Quit,
}

const HELP: &str = "\
commands:
  items                              list items and stock
  item <code>                        show one item
  loans                              list all loans
  returnable                         list loans still borrowed
  borrow \"<name>\" <code> <quantity>  borrow items
  return <loan-id>                   return a loan
  export <inventory|ledger> [file]   write a CSV backup
  import <inventory|ledger> [file]   restore a table from CSV
  help                               show this text
  quit                               end the session";

/// Whether the loop should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One interactive session over an engine.
pub struct Session<C: Clock> {
    engine: LoanEngine<C>,
    settings: Settings,
}

impl<C: Clock> Session<C> {
    pub fn new(engine: LoanEngine<C>, settings: Settings) -> Self {
        Self { engine, settings }
    }

    pub fn engine(&self) -> &LoanEngine<C> {
        &self.engine
    }

    /// Read commands until end of input or `quit`.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
        writeln!(out, "Aplikasi Peminjaman Barang. Type 'help' for commands.")?;
        for line in input.lines() {
            let line = line.context("failed to read input")?;
            if self.handle_line(&line, out)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Handle a single input line. Only output failures are returned as errors.
    pub fn handle_line(&mut self, line: &str, out: &mut impl Write) -> anyhow::Result<Flow> {
        let words = match split_words(line) {
            Ok(words) if words.is_empty() => return Ok(Flow::Continue),
            Ok(words) => words,
            Err(msg) => {
                writeln!(out, "error: {msg}")?;
                return Ok(Flow::Continue);
            }
        };

        let command = match Line::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                let rendered = e.to_string();
                let first = rendered.lines().next().unwrap_or("invalid command");
                writeln!(out, "{first}")?;
                writeln!(out, "type 'help' for commands")?;
                return Ok(Flow::Continue);
            }
        };

        if command == Command::Quit {
            return Ok(Flow::Quit);
        }
        if let Err(e) = self.execute(command, out)? {
            writeln!(out, "error: {}", describe(&e))?;
        }
        Ok(Flow::Continue)
    }

    /// Outer result: output/IO failure. Inner result: what the engine said.
    fn execute(
        &mut self,
        command: Command,
        out: &mut impl Write,
    ) -> anyhow::Result<Result<(), DomainError>> {
        match command {
            Command::Items => {
                render_items(&self.engine, out)?;
            }
            Command::Item { code } => match self.engine.item(&ItemCode::new(code)) {
                Ok(item) => writeln!(
                    out,
                    "{}: {} | stock available: {}",
                    item.code(),
                    item.name(),
                    item.stock()
                )?,
                Err(e) => return Ok(Err(e)),
            },
            Command::Loans => {
                let records: Vec<&LoanRecord> = self.engine.ledger().records().collect();
                render_loans(&records, out)?;
            }
            Command::Returnable => {
                let records = self.engine.returnable_loans();
                if records.is_empty() {
                    writeln!(out, "no items are currently borrowed")?;
                } else {
                    render_loans(&records, out)?;
                }
            }
            Command::Borrow { name, code, quantity } => {
                match self.engine.borrow_item(&name, &ItemCode::new(code), quantity) {
                    Ok(loan) => writeln!(
                        out,
                        "{} x {} borrowed by {} ({})",
                        loan.quantity(),
                        loan.item_name(),
                        loan.borrower_name(),
                        loan.loan_id()
                    )?,
                    Err(e) => return Ok(Err(e)),
                }
            }
            Command::Return { loan_id } => {
                let loan_id = LoanId::new(loan_id);
                match self.engine.return_item(&loan_id) {
                    Ok(()) => writeln!(out, "loan {loan_id} returned")?,
                    Err(e) => return Ok(Err(e)),
                }
            }
            Command::Export { table, file } => {
                let kind = match table.parse::<TableKind>() {
                    Ok(kind) => kind,
                    Err(e) => return Ok(Err(e)),
                };
                let bytes = match self.engine.export_table(kind) {
                    Ok(bytes) => bytes,
                    Err(e) => return Ok(Err(e)),
                };
                let path = self
                    .settings
                    .resolve(file.as_deref().unwrap_or(kind.default_file_name()));
                if let Err(e) = fs::write(&path, &bytes) {
                    tracing::warn!(path = %path.display(), error = %e, "export write failed");
                    writeln!(out, "error: cannot write {}: {e}", path.display())?;
                    return Ok(Ok(()));
                }
                writeln!(out, "{kind} exported to {}", path.display())?;
            }
            Command::Import { table, file } => {
                let kind = match table.parse::<TableKind>() {
                    Ok(kind) => kind,
                    Err(e) => return Ok(Err(e)),
                };
                let path = self
                    .settings
                    .resolve(file.as_deref().unwrap_or(kind.default_file_name()));
                let bytes = match fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        writeln!(out, "error: cannot read {}: {e}", path.display())?;
                        return Ok(Ok(()));
                    }
                };
                match self.engine.import_table(kind, &bytes) {
                    Ok(()) => writeln!(out, "{kind} restored from {}", path.display())?,
                    Err(e) => return Ok(Err(e)),
                }
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => {}
        }
        Ok(Ok(()))
    }
}

/// User-facing wording per error kind.
fn describe(err: &DomainError) -> String {
    match err {
        DomainError::Validation(msg) => format!("invalid input: {msg}"),
        DomainError::NotFound(what) => format!("{what} not found"),
        DomainError::InsufficientStock { code, requested, available } => {
            format!("not enough stock for {code} (requested {requested}, available {available})")
        }
        other => other.to_string(),
    }
}

fn render_items<C: Clock>(engine: &LoanEngine<C>, out: &mut impl Write) -> std::io::Result<()> {
    if engine.inventory().is_empty() {
        return writeln!(out, "inventory is empty");
    }
    writeln!(out, "{:<10} {:<24} {:>6}", "CODE", "NAME", "STOCK")?;
    for item in engine.inventory().items() {
        writeln!(out, "{:<10} {:<24} {:>6}", item.code(), item.name(), item.stock())?;
    }
    Ok(())
}

fn render_loans(records: &[&LoanRecord], out: &mut impl Write) -> std::io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "no loans recorded");
    }
    writeln!(
        out,
        "{:<8} {:<20} {:<10} {:<16} {:>4} {:<16} {}",
        "ID", "BORROWER", "CODE", "ITEM", "QTY", "BORROWED AT", "STATUS"
    )?;
    for r in records {
        writeln!(
            out,
            "{:<8} {:<20} {:<10} {:<16} {:>4} {:<16} {}",
            r.loan_id(),
            r.borrower_name(),
            r.item_code(),
            r.item_name(),
            r.quantity(),
            r.borrowed_at().format(pinjam_engine::codec::TIMESTAMP_FORMAT),
            r.status()
        )?;
    }
    Ok(())
}

/// Split a line on whitespace, keeping double-quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_word = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if has_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinjam_engine::SystemClock;

    fn session() -> Session<SystemClock> {
        Session::new(LoanEngine::seeded(), Settings::default())
    }

    fn run_lines(session: &mut Session<SystemClock>, lines: &[&str]) -> String {
        let mut out = Vec::new();
        for line in lines {
            session.handle_line(line, &mut out).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn quoted_words_stay_together() {
        let words = split_words(r#"borrow "Alice Smith" SDS001 1"#).unwrap();
        assert_eq!(words, vec!["borrow", "Alice Smith", "SDS001", "1"]);
        assert_eq!(split_words(r#"borrow "" SDS001 1"#).unwrap()[1], "");
        assert!(split_words(r#"borrow "Alice SDS001 1"#).is_err());
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[test]
    fn borrow_and_return_through_the_prompt() {
        let mut session = session();
        let out = run_lines(
            &mut session,
            &[r#"borrow "Alice Smith" SDS001 1"#, "borrow Bob SDS001 1", "return PJM001", "return PJM001"],
        );

        assert!(out.contains("1 x Laptop borrowed by Alice Smith (PJM001)"));
        assert!(out.contains("error: not enough stock for SDS001 (requested 1, available 0)"));
        assert!(out.contains("loan PJM001 returned"));
        assert!(out.contains("error: borrowed loan PJM001 not found"));
        assert_eq!(session.engine().item(&ItemCode::new("SDS001")).unwrap().stock(), 1);
    }

    #[test]
    fn empty_name_is_reported_as_invalid_input() {
        let mut session = session();
        let out = run_lines(&mut session, &[r#"borrow "" SDS001 1"#]);
        assert!(out.contains("error: invalid input: empty borrower name"));
        assert!(session.engine().ledger().is_empty());
    }

    #[test]
    fn returnable_lists_only_open_loans() {
        let mut session = session();
        let out = run_lines(&mut session, &["returnable"]);
        assert!(out.contains("no items are currently borrowed"));

        let out = run_lines(&mut session, &["borrow Alice SDS002 1", "returnable"]);
        assert!(out.contains("PJM001"));
        assert!(out.contains("Borrowed"));
    }

    #[test]
    fn unknown_commands_and_bad_numbers_do_not_end_the_session() {
        let mut session = session();
        let mut out = Vec::new();
        assert_eq!(session.handle_line("dance", &mut out).unwrap(), Flow::Continue);
        assert_eq!(session.handle_line("borrow Alice SDS001 two", &mut out).unwrap(), Flow::Continue);
        assert_eq!(session.handle_line("exit", &mut out).unwrap(), Flow::Quit);
        assert!(session.engine().ledger().is_empty());
    }

    #[test]
    fn export_and_import_use_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let mut session = Session::new(LoanEngine::seeded(), settings.clone());
        run_lines(&mut session, &["borrow Alice SDS001 1", "export ledger", "export inventory"]);
        assert!(dir.path().join("peminjaman.csv").exists());
        assert!(dir.path().join("inventory.csv").exists());

        let mut restored = Session::new(LoanEngine::seeded(), settings);
        let out = run_lines(&mut restored, &["import ledger", "import inventory"]);
        assert!(out.contains("ledger restored"));
        assert_eq!(restored.engine().ledger(), session.engine().ledger());
        assert_eq!(restored.engine().inventory(), session.engine().inventory());
    }

    #[test]
    fn run_stops_at_quit() {
        let mut session = session();
        let input = "items\nquit\nborrow Alice SDS001 1\n";
        let mut out = Vec::new();
        session.run(input.as_bytes(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("SDS001"));
        assert!(session.engine().ledger().is_empty());
    }
}
