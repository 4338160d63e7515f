//! Loan ledger module.
//!
//! Borrow transactions in insertion order. Pure domain logic only: no IO.

pub mod loan;

pub use loan::{LoanLedger, LoanRecord, LoanStatus, NewLoan};
