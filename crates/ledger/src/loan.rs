use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use pinjam_core::{DomainError, DomainResult, Entity, ItemCode, KeyedTable, LoanId};

/// Lifecycle state of a loan record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    #[serde(alias = "Dipinjam", alias = "borrowed")]
    Borrowed,
    #[serde(alias = "Dikembalikan", alias = "returned")]
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "Borrowed",
            LoanStatus::Returned => "Returned",
        }
    }

    /// Only `Borrowed -> Returned` is a legal transition.
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!((self, next), (LoanStatus::Borrowed, LoanStatus::Returned))
    }
}

impl core::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One borrow transaction.
///
/// `item_name` is a snapshot taken at borrow time and is not kept in sync
/// with later changes to the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanRecord {
    loan_id: LoanId,
    borrower_name: String,
    item_code: ItemCode,
    item_name: String,
    quantity: u32,
    borrowed_at: NaiveDateTime,
    status: LoanStatus,
}

impl LoanRecord {
    /// Rebuild a record as-is (restore path). No field is validated.
    pub fn restore(
        loan_id: LoanId,
        borrower_name: String,
        item_code: ItemCode,
        item_name: String,
        quantity: u32,
        borrowed_at: NaiveDateTime,
        status: LoanStatus,
    ) -> Self {
        Self {
            loan_id,
            borrower_name,
            item_code,
            item_name,
            quantity,
            borrowed_at,
            status,
        }
    }

    pub fn loan_id(&self) -> &LoanId {
        &self.loan_id
    }

    pub fn borrower_name(&self) -> &str {
        &self.borrower_name
    }

    pub fn item_code(&self) -> &ItemCode {
        &self.item_code
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn borrowed_at(&self) -> NaiveDateTime {
        self.borrowed_at
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn is_outstanding(&self) -> bool {
        self.status == LoanStatus::Borrowed
    }
}

impl Entity for LoanRecord {
    type Id = LoanId;

    fn id(&self) -> &Self::Id {
        &self.loan_id
    }
}

/// A loan about to be appended; the ledger assigns id and status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub borrower_name: String,
    pub item_code: ItemCode,
    pub item_name: String,
    pub quantity: u32,
    pub borrowed_at: NaiveDateTime,
}

/// Loan records in insertion order, keyed by loan id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanLedger {
    records: KeyedTable<LoanRecord>,
}

impl LoanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = LoanRecord>) -> DomainResult<Self> {
        Ok(Self {
            records: KeyedTable::from_records(records)?,
        })
    }

    /// Id the next appended record will receive: `PJM` + (length + 1).
    pub fn next_loan_id(&self) -> LoanId {
        LoanId::from_sequence(self.records.len() + 1)
    }

    /// Append a new `Borrowed` record under the next sequential id.
    ///
    /// After an out-of-order restore the sequential id may already be taken;
    /// that is reported as a conflict and nothing is appended.
    pub fn append(&mut self, loan: NewLoan) -> DomainResult<&LoanRecord> {
        let loan_id = self.next_loan_id();
        if self.records.contains(&loan_id) {
            return Err(DomainError::conflict(format!("loan id {loan_id} already exists")));
        }

        let record = LoanRecord {
            loan_id: loan_id.clone(),
            borrower_name: loan.borrower_name,
            item_code: loan.item_code,
            item_name: loan.item_name,
            quantity: loan.quantity,
            borrowed_at: loan.borrowed_at,
            status: LoanStatus::Borrowed,
        };
        self.records.insert(record)?;

        self.find_by_id(&loan_id)
    }

    pub fn find_by_id(&self, loan_id: &LoanId) -> DomainResult<&LoanRecord> {
        self.records
            .get(loan_id)
            .ok_or_else(|| DomainError::not_found(format!("loan {loan_id}")))
    }

    /// Move a record to `status`. Only `Borrowed -> Returned` is accepted.
    pub fn set_status(&mut self, loan_id: &LoanId, status: LoanStatus) -> DomainResult<()> {
        let record = self
            .records
            .get_mut(loan_id)
            .ok_or_else(|| DomainError::not_found(format!("loan {loan_id}")))?;

        if !record.status.can_transition_to(status) {
            return Err(DomainError::invariant(format!(
                "loan {loan_id} cannot move from {} to {status}",
                record.status
            )));
        }
        record.status = status;
        Ok(())
    }

    /// Replace every record (restore). Ids are kept as given, never renumbered.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = LoanRecord>) -> DomainResult<()> {
        self.records.replace_all(records)
    }

    pub fn records(&self) -> impl Iterator<Item = &LoanRecord> {
        self.records.iter()
    }

    /// Records still `Borrowed`, in ledger order.
    pub fn outstanding(&self) -> impl Iterator<Item = &LoanRecord> {
        self.records.iter().filter(|r| r.is_outstanding())
    }

    /// Total quantity still out on loan for one item.
    pub fn outstanding_quantity(&self, item_code: &ItemCode) -> u64 {
        self.outstanding()
            .filter(|r| &r.item_code == item_code)
            .map(|r| u64::from(r.quantity))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
