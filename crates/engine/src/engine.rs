//! Loan engine: the only place that mutates inventory and ledger together.

use tracing::{info, warn};

use pinjam_core::{DomainError, DomainResult, ItemCode, LoanId};
use pinjam_inventory::{InventoryStore, Item};
use pinjam_ledger::{LoanLedger, LoanRecord, LoanStatus, NewLoan};

use crate::clock::{Clock, SystemClock, truncate_to_minute};
use crate::codec::{self, TableKind};

/// Session state: both tables plus the clock used for borrow timestamps.
///
/// Every mutating operation validates first and then applies its mutations
/// back to back, so a rejected call leaves both tables exactly as they were.
#[derive(Debug, Clone)]
pub struct LoanEngine<C: Clock = SystemClock> {
    inventory: InventoryStore,
    ledger: LoanLedger,
    clock: C,
}

impl LoanEngine<SystemClock> {
    /// Fresh session on the built-in seed inventory and an empty ledger.
    pub fn seeded() -> Self {
        Self::new(InventoryStore::seeded(), LoanLedger::new())
    }

    pub fn new(inventory: InventoryStore, ledger: LoanLedger) -> Self {
        Self::with_clock(inventory, ledger, SystemClock)
    }
}

impl<C: Clock> LoanEngine<C> {
    pub fn with_clock(inventory: InventoryStore, ledger: LoanLedger, clock: C) -> Self {
        Self {
            inventory,
            ledger,
            clock,
        }
    }

    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }

    pub fn ledger(&self) -> &LoanLedger {
        &self.ledger
    }

    /// Look up one item (name and stock preview before borrowing).
    pub fn item(&self, code: &ItemCode) -> DomainResult<&Item> {
        self.inventory.find_by_code(code)
    }

    /// Loans a user may pick from when returning: `Borrowed` only, ledger order.
    pub fn returnable_loans(&self) -> Vec<&LoanRecord> {
        self.ledger.outstanding().collect()
    }

    /// Quantity of `code` currently out on loan.
    pub fn outstanding(&self, code: &ItemCode) -> u64 {
        self.ledger.outstanding_quantity(code)
    }

    /// Borrow `quantity` units of an item.
    ///
    /// Checks, first failure wins: borrower name, item code, quantity against
    /// stock. On success stock is decremented and a `Borrowed` record appended.
    pub fn borrow_item(
        &mut self,
        borrower_name: &str,
        item_code: &ItemCode,
        quantity: u32,
    ) -> DomainResult<LoanRecord> {
        let borrower_name = borrower_name.trim();
        if borrower_name.is_empty() {
            warn!(item_code = %item_code, "borrow rejected: empty borrower name");
            return Err(DomainError::validation("empty borrower name"));
        }

        let item = self.inventory.find_by_code(item_code).inspect_err(|_| {
            warn!(item_code = %item_code, "borrow rejected: unknown item");
        })?;

        if quantity == 0 || quantity > item.stock() {
            warn!(
                item_code = %item_code,
                requested = quantity,
                available = item.stock(),
                "borrow rejected: insufficient stock"
            );
            return Err(DomainError::insufficient_stock(
                item_code.as_str(),
                quantity,
                item.stock(),
            ));
        }

        let loan_id = self.ledger.next_loan_id();
        if self.ledger.find_by_id(&loan_id).is_ok() {
            warn!(loan_id = %loan_id, "borrow rejected: loan id already taken by a restored record");
            return Err(DomainError::conflict(format!("loan id {loan_id} already exists")));
        }

        let new_loan = NewLoan {
            borrower_name: borrower_name.to_string(),
            item_code: item_code.clone(),
            item_name: item.name().to_string(),
            quantity,
            borrowed_at: truncate_to_minute(self.clock.now()),
        };

        self.inventory.adjust_stock(item_code, -i64::from(quantity))?;
        let record = match self.ledger.append(new_loan) {
            Ok(record) => record.clone(),
            Err(e) => {
                // Undo the decrement so stock and ledger stay in step.
                self.inventory.adjust_stock(item_code, i64::from(quantity))?;
                return Err(e);
            }
        };

        info!(
            loan_id = %record.loan_id(),
            borrower = record.borrower_name(),
            item_code = %item_code,
            quantity,
            "item borrowed"
        );
        Ok(record)
    }

    /// Close a `Borrowed` loan and put its quantity back on the shelf.
    ///
    /// Unknown or already returned ids are `NotFound`. If the referenced item
    /// no longer exists (dropped by a restore) the return also fails with
    /// `NotFound` and the loan stays `Borrowed`.
    pub fn return_item(&mut self, loan_id: &LoanId) -> DomainResult<()> {
        let record = self.ledger.find_by_id(loan_id)?;
        if !record.is_outstanding() {
            warn!(loan_id = %loan_id, "return rejected: loan already returned");
            return Err(DomainError::not_found(format!("borrowed loan {loan_id}")));
        }
        let item_code = record.item_code().clone();
        let quantity = record.quantity();

        self.inventory
            .adjust_stock(&item_code, i64::from(quantity))
            .inspect_err(|e| {
                warn!(loan_id = %loan_id, item_code = %item_code, error = %e, "return rejected");
            })?;
        if let Err(e) = self.ledger.set_status(loan_id, LoanStatus::Returned) {
            self.inventory.adjust_stock(&item_code, -i64::from(quantity))?;
            return Err(e);
        }

        info!(loan_id = %loan_id, item_code = %item_code, quantity, "item returned");
        Ok(())
    }

    /// Serialize one table as CSV bytes (header-only when the table is empty).
    pub fn export_table(&self, kind: TableKind) -> DomainResult<Vec<u8>> {
        let (bytes, rows) = match kind {
            TableKind::Inventory => (codec::encode_inventory(self.inventory.items())?, self.inventory.len()),
            TableKind::Ledger => (codec::encode_ledger(self.ledger.records())?, self.ledger.len()),
        };
        info!(table = %kind, rows, bytes = bytes.len(), "table exported");
        Ok(bytes)
    }

    /// Replace one table wholesale with the parsed CSV contents.
    ///
    /// Parsing is all-or-nothing. The other table is not reconciled: outstanding
    /// loans may reference items the new inventory no longer has.
    pub fn import_table(&mut self, kind: TableKind, bytes: &[u8]) -> DomainResult<()> {
        let result = match kind {
            TableKind::Inventory => {
                let items = codec::decode_inventory(bytes)?;
                let rows = items.len();
                self.inventory.replace_all(items).map(|_| rows)
            }
            TableKind::Ledger => {
                let records = codec::decode_ledger(bytes)?;
                let rows = records.len();
                self.ledger.replace_all(records).map(|_| rows)
            }
        };

        match result {
            Ok(rows) => {
                info!(table = %kind, rows, "table imported");
                Ok(())
            }
            Err(DomainError::Conflict(msg)) => {
                warn!(table = %kind, %msg, "import rejected");
                Err(DomainError::parse(format!("{kind}: {msg}")))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{NaiveDate, NaiveDateTime};

    fn test_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(10, 42, 37))
            .unwrap()
    }

    fn engine(items: Vec<Item>) -> LoanEngine<FixedClock> {
        LoanEngine::with_clock(
            InventoryStore::from_items(items).unwrap(),
            LoanLedger::new(),
            FixedClock(test_time()),
        )
    }

    fn code(s: &str) -> ItemCode {
        ItemCode::new(s)
    }

    #[test]
    fn borrow_snapshots_name_and_truncates_time() {
        let mut engine = engine(vec![Item::new("SDS001", "Laptop", 3)]);
        let loan = engine.borrow_item("  Alice ", &code("SDS001"), 2).unwrap();

        assert_eq!(loan.loan_id().as_str(), "PJM001");
        assert_eq!(loan.borrower_name(), "Alice");
        assert_eq!(loan.item_name(), "Laptop");
        assert_eq!(loan.status(), LoanStatus::Borrowed);
        assert_eq!(loan.borrowed_at().format("%Y-%m-%d %H:%M:%S").to_string(), "2024-05-01 10:42:00");
        assert_eq!(engine.item(&code("SDS001")).unwrap().stock(), 1);
        assert_eq!(engine.outstanding(&code("SDS001")), 2);
    }

    #[test]
    fn validation_order_reports_name_before_code() {
        let mut engine = engine(vec![Item::new("SDS001", "Laptop", 1)]);
        let err = engine.borrow_item("", &code("NOPE"), 99).unwrap_err();
        assert_eq!(err, DomainError::validation("empty borrower name"));

        let err = engine.borrow_item("Alice", &code("NOPE"), 99).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn zero_quantity_is_insufficient_stock() {
        let mut engine = engine(vec![Item::new("SDS001", "Laptop", 1)]);
        let err = engine.borrow_item("Alice", &code("SDS001"), 0).unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock("SDS001", 0, 1));
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn borrow_on_colliding_restored_id_changes_nothing() {
        let mut engine = engine(vec![Item::new("SDS001", "Laptop", 2)]);
        let restored = "loanId,borrowerName,itemCode,itemName,quantity,borrowedAt,status\n\
                        PJM002,Budi,SDS001,Laptop,1,2024-04-30 08:00,Returned\n";
        engine.import_table(TableKind::Ledger, restored.as_bytes()).unwrap();

        let err = engine.borrow_item("Alice", &code("SDS001"), 1).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(engine.item(&code("SDS001")).unwrap().stock(), 2);
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn return_of_item_dropped_by_restore_fails_and_keeps_loan_open() {
        let mut engine = engine(vec![Item::new("SDS001", "Laptop", 1)]);
        let loan = engine.borrow_item("Alice", &code("SDS001"), 1).unwrap();
        engine
            .import_table(TableKind::Inventory, b"code,name,stock\nSDS002,Mouse,4\n")
            .unwrap();

        let err = engine.return_item(loan.loan_id()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(
            engine.ledger().find_by_id(loan.loan_id()).unwrap().status(),
            LoanStatus::Borrowed
        );
        assert_eq!(engine.item(&code("SDS002")).unwrap().stock(), 4);
    }

    #[test]
    fn returnable_loans_lists_only_borrowed() {
        let mut engine = engine(vec![Item::new("SDS001", "Laptop", 5)]);
        let first = engine.borrow_item("Alice", &code("SDS001"), 1).unwrap();
        engine.borrow_item("Bob", &code("SDS001"), 1).unwrap();
        engine.return_item(first.loan_id()).unwrap();

        let ids: Vec<_> = engine.returnable_loans().into_iter().map(|r| r.loan_id().as_str()).collect();
        assert_eq!(ids, vec!["PJM002"]);
    }

    #[test]
    fn import_with_duplicate_codes_is_a_parse_error() {
        let mut engine = engine(vec![Item::new("SDS001", "Laptop", 1)]);
        let before = engine.inventory().clone();
        let err = engine
            .import_table(TableKind::Inventory, b"code,name,stock\nA,a,1\nA,b,2\n")
            .unwrap_err();
        assert!(matches!(err, DomainError::Parse(_)));
        assert_eq!(engine.inventory(), &before);
    }

    #[test]
    fn malformed_import_leaves_table_untouched() {
        let mut engine = engine(vec![Item::new("SDS001", "Laptop", 1)]);
        engine.borrow_item("Alice", &code("SDS001"), 1).unwrap();
        let before = engine.ledger().clone();

        let err = engine
            .import_table(TableKind::Ledger, b"loanId,borrowerName\nPJM001,Alice\n")
            .unwrap_err();
        assert!(matches!(err, DomainError::Parse(_)));
        assert_eq!(engine.ledger(), &before);
    }
}
