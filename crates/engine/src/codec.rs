//! CSV codec for the two session tables.
//!
//! Export writes the canonical header (field names in declaration order)
//! followed by one line per record. Import matches columns by header name and
//! also understands the headers and status labels of legacy backups.

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};

use pinjam_core::{DomainError, DomainResult, ItemCode, LoanId};
use pinjam_inventory::Item;
use pinjam_ledger::{LoanRecord, LoanStatus};

/// Timestamp layout used in exported files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Which table an export/import targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Inventory,
    Ledger,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Inventory => "inventory",
            TableKind::Ledger => "ledger",
        }
    }

    /// File name the presentation layer offers by default.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            TableKind::Inventory => "inventory.csv",
            TableKind::Ledger => "peminjaman.csv",
        }
    }

    fn columns(&self) -> &'static [Column] {
        match self {
            TableKind::Inventory => INVENTORY_COLUMNS,
            TableKind::Ledger => LEDGER_COLUMNS,
        }
    }
}

impl core::fmt::Display for TableKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TableKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inventory" | "items" => Ok(TableKind::Inventory),
            "ledger" | "loans" | "peminjaman" => Ok(TableKind::Ledger),
            other => Err(DomainError::validation(format!(
                "unknown table '{other}' (expected inventory or ledger)"
            ))),
        }
    }
}

/// A column: canonical header plus the header a legacy backup used.
struct Column {
    name: &'static str,
    legacy: &'static str,
}

const INVENTORY_COLUMNS: &[Column] = &[
    Column { name: "code", legacy: "Kode Barang" },
    Column { name: "name", legacy: "Nama Barang" },
    Column { name: "stock", legacy: "Stok" },
];

const LEDGER_COLUMNS: &[Column] = &[
    Column { name: "loanId", legacy: "ID Pinjam" },
    Column { name: "borrowerName", legacy: "Nama Peminjam" },
    Column { name: "itemCode", legacy: "Kode Barang" },
    Column { name: "itemName", legacy: "Nama Barang" },
    Column { name: "quantity", legacy: "Jumlah" },
    Column { name: "borrowedAt", legacy: "Tanggal Pinjam" },
    Column { name: "status", legacy: "Status" },
];

#[derive(Debug, Serialize, Deserialize)]
struct ItemRow {
    #[serde(alias = "Kode Barang")]
    code: String,
    #[serde(alias = "Nama Barang")]
    name: String,
    #[serde(alias = "Stok")]
    stock: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoanRow {
    #[serde(alias = "ID Pinjam")]
    loan_id: String,
    #[serde(alias = "Nama Peminjam")]
    borrower_name: String,
    #[serde(alias = "Kode Barang")]
    item_code: String,
    #[serde(alias = "Nama Barang")]
    item_name: String,
    #[serde(alias = "Jumlah")]
    quantity: u32,
    #[serde(alias = "Tanggal Pinjam", with = "minute_timestamp")]
    borrowed_at: NaiveDateTime,
    #[serde(alias = "Status")]
    status: LoanStatus,
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        Self {
            code: item.code().to_string(),
            name: item.name().to_string(),
            stock: item.stock(),
        }
    }
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item::new(ItemCode::new(row.code), row.name, row.stock)
    }
}

impl From<&LoanRecord> for LoanRow {
    fn from(record: &LoanRecord) -> Self {
        Self {
            loan_id: record.loan_id().to_string(),
            borrower_name: record.borrower_name().to_string(),
            item_code: record.item_code().to_string(),
            item_name: record.item_name().to_string(),
            quantity: record.quantity(),
            borrowed_at: record.borrowed_at(),
            status: record.status(),
        }
    }
}

impl From<LoanRow> for LoanRecord {
    fn from(row: LoanRow) -> Self {
        LoanRecord::restore(
            LoanId::new(row.loan_id),
            row.borrower_name,
            ItemCode::new(row.item_code),
            row.item_name,
            row.quantity,
            row.borrowed_at,
            row.status,
        )
    }
}

mod minute_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(at: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&at.format(TIMESTAMP_FORMAT))
    }

    /// Accepts `YYYY-MM-DD HH:MM`, and `YYYY-MM-DD HH:MM:SS` from hand-edited files.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
    }
}

pub fn encode_inventory<'a>(items: impl IntoIterator<Item = &'a Item>) -> DomainResult<Vec<u8>> {
    encode(TableKind::Inventory, items.into_iter().map(ItemRow::from))
}

pub fn encode_ledger<'a>(records: impl IntoIterator<Item = &'a LoanRecord>) -> DomainResult<Vec<u8>> {
    encode(TableKind::Ledger, records.into_iter().map(LoanRow::from))
}

pub fn decode_inventory(bytes: &[u8]) -> DomainResult<Vec<Item>> {
    decode::<ItemRow>(TableKind::Inventory, bytes).map(|rows| rows.into_iter().map(Item::from).collect())
}

pub fn decode_ledger(bytes: &[u8]) -> DomainResult<Vec<LoanRecord>> {
    decode::<LoanRow>(TableKind::Ledger, bytes)
        .map(|rows| rows.into_iter().map(LoanRecord::from).collect())
}

/// Header line first, even for an empty table.
fn encode<R: Serialize>(kind: TableKind, rows: impl Iterator<Item = R>) -> DomainResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());

    writer
        .write_record(kind.columns().iter().map(|c| c.name))
        .map_err(|e| DomainError::encode(format!("{kind} header: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| DomainError::encode(format!("{kind} row: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| DomainError::encode(format!("{kind} flush: {}", e.error())))
}

/// All-or-nothing: the first bad row fails the whole table.
fn decode<R: for<'de> Deserialize<'de>>(kind: TableKind, bytes: &[u8]) -> DomainResult<Vec<R>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| DomainError::parse(format!("{kind} header: {e}")))?
        .clone();
    require_columns(kind, &headers)?;

    reader
        .deserialize::<R>()
        .map(|row| row.map_err(|e| DomainError::parse(format!("{kind}: {e}"))))
        .collect()
}

fn require_columns(kind: TableKind, headers: &StringRecord) -> DomainResult<()> {
    let missing: Vec<&str> = kind
        .columns()
        .iter()
        .filter(|c| !headers.iter().any(|h| h == c.name || h == c.legacy))
        .map(|c| c.name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DomainError::parse(format!(
            "{kind}: missing column(s) {}",
            missing.join(", ")
        )))
    }
}
