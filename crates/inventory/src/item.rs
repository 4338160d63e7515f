use pinjam_core::{DomainError, DomainResult, Entity, ItemCode, KeyedTable};

/// A distinct inventory good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    code: ItemCode,
    name: String,
    stock: u32,
}

impl Item {
    pub fn new(code: impl Into<ItemCode>, name: impl Into<String>, stock: u32) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            stock,
        }
    }

    pub fn code(&self) -> &ItemCode {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units currently on the shelf.
    pub fn stock(&self) -> u32 {
        self.stock
    }
}

impl Entity for Item {
    type Id = ItemCode;

    fn id(&self) -> &Self::Id {
        &self.code
    }
}

/// Items known to the session, keyed by code, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryStore {
    items: KeyedTable<Item>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stock every session starts with unless a seed file is configured.
    pub fn seeded() -> Self {
        Self {
            items: KeyedTable::from_records(vec![
                Item::new("SDS001", "Laptop", 1),
                Item::new("SDS002", "Mouse", 1),
            ])
            .unwrap_or_default(),
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = Item>) -> DomainResult<Self> {
        Ok(Self {
            items: KeyedTable::from_records(items)?,
        })
    }

    pub fn find_by_code(&self, code: &ItemCode) -> DomainResult<&Item> {
        self.items
            .get(code)
            .ok_or_else(|| DomainError::not_found(format!("item {code}")))
    }

    /// Apply a signed stock delta to one item.
    ///
    /// Rejects (and leaves the item untouched) if the result would be
    /// negative or would not fit the stock counter.
    pub fn adjust_stock(&mut self, code: &ItemCode, delta: i64) -> DomainResult<&Item> {
        let item = self
            .items
            .get_mut(code)
            .ok_or_else(|| DomainError::not_found(format!("item {code}")))?;

        let new_stock = i64::from(item.stock) + delta;
        if new_stock < 0 {
            return Err(DomainError::invariant("stock cannot go negative"));
        }
        item.stock = u32::try_from(new_stock)
            .map_err(|_| DomainError::invariant(format!("stock overflow for item {code}")))?;

        Ok(item)
    }

    /// Replace every item (restore). Duplicate codes are rejected.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = Item>) -> DomainResult<()> {
        self.items.replace_all(items)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn code(s: &str) -> ItemCode {
        ItemCode::new(s)
    }

    #[test]
    fn seeded_store_has_laptop_and_mouse() {
        let store = InventoryStore::seeded();
        let names: Vec<_> = store.items().map(|i| (i.code().as_str(), i.name(), i.stock())).collect();
        assert_eq!(names, vec![("SDS001", "Laptop", 1), ("SDS002", "Mouse", 1)]);
    }

    #[test]
    fn find_unknown_code_is_not_found() {
        let store = InventoryStore::seeded();
        let err = store.find_by_code(&code("XYZ")).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn adjust_stock_mutates_only_the_matching_item() {
        let mut store = InventoryStore::seeded();
        let item = store.adjust_stock(&code("SDS001"), 4).unwrap();
        assert_eq!(item.stock(), 5);
        assert_eq!(store.find_by_code(&code("SDS002")).unwrap().stock(), 1);
    }

    #[test]
    fn adjust_stock_below_zero_is_rejected() {
        let mut store = InventoryStore::seeded();
        let err = store.adjust_stock(&code("SDS001"), -2).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("negative") => {}
            other => panic!("expected negative stock violation, got {other:?}"),
        }
        assert_eq!(store.find_by_code(&code("SDS001")).unwrap().stock(), 1);
    }

    #[test]
    fn adjust_stock_overflow_is_rejected() {
        let mut store = InventoryStore::from_items(vec![Item::new("A", "a", u32::MAX)]).unwrap();
        assert!(store.adjust_stock(&code("A"), 1).is_err());
        assert_eq!(store.find_by_code(&code("A")).unwrap().stock(), u32::MAX);
    }

    #[test]
    fn replace_all_swaps_contents() {
        let mut store = InventoryStore::seeded();
        store
            .replace_all(vec![Item::new("K1", "Kabel", 7)])
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.find_by_code(&code("SDS001")).is_err());
        assert_eq!(store.find_by_code(&code("K1")).unwrap().stock(), 7);
    }

    proptest! {
        /// Property: stock never goes negative whatever deltas are applied.
        #[test]
        fn stock_never_negative(deltas in prop::collection::vec(-5i64..5i64, 0..50)) {
            let mut store = InventoryStore::from_items(vec![Item::new("A", "a", 3)]).unwrap();
            let mut expected: i64 = 3;
            for delta in deltas {
                if store.adjust_stock(&code("A"), delta).is_ok() {
                    expected += delta;
                }
                prop_assert!(expected >= 0);
                prop_assert_eq!(i64::from(store.find_by_code(&code("A")).unwrap().stock()), expected);
            }
        }
    }
}
