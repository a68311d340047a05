//! Per-account billing address ledger.
//!
//! The ledger is the only code path that decides which address is the
//! default. Its invariant: when the ledger is non-empty exactly one address
//! has `is_default` set, and the first address ever added starts as the
//! default. Every mutating method either upholds the invariant or returns an
//! error without touching the addresses.
//!
//! Data loaded from a store is accepted as-is through
//! [`BillingLedger::from_stored`]; if it violates the invariant,
//! [`BillingLedger::effective_default`] still picks a single address.

use serde::{Deserialize, Serialize};

use crate::types::{AddressId, AddressKey, BillingAddress, NewAddress};

/// Errors returned by ledger operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The key does not identify an address in this ledger.
    #[error("address not found: {0}")]
    AddressNotFound(AddressKey),
}

/// Ordered collection of an account's billing addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillingLedger {
    addresses: Vec<BillingAddress>,
}

impl BillingLedger {
    /// Create an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            addresses: Vec::new(),
        }
    }

    /// Wrap addresses read back from a store without normalizing them.
    #[must_use]
    pub const fn from_stored(addresses: Vec<BillingAddress>) -> Self {
        Self { addresses }
    }

    /// Append an address and return its position.
    ///
    /// The address becomes the default if and only if the ledger was empty.
    pub fn add(&mut self, candidate: NewAddress) -> usize {
        let is_default = self.addresses.is_empty();
        self.addresses.push(BillingAddress {
            id: AddressId::generate(),
            street: candidate.street,
            city: candidate.city,
            state: candidate.state,
            zip_code: candidate.zip_code,
            country: candidate.country,
            is_default,
        });
        self.addresses.len() - 1
    }

    /// Make the addressed entry the only default.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AddressNotFound` if `key` matches nothing; the
    /// ledger is left unchanged in that case.
    pub fn set_default(&mut self, key: AddressKey) -> Result<(), LedgerError> {
        let target = self
            .position_of(key)
            .ok_or(LedgerError::AddressNotFound(key))?;

        for (index, address) in self.addresses.iter_mut().enumerate() {
            address.is_default = index == target;
        }
        Ok(())
    }

    /// Replace the content of the addressed entry.
    ///
    /// The entry keeps its identifier, position and default flag.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AddressNotFound` if `key` matches nothing.
    pub fn replace(
        &mut self,
        key: AddressKey,
        content: NewAddress,
    ) -> Result<&BillingAddress, LedgerError> {
        let address = self
            .position_of(key)
            .and_then(|index| self.addresses.get_mut(index))
            .ok_or(LedgerError::AddressNotFound(key))?;

        address.street = content.street;
        address.city = content.city;
        address.state = content.state;
        address.zip_code = content.zip_code;
        address.country = content.country;
        Ok(address)
    }

    /// The address to use when none is chosen explicitly.
    ///
    /// Falls back to the first address if no entry is flagged default.
    #[must_use]
    pub fn effective_default(&self) -> Option<&BillingAddress> {
        self.addresses
            .iter()
            .find(|address| address.is_default)
            .or_else(|| self.addresses.first())
    }

    /// Resolve a key to a position.
    #[must_use]
    pub fn position_of(&self, key: AddressKey) -> Option<usize> {
        match key {
            AddressKey::Position(index) => (index < self.addresses.len()).then_some(index),
            AddressKey::Id(id) => self.addresses.iter().position(|a| a.id == id),
        }
    }

    /// Look up an address by key.
    #[must_use]
    pub fn get(&self, key: AddressKey) -> Option<&BillingAddress> {
        self.position_of(key)
            .and_then(|index| self.addresses.get(index))
    }

    /// All addresses in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[BillingAddress] {
        &self.addresses
    }

    /// Number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether the ledger holds no addresses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Number of entries flagged default. Always 0 or 1 unless the stored
    /// data was already inconsistent.
    #[must_use]
    pub fn default_count(&self) -> usize {
        self.addresses.iter().filter(|a| a.is_default).count()
    }
}

impl From<BillingLedger> for Vec<BillingAddress> {
    fn from(ledger: BillingLedger) -> Self {
        ledger.addresses
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn address(street: &str) -> NewAddress {
        NewAddress {
            street: street.to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            country: "USA".to_string(),
        }
    }

    fn defaults(ledger: &BillingLedger) -> Vec<bool> {
        ledger.as_slice().iter().map(|a| a.is_default).collect()
    }

    #[test]
    fn test_first_address_becomes_default() {
        let mut ledger = BillingLedger::new();
        assert_eq!(ledger.add(address("1 Main St")), 0);
        assert_eq!(defaults(&ledger), vec![true]);

        assert_eq!(ledger.add(address("2 Elm St")), 1);
        assert_eq!(defaults(&ledger), vec![true, false]);
    }

    #[test]
    fn test_set_default_by_position() {
        let mut ledger = BillingLedger::new();
        ledger.add(address("1 Main St"));
        ledger.add(address("2 Elm St"));

        ledger.set_default(AddressKey::Position(1)).unwrap();
        assert_eq!(defaults(&ledger), vec![false, true]);
    }

    #[test]
    fn test_set_default_by_id() {
        let mut ledger = BillingLedger::new();
        ledger.add(address("1 Main St"));
        ledger.add(address("2 Elm St"));
        ledger.add(address("3 Oak St"));
        let id = ledger.as_slice()[2].id;

        ledger.set_default(AddressKey::Id(id)).unwrap();
        assert_eq!(defaults(&ledger), vec![false, false, true]);
    }

    #[test]
    fn test_set_default_missing_key_leaves_ledger_unchanged() {
        let mut ledger = BillingLedger::new();
        ledger.add(address("1 Main St"));
        ledger.add(address("2 Elm St"));
        let before = ledger.clone();

        let err = ledger.set_default(AddressKey::Position(2)).unwrap_err();
        assert_eq!(err, LedgerError::AddressNotFound(AddressKey::Position(2)));
        assert_eq!(ledger, before);

        let missing = AddressKey::Id(AddressId::generate());
        assert!(ledger.set_default(missing).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_set_default_on_empty_ledger() {
        let mut ledger = BillingLedger::new();
        assert!(ledger.set_default(AddressKey::Position(0)).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_replace_keeps_identity_and_default() {
        let mut ledger = BillingLedger::new();
        ledger.add(address("1 Main St"));
        let id = ledger.as_slice()[0].id;

        let replaced = ledger
            .replace(AddressKey::Position(0), address("9 Pine St"))
            .unwrap();
        assert_eq!(replaced.street, "9 Pine St");
        assert_eq!(replaced.id, id);
        assert!(replaced.is_default);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_replace_missing_key() {
        let mut ledger = BillingLedger::new();
        assert!(matches!(
            ledger.replace(AddressKey::Position(0), address("1 Main St")),
            Err(LedgerError::AddressNotFound(_))
        ));
    }

    #[test]
    fn test_effective_default() {
        let mut ledger = BillingLedger::new();
        assert!(ledger.effective_default().is_none());

        ledger.add(address("1 Main St"));
        ledger.add(address("2 Elm St"));
        ledger.set_default(AddressKey::Position(1)).unwrap();
        assert_eq!(ledger.effective_default().unwrap().street, "2 Elm St");
    }

    #[test]
    fn test_effective_default_tolerates_missing_flag() {
        let mut stored = BillingLedger::new();
        stored.add(address("1 Main St"));
        stored.add(address("2 Elm St"));
        let mut addresses: Vec<BillingAddress> = stored.into();
        for a in &mut addresses {
            a.is_default = false;
        }

        let ledger = BillingLedger::from_stored(addresses);
        assert_eq!(ledger.default_count(), 0);
        assert_eq!(ledger.effective_default().unwrap().street, "1 Main St");
    }

    #[test]
    fn test_set_default_repairs_multiple_defaults() {
        let mut stored = BillingLedger::new();
        stored.add(address("1 Main St"));
        stored.add(address("2 Elm St"));
        let mut addresses: Vec<BillingAddress> = stored.into();
        for a in &mut addresses {
            a.is_default = true;
        }

        let mut ledger = BillingLedger::from_stored(addresses);
        ledger.set_default(AddressKey::Position(1)).unwrap();
        assert_eq!(defaults(&ledger), vec![false, true]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut ledger = BillingLedger::new();
        ledger.add(address("1 Main St"));
        let json = serde_json::to_value(&ledger).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["isDefault"], true);
        assert_eq!(json[0]["zipCode"], "62701");
    }

    #[test]
    fn test_ids_survive_repeated_loads() {
        let mut ledger = BillingLedger::new();
        ledger.add(address("1 Main St"));
        ledger.add(address("2 Main St"));
        let stored = serde_json::to_string(&ledger).unwrap();

        let first: BillingLedger = serde_json::from_str(&stored).unwrap();
        let mut second: BillingLedger = serde_json::from_str(&stored).unwrap();
        let id = first.addresses[1].id;

        second.set_default(AddressKey::Id(id)).unwrap();
        assert_eq!(defaults(&second), vec![false, true]);
        assert_eq!(first, ledger);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        SetDefault(usize),
        SetDefaultUnknownId,
        Replace(usize),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Add),
            3 => (0usize..12).prop_map(Op::SetDefault),
            1 => Just(Op::SetDefaultUnknownId),
            1 => (0usize..12).prop_map(Op::Replace),
        ]
    }

    proptest! {
        /// Adding only ever leaves the first address as the default.
        #[test]
        fn prop_adds_keep_first_default(count in 1usize..20) {
            let mut ledger = BillingLedger::new();
            for i in 0..count {
                ledger.add(address(&format!("{i} Main St")));
            }
            prop_assert_eq!(ledger.default_count(), 1);
            prop_assert!(ledger.as_slice()[0].is_default);
        }

        /// Any mix of operations keeps exactly one default once non-empty,
        /// and a successful set_default always lands on its target.
        #[test]
        fn prop_single_default_invariant(ops in proptest::collection::vec(arb_op(), 0..40)) {
            let mut ledger = BillingLedger::new();
            for op in ops {
                match op {
                    Op::Add => {
                        ledger.add(address("1 Main St"));
                    }
                    Op::SetDefault(index) => {
                        let before = ledger.clone();
                        match ledger.set_default(AddressKey::Position(index)) {
                            Ok(()) => {
                                prop_assert!(ledger.as_slice()[index].is_default);
                            }
                            Err(_) => {
                                prop_assert!(index >= ledger.len());
                                prop_assert_eq!(&ledger, &before);
                            }
                        }
                    }
                    Op::SetDefaultUnknownId => {
                        let before = ledger.clone();
                        let key = AddressKey::Id(AddressId::generate());
                        prop_assert!(ledger.set_default(key).is_err());
                        prop_assert_eq!(&ledger, &before);
                    }
                    Op::Replace(index) => {
                        let _ = ledger.replace(AddressKey::Position(index), address("9 Pine St"));
                    }
                }

                let expected = usize::from(!ledger.is_empty());
                prop_assert_eq!(ledger.default_count(), expected);
            }
        }
    }
}
