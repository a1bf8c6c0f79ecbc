//! Voucher code pool and reservation logic

use crate::storage::{self, StorageError};
use crate::utils::time::now_millis;
use crate::utils::validation::MAX_CODE_LEN;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::{VoucherCode, VoucherStatus};
use shared::response::{ImportReport, InventorySummary};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for codes: key = (product_id, sequence), value = JSON-serialized VoucherCode
const CODES_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("codes");

/// Table for duplicate detection: key = (product_id, code string), value = sequence
const CODE_INDEX_TABLE: TableDefinition<(&str, &str), u64> = TableDefinition::new("code_index");

/// Table for admin lookups: key = code id, value = JSON (product_id, sequence)
const ID_INDEX_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("id_index");

/// Table for per-product import sequence: key = product_id, value = last sequence
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Vault errors
#[derive(Debug, Error)]
pub enum VaultError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: usize,
    },

    #[error("voucher code not found: {0}")]
    NotFound(String),

    #[error("voucher code {id} cannot leave status {from:?}")]
    IllegalStatus { id: String, from: VoucherStatus },

    #[error("code line is too long ({length} chars, max {max})")]
    CodeTooLong { length: usize, max: usize },
}

pub type VaultResult<T> = Result<T, VaultError>;

/// The inventory vault
#[derive(Clone)]
pub struct VoucherVault {
    db: Arc<Database>,
}

impl VoucherVault {
    /// Open or create the vault database at the given path
    pub fn open(path: impl AsRef<Path>) -> VaultResult<Self> {
        let db = storage::open_database(path)?;
        Self::init(db)
    }

    /// Open an in-memory vault (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> VaultResult<Self> {
        let db = storage::open_in_memory()?;
        Self::init(db)
    }

    fn init(db: Database) -> VaultResult<Self> {
        let write_txn = db.begin_write().map_err(StorageError::from)?;
        {
            let _ = write_txn.open_table(CODES_TABLE).map_err(StorageError::from)?;
            let _ = write_txn
                .open_table(CODE_INDEX_TABLE)
                .map_err(StorageError::from)?;
            let _ = write_txn
                .open_table(ID_INDEX_TABLE)
                .map_err(StorageError::from)?;
            let _ = write_txn
                .open_table(COUNTERS_TABLE)
                .map_err(StorageError::from)?;
        }
        write_txn.commit().map_err(StorageError::from)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Bulk-import raw codes for a product
    ///
    /// Each candidate is trimmed; blank lines are ignored. Codes already
    /// present for the product (or repeated within the batch) are counted
    /// as duplicates, never treated as errors, so re-importing the same
    /// list is idempotent. A line over [`MAX_CODE_LEN`] rejects the whole
    /// batch before anything is written.
    pub fn import(&self, product_id: &str, raw_codes: &str) -> VaultResult<ImportReport> {
        for line in raw_codes.lines() {
            let code = line.trim();
            if code.len() > MAX_CODE_LEN {
                return Err(VaultError::CodeTooLong {
                    length: code.len(),
                    max: MAX_CODE_LEN,
                });
            }
        }

        let mut report = ImportReport {
            added_count: 0,
            duplicate_count: 0,
        };
        let now = now_millis();

        let txn = self.db.begin_write().map_err(StorageError::from)?;
        {
            let mut codes_table = txn.open_table(CODES_TABLE).map_err(StorageError::from)?;
            let mut index_table = txn
                .open_table(CODE_INDEX_TABLE)
                .map_err(StorageError::from)?;
            let mut id_table = txn.open_table(ID_INDEX_TABLE).map_err(StorageError::from)?;
            let mut counters = txn.open_table(COUNTERS_TABLE).map_err(StorageError::from)?;

            let mut sequence = counters
                .get(product_id)
                .map_err(StorageError::from)?
                .map(|g| g.value())
                .unwrap_or(0);
            let mut seen_in_batch: HashSet<String> = HashSet::new();

            for line in raw_codes.lines() {
                let code = line.trim();
                if code.is_empty() {
                    continue;
                }

                let already_present = index_table
                    .get((product_id, code))
                    .map_err(StorageError::from)?
                    .is_some();
                if already_present || !seen_in_batch.insert(code.to_string()) {
                    report.duplicate_count += 1;
                    continue;
                }

                sequence += 1;
                let voucher = VoucherCode {
                    id: uuid::Uuid::new_v4().to_string(),
                    product_id: product_id.to_string(),
                    code: code.to_string(),
                    status: VoucherStatus::Available,
                    sequence,
                    imported_at: now,
                    order_id: None,
                };

                let value = serde_json::to_vec(&voucher).map_err(StorageError::from)?;
                codes_table
                    .insert((product_id, sequence), value.as_slice())
                    .map_err(StorageError::from)?;
                index_table
                    .insert((product_id, code), sequence)
                    .map_err(StorageError::from)?;
                let locator = serde_json::to_vec(&(product_id, sequence))
                    .map_err(StorageError::from)?;
                id_table
                    .insert(voucher.id.as_str(), locator.as_slice())
                    .map_err(StorageError::from)?;
                report.added_count += 1;
            }

            counters
                .insert(product_id, sequence)
                .map_err(StorageError::from)?;
        }
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            product_id = %product_id,
            added = report.added_count,
            duplicates = report.duplicate_count,
            "Voucher codes imported"
        );
        Ok(report)
    }

    /// Atomically reserve `quantity` Available codes for one product
    ///
    /// Codes are taken in ascending import-sequence order, so allocation
    /// is deterministic. All-or-nothing: on `InsufficientStock` the
    /// transaction is aborted and no code changes status.
    pub fn reserve(&self, product_id: &str, quantity: u32) -> VaultResult<Vec<VoucherCode>> {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        let reserved = {
            let mut codes_table = txn.open_table(CODES_TABLE).map_err(StorageError::from)?;

            let mut available: Vec<VoucherCode> = Vec::new();
            let range_start = (product_id, 0u64);
            let range_end = (product_id, u64::MAX);
            for result in codes_table
                .range(range_start..=range_end)
                .map_err(StorageError::from)?
            {
                let (_key, value) = result.map_err(StorageError::from)?;
                let code: VoucherCode =
                    serde_json::from_slice(value.value()).map_err(StorageError::from)?;
                if code.status == VoucherStatus::Available {
                    available.push(code);
                }
            }

            if available.len() < quantity as usize {
                // Dropping the transaction without commit leaves the pool untouched
                return Err(VaultError::InsufficientStock {
                    product_id: product_id.to_string(),
                    requested: quantity,
                    available: available.len(),
                });
            }

            let mut reserved = Vec::with_capacity(quantity as usize);
            for mut code in available.into_iter().take(quantity as usize) {
                code.status = VoucherStatus::Reserved;
                let value = serde_json::to_vec(&code).map_err(StorageError::from)?;
                codes_table
                    .insert((product_id, code.sequence), value.as_slice())
                    .map_err(StorageError::from)?;
                reserved.push(code);
            }
            reserved
        };
        txn.commit().map_err(StorageError::from)?;

        tracing::debug!(
            product_id = %product_id,
            count = reserved.len(),
            "Voucher codes reserved"
        );
        Ok(reserved)
    }

    /// Flip previously reserved codes to Used and stamp the owning order
    pub fn mark_used(
        &self,
        product_id: &str,
        sequences: &[u64],
        order_id: &str,
    ) -> VaultResult<()> {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        {
            let mut codes_table = txn.open_table(CODES_TABLE).map_err(StorageError::from)?;
            for &seq in sequences {
                let mut code = match codes_table
                    .get((product_id, seq))
                    .map_err(StorageError::from)?
                {
                    Some(guard) => serde_json::from_slice::<VoucherCode>(guard.value())
                        .map_err(StorageError::from)?,
                    None => return Err(VaultError::NotFound(format!("{product_id}/{seq}"))),
                };
                if code.status != VoucherStatus::Reserved {
                    return Err(VaultError::IllegalStatus {
                        id: code.id,
                        from: code.status,
                    });
                }
                code.status = VoucherStatus::Used;
                code.order_id = Some(order_id.to_string());
                let value = serde_json::to_vec(&code).map_err(StorageError::from)?;
                codes_table
                    .insert((product_id, seq), value.as_slice())
                    .map_err(StorageError::from)?;
            }
        }
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    /// Administratively expire a code (only from Available or Reserved)
    pub fn expire(&self, code_id: &str) -> VaultResult<VoucherCode> {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        let expired = {
            let id_table = txn.open_table(ID_INDEX_TABLE).map_err(StorageError::from)?;
            let (product_id, sequence): (String, u64) = match id_table
                .get(code_id)
                .map_err(StorageError::from)?
            {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(StorageError::from)?
                }
                None => return Err(VaultError::NotFound(code_id.to_string())),
            };
            drop(id_table);

            let mut codes_table = txn.open_table(CODES_TABLE).map_err(StorageError::from)?;
            let mut code = match codes_table
                .get((product_id.as_str(), sequence))
                .map_err(StorageError::from)?
            {
                Some(guard) => serde_json::from_slice::<VoucherCode>(guard.value())
                    .map_err(StorageError::from)?,
                None => return Err(VaultError::NotFound(code_id.to_string())),
            };

            if !code.status.can_become(VoucherStatus::Expired) {
                return Err(VaultError::IllegalStatus {
                    id: code.id,
                    from: code.status,
                });
            }
            code.status = VoucherStatus::Expired;
            let value = serde_json::to_vec(&code).map_err(StorageError::from)?;
            codes_table
                .insert((product_id.as_str(), sequence), value.as_slice())
                .map_err(StorageError::from)?;
            code
        };
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(code_id = %code_id, "Voucher code expired");
        Ok(expired)
    }

    /// Look up a single code by id (administrative)
    pub fn get(&self, code_id: &str) -> VaultResult<VoucherCode> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let id_table = read_txn
            .open_table(ID_INDEX_TABLE)
            .map_err(StorageError::from)?;
        let (product_id, sequence): (String, u64) =
            match id_table.get(code_id).map_err(StorageError::from)? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(StorageError::from)?
                }
                None => return Err(VaultError::NotFound(code_id.to_string())),
            };

        let codes_table = read_txn.open_table(CODES_TABLE).map_err(StorageError::from)?;
        match codes_table
            .get((product_id.as_str(), sequence))
            .map_err(StorageError::from)?
        {
            Some(guard) => {
                Ok(serde_json::from_slice(guard.value()).map_err(StorageError::from)?)
            }
            None => Err(VaultError::NotFound(code_id.to_string())),
        }
    }

    /// Per-status counts for one product
    pub fn summary(&self, product_id: &str) -> VaultResult<InventorySummary> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let codes_table = read_txn.open_table(CODES_TABLE).map_err(StorageError::from)?;

        let mut summary = InventorySummary {
            product_id: product_id.to_string(),
            ..Default::default()
        };
        let range_start = (product_id, 0u64);
        let range_end = (product_id, u64::MAX);
        for result in codes_table
            .range(range_start..=range_end)
            .map_err(StorageError::from)?
        {
            let (_key, value) = result.map_err(StorageError::from)?;
            let code: VoucherCode =
                serde_json::from_slice(value.value()).map_err(StorageError::from)?;
            match code.status {
                VoucherStatus::Available => summary.available += 1,
                VoucherStatus::Reserved => summary.reserved += 1,
                VoucherStatus::Used => summary.used += 1,
                VoucherStatus::Expired => summary.expired += 1,
            }
        }
        Ok(summary)
    }

    /// Count of Available codes for one product
    pub fn available_count(&self, product_id: &str) -> VaultResult<usize> {
        Ok(self.summary(product_id)?.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: &str = "product-pte";

    fn vault_with_codes(codes: &str) -> VoucherVault {
        let vault = VoucherVault::open_in_memory().unwrap();
        vault.import(PRODUCT, codes).unwrap();
        vault
    }

    #[test]
    fn test_import_normalizes_and_counts() {
        let vault = VoucherVault::open_in_memory().unwrap();
        let report = vault
            .import(PRODUCT, "  PTE-001  \n\nPTE-002\nPTE-001\n")
            .unwrap();
        assert_eq!(report.added_count, 2);
        assert_eq!(report.duplicate_count, 1);
        assert_eq!(vault.available_count(PRODUCT).unwrap(), 2);
    }

    #[test]
    fn test_import_rejects_overlong_line_without_writing() {
        let vault = VoucherVault::open_in_memory().unwrap();
        let long_code = "X".repeat(MAX_CODE_LEN + 1);
        let batch = format!("PTE-001\n{long_code}\nPTE-002");
        let err = vault.import(PRODUCT, &batch).unwrap_err();
        assert!(matches!(
            err,
            VaultError::CodeTooLong { length, max }
                if length == MAX_CODE_LEN + 1 && max == MAX_CODE_LEN
        ));
        assert_eq!(vault.available_count(PRODUCT).unwrap(), 0);
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let vault = vault_with_codes("PTE-001\nPTE-002\nPTE-003");
        let report = vault.import(PRODUCT, "PTE-001\nPTE-002\nPTE-003").unwrap();
        assert_eq!(report.added_count, 0);
        assert_eq!(report.duplicate_count, 3);
        assert_eq!(vault.available_count(PRODUCT).unwrap(), 3);
    }

    #[test]
    fn test_reserve_takes_import_order() {
        let vault = vault_with_codes("PTE-001\nPTE-002\nPTE-003");
        let reserved = vault.reserve(PRODUCT, 2).unwrap();
        let codes: Vec<&str> = reserved.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["PTE-001", "PTE-002"]);
        assert_eq!(vault.available_count(PRODUCT).unwrap(), 1);
    }

    #[test]
    fn test_reserve_all_or_nothing() {
        let vault = vault_with_codes("PTE-001\nPTE-002");
        let err = vault.reserve(PRODUCT, 3).unwrap_err();
        match err {
            VaultError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Nothing changed status
        assert_eq!(vault.available_count(PRODUCT).unwrap(), 2);
    }

    #[test]
    fn test_reserve_other_product_unaffected() {
        let vault = vault_with_codes("PTE-001\nPTE-002");
        vault.import("product-ielts", "IELTS-001").unwrap();

        vault.reserve(PRODUCT, 2).unwrap();
        assert_eq!(vault.available_count("product-ielts").unwrap(), 1);
    }

    #[test]
    fn test_mark_used_stamps_order() {
        let vault = vault_with_codes("PTE-001\nPTE-002");
        let reserved = vault.reserve(PRODUCT, 1).unwrap();
        let seqs: Vec<u64> = reserved.iter().map(|c| c.sequence).collect();
        vault.mark_used(PRODUCT, &seqs, "EDU2026082910001").unwrap();

        let summary = vault.summary(PRODUCT).unwrap();
        assert_eq!(summary.used, 1);
        assert_eq!(summary.available, 1);

        let code = vault.get(&reserved[0].id).unwrap();
        assert_eq!(code.status, VoucherStatus::Used);
        assert_eq!(code.order_id.as_deref(), Some("EDU2026082910001"));
    }

    #[test]
    fn test_expire_respects_monotonic_statuses() {
        let vault = vault_with_codes("PTE-001\nPTE-002");
        let reserved = vault.reserve(PRODUCT, 1).unwrap();
        let seqs: Vec<u64> = reserved.iter().map(|c| c.sequence).collect();
        vault.mark_used(PRODUCT, &seqs, "EDU1").unwrap();

        // Used codes never expire
        assert!(matches!(
            vault.expire(&reserved[0].id),
            Err(VaultError::IllegalStatus { .. })
        ));

        // Available codes do
        let summary_before = vault.summary(PRODUCT).unwrap();
        assert_eq!(summary_before.available, 1);
        let remaining = vault.reserve(PRODUCT, 1).unwrap();
        let expired = vault.expire(&remaining[0].id).unwrap();
        assert_eq!(expired.status, VoucherStatus::Expired);
    }

    #[test]
    fn test_concurrent_reserves_never_overlap() {
        // 10 codes, 8 threads each wanting 2: at most 5 can win
        let mut lines = String::new();
        for i in 0..10 {
            lines.push_str(&format!("PTE-{i:03}\n"));
        }
        let vault = std::sync::Arc::new(vault_with_codes(&lines));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let vault = vault.clone();
            handles.push(std::thread::spawn(move || vault.reserve(PRODUCT, 2)));
        }

        let mut handed_out: Vec<String> = Vec::new();
        let mut winners = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(codes) => {
                    winners += 1;
                    handed_out.extend(codes.into_iter().map(|c| c.code));
                }
                Err(VaultError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(winners, 5);
        assert_eq!(handed_out.len(), 10);
        let unique: HashSet<&String> = handed_out.iter().collect();
        assert_eq!(unique.len(), 10, "a code was handed out twice");
        assert_eq!(vault.available_count(PRODUCT).unwrap(), 0);
    }
}
