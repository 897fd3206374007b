//! Traits for backend abstraction and extensibility

use async_trait::async_trait;
use serde_json::Value;

use crate::types::*;

/// Access to the school REST backend that owns fees and transactions
///
/// Records are returned as loosely typed JSON; turning them into typed
/// records is the job of [`crate::records`], so a single malformed record
/// never fails a whole listing.
#[async_trait]
pub trait FeeBackend: Send + Sync {
    /// List the fee obligations of a student (`GET /fees?studentId=<id>`)
    async fn list_fees(&self, student_id: &StudentId) -> Result<Vec<Value>, BackendError>;

    /// List the transaction ledger of a session (`GET /transactions?sessionId=<id>`)
    async fn list_transactions(&self, session_id: &SessionId) -> Result<Vec<Value>, BackendError>;

    /// Record a new payment (`POST /transactions`) and return the created record
    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<Value, BackendError>;

    /// Fetch a student's profile, `None` if the student is unknown
    async fn get_student(&self, student_id: &StudentId) -> Result<Option<Value>, BackendError>;
}

/// Rule deciding whether a ledger transaction is attributed to a fee obligation
pub trait FeeLinker: Send + Sync {
    fn is_linked(&self, fee_id: &FeeId, transaction: &TransactionRecord) -> bool;
}

/// Default linking rule: the description contains the fee id as a substring
///
/// Note that fee id "1" also matches a description mentioning "10".
pub struct DescriptionContainsLinker;

impl FeeLinker for DescriptionContainsLinker {
    fn is_linked(&self, fee_id: &FeeId, transaction: &TransactionRecord) -> bool {
        !fee_id.as_str().is_empty() && transaction.description.contains(fee_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn txn(description: &str) -> TransactionRecord {
        TransactionRecord::new(
            "t1",
            "7",
            BigDecimal::from(100),
            TransactionStatus::Success,
            description,
        )
    }

    #[test]
    fn test_description_contains_linker() {
        let linker = DescriptionContainsLinker;
        assert!(linker.is_linked(&FeeId::from("1"), &txn("Payment for Fee ID: 1")));
        assert!(!linker.is_linked(&FeeId::from("2"), &txn("Payment for Fee ID: 1")));
        assert!(!linker.is_linked(&FeeId::from("1"), &txn("general payment")));
    }

    #[test]
    fn test_description_contains_linker_matches_longer_ids() {
        // substring semantics are kept as-is
        let linker = DescriptionContainsLinker;
        assert!(linker.is_linked(&FeeId::from("1"), &txn("Payment for Fee ID: 10")));
    }
}
