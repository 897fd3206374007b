//! Alternative transaction-to-fee linking rules

use crate::traits::FeeLinker;
use crate::types::*;

/// Links a transaction when its description contains the fee id as a whole token
///
/// Tokens are runs of alphanumerics, `-` and `_`, so fee id "1" matches
/// "Fee ID: 1" but not "Fee ID: 10".
pub struct ReferenceTokenLinker;

impl FeeLinker for ReferenceTokenLinker {
    fn is_linked(&self, fee_id: &FeeId, transaction: &TransactionRecord) -> bool {
        let fee_id = fee_id.as_str();
        !fee_id.is_empty()
            && transaction
                .description
                .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
                .any(|token| token == fee_id)
    }
}
