//! Payment submission

use bigdecimal::BigDecimal;
use tracing::{info, warn};

use crate::records::parse_transaction;
use crate::traits::*;
use crate::types::*;
use crate::utils::{validate_payment_amount, validate_settlement};

/// Description recorded with a payment so later reconciliations link it to the fee
pub fn payment_description(fee_id: &FeeId) -> String {
    format!("Payment for Fee ID: {}", fee_id)
}

/// Payment manager for validating and recording payments
pub struct PaymentManager<B: FeeBackend> {
    backend: B,
}

impl<B: FeeBackend> PaymentManager<B> {
    /// Create a new payment manager
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Record a payment against a reconciled fee
    ///
    /// `fee` must reflect the ledger as it is now; the amount has to be
    /// positive and no more than what remains on the fee.
    pub async fn submit(
        &self,
        context: &ReconciliationContext,
        fee: &ReconciledFee,
        amount: BigDecimal,
    ) -> FeeResult<TransactionRecord> {
        validate_payment_amount(fee, &amount)?;
        self.record(context, fee, amount).await
    }

    /// Pay off a fee so that it reconciles as `Paid`
    ///
    /// See [`ReconciledFee::settlement_amount`] for the amount sent.
    pub async fn settle(
        &self,
        context: &ReconciliationContext,
        fee: &ReconciledFee,
    ) -> FeeResult<TransactionRecord> {
        let amount = validate_settlement(fee)?;
        self.record(context, fee, amount).await
    }

    async fn record(
        &self,
        context: &ReconciliationContext,
        fee: &ReconciledFee,
        amount: BigDecimal,
    ) -> FeeResult<TransactionRecord> {
        let request = NewTransaction {
            amount,
            user_id: context.student_id.clone(),
            description: payment_description(fee.fee_id()),
        };

        let created = match self.backend.create_transaction(&request).await {
            Ok(created) => created,
            Err(err) => {
                warn!(fee_id = %fee.fee_id(), error = %err, "payment rejected by backend");
                return Err(FeeError::Submission(err));
            }
        };

        let record = parse_transaction(&created, 0).map_err(|err| {
            warn!(fee_id = %fee.fee_id(), error = %err, "backend returned an unusable payment record");
            FeeError::Submission(BackendError::Decode(err.to_string()))
        })?;

        info!(
            fee_id = %fee.fee_id(),
            transaction_id = %record.transaction_id,
            amount = %record.amount,
            "payment recorded"
        );

        Ok(record)
    }
}
