//! Main fee desk that coordinates statements and payments

use bigdecimal::BigDecimal;

use crate::desk::{PaymentManager, StatementLoader};
use crate::reconciliation::ReconciliationEngine;
use crate::traits::*;
use crate::types::*;
use crate::utils::validate_positive_amount;

/// Entry point for the fee screens: load statements, take payments
pub struct FeeDesk<B: FeeBackend> {
    statements: StatementLoader<B>,
    payments: PaymentManager<B>,
}

impl<B: FeeBackend + Clone> FeeDesk<B> {
    /// Create a fee desk over the given backend
    pub fn new(backend: B) -> Self {
        Self::with_engine(backend, ReconciliationEngine::new())
    }

    /// Create a fee desk with a custom reconciliation engine
    pub fn with_engine(backend: B, engine: ReconciliationEngine) -> Self {
        Self {
            statements: StatementLoader::with_engine(backend.clone(), engine),
            payments: PaymentManager::new(backend),
        }
    }

    /// Load the reconciled fee statement for a student in a session
    pub async fn load_statement(&self, context: &ReconciliationContext) -> FeeResult<FeeStatement> {
        self.statements.load(context).await
    }

    /// Reconcile already-fetched records with this desk's engine
    pub fn reconcile(
        &self,
        fees: &[FeeObligation],
        transactions: &[TransactionRecord],
    ) -> Reconciliation {
        self.statements.engine().reconcile(fees, transactions)
    }

    /// Pay `amount` towards a fee
    ///
    /// The remaining balance is recomputed from a fresh statement, so the
    /// check always sees payments made since the caller last looked. Callers
    /// reload the statement afterwards to see the new totals.
    pub async fn submit_payment(
        &self,
        context: &ReconciliationContext,
        fee: &FeeObligation,
        amount: BigDecimal,
    ) -> FeeResult<TransactionRecord> {
        validate_positive_amount(&amount)?;

        let statement = self.load_statement(context).await?;
        let current = Self::current_fee(&statement, &fee.fee_id)?;
        self.payments.submit(context, current, amount).await
    }

    /// Pay off whatever remains on a fee
    ///
    /// The payment references the fee, so afterwards the fee only counts its
    /// linked payments. A fee covered so far by a proportional share is
    /// therefore paid in full, and that share stops counting towards it.
    pub async fn mark_paid(
        &self,
        context: &ReconciliationContext,
        fee: &FeeObligation,
    ) -> FeeResult<TransactionRecord> {
        let statement = self.load_statement(context).await?;
        let current = Self::current_fee(&statement, &fee.fee_id)?;
        self.payments.settle(context, current).await
    }

    fn current_fee<'a>(statement: &'a FeeStatement, fee_id: &FeeId) -> FeeResult<&'a ReconciledFee> {
        statement.fee(fee_id).ok_or_else(|| {
            FeeError::Validation(format!(
                "Fee {} not found for student {}",
                fee_id, statement.context.student_id
            ))
        })
    }
}
