//! Loading and reconciling fee statements

use tracing::{info, warn};

use crate::reconciliation::{transactions_for_student, ReconciliationEngine};
use crate::records::{parse_fees, parse_student_profile, parse_transactions};
use crate::traits::*;
use crate::types::*;

/// Fetches fees and the session ledger and runs them through the engine
pub struct StatementLoader<B: FeeBackend> {
    backend: B,
    engine: ReconciliationEngine,
}

impl<B: FeeBackend> StatementLoader<B> {
    /// Create a loader using the default engine
    pub fn new(backend: B) -> Self {
        Self::with_engine(backend, ReconciliationEngine::new())
    }

    /// Create a loader with a custom engine
    pub fn with_engine(backend: B, engine: ReconciliationEngine) -> Self {
        Self { backend, engine }
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Load and reconcile the statement for a student in a session
    ///
    /// Fees, the ledger and the student profile are fetched concurrently.
    /// A failure of either list is reported as one [`FeeError::Fetch`]; a
    /// missing or failing profile only leaves `student` empty.
    pub async fn load(&self, context: &ReconciliationContext) -> FeeResult<FeeStatement> {
        let (fees, transactions, student) = tokio::join!(
            self.backend.list_fees(&context.student_id),
            self.backend.list_transactions(&context.session_id),
            self.backend.get_student(&context.student_id),
        );

        let (fees, transactions) = match (fees, transactions) {
            (Ok(fees), Ok(transactions)) => (fees, transactions),
            (fees, transactions) => {
                let failure = FetchFailure {
                    fees: fees.err(),
                    transactions: transactions.err(),
                };
                warn!(
                    student_id = %context.student_id,
                    session_id = %context.session_id,
                    error = %failure,
                    "failed to load fee statement"
                );
                return Err(FeeError::Fetch(failure));
            }
        };

        let student = match student {
            Ok(profile) => profile.as_ref().map(parse_student_profile),
            Err(err) => {
                warn!(student_id = %context.student_id, error = %err, "student profile unavailable");
                None
            }
        };

        let fees = parse_fees(&fees);
        let ledger = parse_transactions(&transactions);
        let relevant = transactions_for_student(ledger.records, &context.student_id);
        let reconciliation = self.engine.reconcile(&fees.records, &relevant);

        let mut rejected = fees.rejected;
        rejected.extend(ledger.rejected);

        info!(
            student_id = %context.student_id,
            session_id = %context.session_id,
            fees = reconciliation.fees.len(),
            transactions = relevant.len(),
            rejected = rejected.len(),
            payment_percentage = reconciliation.totals.payment_percentage,
            "fee statement loaded"
        );

        Ok(FeeStatement {
            context: context.clone(),
            student,
            reconciliation,
            rejected,
        })
    }
}
