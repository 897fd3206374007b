//! Fee reconciliation engine
//!
//! Merges a student's fee schedule with the session ledger. For each fee the
//! paid amount comes either from transactions linked to it through their
//! description, or, when none are linked, from a proportional share of the
//! payments nobody claimed. The engine is pure: the same inputs always give
//! the same output, and nothing is cached between runs.

pub mod allocation;
pub mod linking;

pub use allocation::*;
pub use linking::*;

use bigdecimal::BigDecimal;
use tracing::debug;

use crate::traits::*;
use crate::types::*;

/// Computes per-fee payment state and session totals
pub struct ReconciliationEngine {
    linker: Box<dyn FeeLinker>,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationEngine {
    /// Create an engine using description substring linking
    pub fn new() -> Self {
        Self {
            linker: Box::new(DescriptionContainsLinker),
        }
    }

    /// Create an engine with a custom linking rule
    pub fn with_linker(linker: Box<dyn FeeLinker>) -> Self {
        Self { linker }
    }

    /// Reconcile fees against transactions already scoped to one student and session
    pub fn reconcile(
        &self,
        fees: &[FeeObligation],
        transactions: &[TransactionRecord],
    ) -> Reconciliation {
        let totals = session_totals(fees, transactions);

        let links: Vec<Vec<usize>> = fees
            .iter()
            .map(|fee| {
                transactions
                    .iter()
                    .enumerate()
                    .filter(|(_, txn)| self.linker.is_linked(&fee.fee_id, txn))
                    .map(|(index, _)| index)
                    .collect()
            })
            .collect();

        let mut attributed = vec![false; transactions.len()];
        for index in links.iter().flatten() {
            attributed[*index] = true;
        }

        // linked transactions are fully attributed to their fees
        let unattributed_pool = successful_total(
            transactions
                .iter()
                .zip(&attributed)
                .filter(|(_, linked)| !**linked)
                .map(|(txn, _)| txn),
        );

        let reconciled: Vec<ReconciledFee> = fees
            .iter()
            .zip(&links)
            .map(|(fee, linked)| {
                if linked.is_empty() {
                    let paid =
                        proportional_share(&fee.amount, &totals.total_fees, &unattributed_pool);
                    ReconciledFee::new(fee.clone(), paid, Allocation::Proportional)
                } else {
                    let paid: BigDecimal =
                        successful_total(linked.iter().map(|index| &transactions[*index]));
                    let transaction_ids = linked
                        .iter()
                        .map(|index| transactions[*index].transaction_id.clone())
                        .collect();
                    ReconciledFee::new(fee.clone(), paid, Allocation::Linked { transaction_ids })
                }
            })
            .collect();

        debug!(
            fees = fees.len(),
            transactions = transactions.len(),
            linked = attributed.iter().filter(|l| **l).count(),
            total_paid = %totals.total_paid,
            "reconciled fee schedule"
        );

        Reconciliation {
            fees: reconciled,
            totals,
        }
    }
}

/// Reconcile with the default engine
pub fn reconcile(fees: &[FeeObligation], transactions: &[TransactionRecord]) -> Reconciliation {
    ReconciliationEngine::new().reconcile(fees, transactions)
}

/// Keep only the transactions that belong to a student
pub fn transactions_for_student(
    transactions: Vec<TransactionRecord>,
    student_id: &StudentId,
) -> Vec<TransactionRecord> {
    transactions
        .into_iter()
        .filter(|txn| &txn.user_id == student_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn fee(id: &str, amount: i64) -> FeeObligation {
        FeeObligation::new(id, BigDecimal::from(amount), None)
    }

    fn txn(id: &str, amount: i64, status: TransactionStatus, description: &str) -> TransactionRecord {
        TransactionRecord::new(id, "S", BigDecimal::from(amount), status, description)
    }

    #[test]
    fn test_linked_payment_marks_fee_paid() {
        let fees = vec![fee("1", 1000)];
        let transactions = vec![txn(
            "t1",
            1000,
            TransactionStatus::Success,
            "Payment for Fee ID: 1",
        )];

        let result = reconcile(&fees, &transactions);
        let reconciled = &result.fees[0];
        assert_eq!(reconciled.paid_amount, BigDecimal::from(1000));
        assert_eq!(reconciled.remaining_amount, BigDecimal::from(0));
        assert_eq!(reconciled.status, PaymentStatus::Paid);
        assert_eq!(
            reconciled.allocation,
            Allocation::Linked {
                transaction_ids: vec![TransactionId::from("t1")]
            }
        );
        assert_eq!(result.overall_status(), OverallStatus::FullyPaid);
        assert_eq!(result.totals.payment_percentage, 100);
    }

    #[test]
    fn test_unlinked_payment_is_split_proportionally() {
        let fees = vec![fee("1", 1000), fee("2", 500)];
        let transactions = vec![txn("t1", 300, TransactionStatus::Success, "general payment")];

        let result = reconcile(&fees, &transactions);
        assert_eq!(result.fees[0].paid_amount, BigDecimal::from(200));
        assert_eq!(result.fees[1].paid_amount, BigDecimal::from(100));
        assert_eq!(result.fees[0].remaining_amount, BigDecimal::from(800));
        assert_eq!(result.fees[1].remaining_amount, BigDecimal::from(400));
        assert_eq!(result.fees[0].status, PaymentStatus::Partial);
        assert_eq!(result.fees[1].status, PaymentStatus::Partial);
        assert_eq!(result.fees[0].allocation, Allocation::Proportional);
        assert_eq!(result.overall_status(), OverallStatus::PaymentDue);
    }

    #[test]
    fn test_empty_inputs_give_zero_totals() {
        let result = reconcile(&[], &[]);
        assert!(result.fees.is_empty());
        assert_eq!(result.totals, SessionTotals::default());
        assert_eq!(result.totals.payment_percentage, 0);
        assert_eq!(result.overall_status(), OverallStatus::NoFees);
    }

    #[test]
    fn test_no_transactions_leaves_everything_pending() {
        let fees = vec![fee("1", 1000), fee("2", 0), fee("3", 250)];
        let result = reconcile(&fees, &[]);
        for reconciled in &result.fees {
            assert_eq!(reconciled.paid_amount, BigDecimal::from(0));
            assert_eq!(reconciled.status, PaymentStatus::Pending);
        }
        assert_eq!(result.totals.total_remaining, BigDecimal::from(1250));
    }

    #[test]
    fn test_zero_total_fees_never_divides() {
        let fees = vec![fee("1", 0), fee("2", 0)];
        let transactions = vec![txn("t1", 300, TransactionStatus::Success, "general payment")];

        let result = reconcile(&fees, &transactions);
        assert_eq!(result.totals.payment_percentage, 0);
        assert_eq!(result.totals.total_remaining, BigDecimal::from(0));
        for reconciled in &result.fees {
            assert_eq!(reconciled.paid_amount, BigDecimal::from(0));
        }
    }

    #[test]
    fn test_linked_non_success_transactions_pay_nothing() {
        let fees = vec![fee("1", 1000), fee("2", 500)];
        let transactions = vec![
            txn("t1", 1000, TransactionStatus::Failed, "Payment for Fee ID: 1"),
            txn("t2", 150, TransactionStatus::Success, "general payment"),
        ];

        let result = reconcile(&fees, &transactions);
        // fee 1 has a link, so it does not share in the unlinked pool
        assert_eq!(result.fees[0].paid_amount, BigDecimal::from(0));
        assert_eq!(result.fees[0].status, PaymentStatus::Pending);
        // 150 * 500 / 1500
        assert_eq!(result.fees[1].paid_amount, BigDecimal::from(50));
    }

    #[test]
    fn test_linked_transactions_do_not_feed_proportional_pool() {
        let fees = vec![fee("1", 1000), fee("2", 500)];
        let transactions = vec![
            txn("t1", 600, TransactionStatus::Success, "Payment for Fee ID: 1"),
            txn("t2", 300, TransactionStatus::Success, "general payment"),
        ];

        let result = reconcile(&fees, &transactions);
        assert_eq!(result.fees[0].paid_amount, BigDecimal::from(600));
        assert_eq!(result.fees[1].paid_amount, BigDecimal::from(100));
        assert_eq!(result.totals.total_paid, BigDecimal::from(900));
        assert_eq!(result.totals.payment_percentage, 60);
    }

    #[test]
    fn test_overpayment_clamps_remaining() {
        let fees = vec![fee("1", 500)];
        let transactions = vec![txn(
            "t1",
            800,
            TransactionStatus::Success,
            "Payment for Fee ID: 1",
        )];

        let result = reconcile(&fees, &transactions);
        assert_eq!(result.fees[0].paid_amount, BigDecimal::from(800));
        assert_eq!(result.fees[0].remaining_amount, BigDecimal::from(0));
        assert_eq!(result.totals.total_remaining, BigDecimal::from(0));
        assert!(result.fees[0].remaining_amount >= BigDecimal::from(0));
    }

    #[test]
    fn test_proportional_shares_sum_to_total_paid() {
        let fees = vec![fee("1", 1000), fee("2", 700), fee("3", 333)];
        let transactions = vec![
            txn("t1", 457, TransactionStatus::Success, "term payment"),
            txn("t2", 120, TransactionStatus::Success, "bus"),
            txn("t3", 999, TransactionStatus::Refunded, "refund"),
        ];

        let result = reconcile(&fees, &transactions);
        let allocated: BigDecimal = result.fees.iter().map(|f| &f.paid_amount).sum();
        let difference = (allocated - &result.totals.total_paid).abs();
        assert!(difference < BigDecimal::from_str("0.000000001").unwrap());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let fees = vec![fee("1", 1000), fee("2", 500)];
        let transactions = vec![
            txn("t1", 400, TransactionStatus::Success, "Payment for Fee ID: 1"),
            txn("t2", 90, TransactionStatus::Success, "misc"),
        ];

        let engine = ReconciliationEngine::new();
        assert_eq!(
            engine.reconcile(&fees, &transactions),
            engine.reconcile(&fees, &transactions)
        );
    }

    #[test]
    fn test_output_preserves_fee_order() {
        let fees = vec![fee("9", 10), fee("3", 30), fee("5", 50)];
        let result = reconcile(&fees, &[]);
        let ids: Vec<&str> = result.fees.iter().map(|f| f.fee_id().as_str()).collect();
        assert_eq!(ids, vec!["9", "3", "5"]);
    }

    #[test]
    fn test_custom_linker() {
        let fees = vec![fee("1", 1000), fee("10", 1000)];
        let transactions = vec![txn(
            "t1",
            1000,
            TransactionStatus::Success,
            "Payment for Fee ID: 10",
        )];

        let substring = reconcile(&fees, &transactions);
        assert_eq!(substring.fees[0].paid_amount, BigDecimal::from(1000));

        let token = ReconciliationEngine::with_linker(Box::new(ReferenceTokenLinker))
            .reconcile(&fees, &transactions);
        assert_eq!(token.fees[0].paid_amount, BigDecimal::from(0));
        assert_eq!(token.fees[1].status, PaymentStatus::Paid);
    }

    #[test]
    fn test_transactions_for_student() {
        let transactions = vec![
            TransactionRecord::new("a", "7", BigDecimal::from(1), TransactionStatus::Success, ""),
            TransactionRecord::new("b", "8", BigDecimal::from(1), TransactionStatus::Success, ""),
        ];
        let mine = transactions_for_student(transactions, &StudentId::from("7"));
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].transaction_id, TransactionId::from("a"));
    }
}
