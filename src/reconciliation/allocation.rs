//! Amount arithmetic used by the reconciliation engine

use bigdecimal::{BigDecimal, ToPrimitive, Zero};

use crate::types::*;

/// Sum of all fee obligation amounts
pub fn total_fees(fees: &[FeeObligation]) -> BigDecimal {
    fees.iter().map(|f| &f.amount).sum()
}

/// Sum of successful transaction amounts
pub fn successful_total<'a, I>(transactions: I) -> BigDecimal
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    transactions
        .into_iter()
        .map(TransactionRecord::paid_amount)
        .sum()
}

/// `max(0, amount - paid)`
pub fn remaining_amount(amount: &BigDecimal, paid: &BigDecimal) -> BigDecimal {
    let remaining = amount - paid;
    if remaining < BigDecimal::from(0) {
        BigDecimal::from(0)
    } else {
        remaining
    }
}

/// Share of `pool` owed to an obligation of `amount` out of `total_fees`
pub fn proportional_share(
    amount: &BigDecimal,
    total_fees: &BigDecimal,
    pool: &BigDecimal,
) -> BigDecimal {
    if total_fees.is_zero() {
        return BigDecimal::from(0);
    }
    (amount * pool) / total_fees.clone()
}

/// `round(100 * paid / fees)` with halves rounded up, 0 when there are no fees
pub fn payment_percentage(total_paid: &BigDecimal, total_fees: &BigDecimal) -> u32 {
    if total_fees.is_zero() {
        return 0;
    }
    let scaled = (total_paid * BigDecimal::from(100)) / total_fees.clone();
    let half = BigDecimal::from(5) / BigDecimal::from(10);
    (scaled + half).with_scale(0).to_u32().unwrap_or(u32::MAX)
}

/// Session totals over all fees and all successful transactions
pub fn session_totals(fees: &[FeeObligation], transactions: &[TransactionRecord]) -> SessionTotals {
    let total_fees = total_fees(fees);
    let total_paid = successful_total(transactions);
    SessionTotals {
        total_remaining: remaining_amount(&total_fees, &total_paid),
        payment_percentage: payment_percentage(&total_paid, &total_fees),
        total_fees,
        total_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_amount_is_clamped() {
        assert_eq!(
            remaining_amount(&BigDecimal::from(1000), &BigDecimal::from(300)),
            BigDecimal::from(700)
        );
        assert_eq!(
            remaining_amount(&BigDecimal::from(1000), &BigDecimal::from(1300)),
            BigDecimal::from(0)
        );
    }

    #[test]
    fn test_proportional_share() {
        let total = BigDecimal::from(1500);
        let pool = BigDecimal::from(300);
        assert_eq!(
            proportional_share(&BigDecimal::from(1000), &total, &pool),
            BigDecimal::from(200)
        );
        assert_eq!(
            proportional_share(&BigDecimal::from(500), &total, &pool),
            BigDecimal::from(100)
        );
        assert_eq!(
            proportional_share(&BigDecimal::from(500), &BigDecimal::from(0), &pool),
            BigDecimal::from(0)
        );
    }

    #[test]
    fn test_payment_percentage_rounding() {
        assert_eq!(
            payment_percentage(&BigDecimal::from(0), &BigDecimal::from(0)),
            0
        );
        assert_eq!(
            payment_percentage(&BigDecimal::from(300), &BigDecimal::from(1500)),
            20
        );
        // 1/3 -> 33.33..
        assert_eq!(
            payment_percentage(&BigDecimal::from(1), &BigDecimal::from(3)),
            33
        );
        // 2/3 -> 66.66..
        assert_eq!(
            payment_percentage(&BigDecimal::from(2), &BigDecimal::from(3)),
            67
        );
        // exactly half a percent rounds up
        assert_eq!(
            payment_percentage(&BigDecimal::from(1), &BigDecimal::from(200)),
            1
        );
        // overpayment is reported as is
        assert_eq!(
            payment_percentage(&BigDecimal::from(1500), &BigDecimal::from(1000)),
            150
        );
    }

    #[test]
    fn test_session_totals_counts_only_successful_transactions() {
        let fees = vec![
            FeeObligation::new("1", BigDecimal::from(1000), None),
            FeeObligation::new("2", BigDecimal::from(500), None),
        ];
        let transactions = vec![
            TransactionRecord::new("a", "7", BigDecimal::from(300), TransactionStatus::Success, ""),
            TransactionRecord::new("b", "7", BigDecimal::from(900), TransactionStatus::Failed, ""),
            TransactionRecord::new("c", "7", BigDecimal::from(200), TransactionStatus::Success, ""),
        ];

        let totals = session_totals(&fees, &transactions);
        assert_eq!(totals.total_fees, BigDecimal::from(1500));
        assert_eq!(totals.total_paid, BigDecimal::from(500));
        assert_eq!(totals.total_remaining, BigDecimal::from(1000));
        assert_eq!(totals.payment_percentage, 33);
    }
}
