//! Validation utilities

use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> FeeResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(FeeError::Validation(
            "Payment amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate a payment against what is still owed on a fee
pub fn validate_payment_amount(fee: &ReconciledFee, amount: &BigDecimal) -> FeeResult<()> {
    validate_positive_amount(amount)?;

    if *amount > fee.remaining_amount {
        return Err(FeeError::Validation(format!(
            "Payment of {} exceeds remaining balance of {} for fee {}",
            amount,
            fee.remaining_amount,
            fee.fee_id()
        )));
    }

    Ok(())
}

/// Check a fee can be paid off and return the amount that settles it
pub fn validate_settlement(fee: &ReconciledFee) -> FeeResult<BigDecimal> {
    let amount = fee.settlement_amount();
    if !fee.is_payable() || amount <= BigDecimal::from(0) {
        return Err(FeeError::Validation(format!(
            "Fee {} has nothing left to pay",
            fee.fee_id()
        )));
    }
    Ok(amount)
}

/// Parse a user-entered payment amount
pub fn parse_payment_amount(input: &str) -> FeeResult<BigDecimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FeeError::Validation(
            "Payment amount is required".to_string(),
        ));
    }

    let amount = BigDecimal::from_str(trimmed).map_err(|_| {
        FeeError::Validation(format!("Payment amount '{}' is not a number", trimmed))
    })?;
    validate_positive_amount(&amount)?;

    Ok(amount)
}

/// Validate a user id typed into a search box
pub fn validate_student_id(input: &str) -> FeeResult<StudentId> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(FeeError::Validation(
            "Please enter a valid numeric User ID".to_string(),
        ));
    }

    if trimmed.len() > 20 {
        return Err(FeeError::Validation(
            "User ID cannot exceed 20 digits".to_string(),
        ));
    }

    Ok(StudentId::new(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconciled(amount: i64, paid: i64) -> ReconciledFee {
        ReconciledFee::new(
            FeeObligation::new("1", BigDecimal::from(amount), None),
            BigDecimal::from(paid),
            Allocation::Proportional,
        )
    }

    #[test]
    fn test_validate_payment_amount() {
        let fee = reconciled(1000, 200);
        assert!(validate_payment_amount(&fee, &BigDecimal::from(800)).is_ok());
        assert!(validate_payment_amount(&fee, &BigDecimal::from(1)).is_ok());
        assert!(matches!(
            validate_payment_amount(&fee, &BigDecimal::from(801)),
            Err(FeeError::Validation(_))
        ));
        assert!(matches!(
            validate_payment_amount(&fee, &BigDecimal::from(0)),
            Err(FeeError::Validation(_))
        ));
        assert!(matches!(
            validate_payment_amount(&fee, &BigDecimal::from(-5)),
            Err(FeeError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_settlement() {
        assert_eq!(
            validate_settlement(&reconciled(1000, 0)).unwrap(),
            BigDecimal::from(1000)
        );
        assert!(matches!(
            validate_settlement(&reconciled(1000, 1000)),
            Err(FeeError::Validation(_))
        ));

        let fraction = ReconciledFee::new(
            FeeObligation::new("1", BigDecimal::from_str("100.005").unwrap(), None),
            BigDecimal::from(100),
            Allocation::Linked {
                transaction_ids: vec![TransactionId::from("t")],
            },
        );
        assert_eq!(
            validate_settlement(&fraction).unwrap(),
            BigDecimal::from_str("0.005").unwrap()
        );
    }

    #[test]
    fn test_parse_payment_amount() {
        assert_eq!(
            parse_payment_amount(" 250.75 ").unwrap(),
            BigDecimal::from_str("250.75").unwrap()
        );
        assert!(matches!(
            parse_payment_amount("abc"),
            Err(FeeError::Validation(_))
        ));
        assert!(matches!(parse_payment_amount(""), Err(FeeError::Validation(_))));
        assert!(matches!(
            parse_payment_amount("-10"),
            Err(FeeError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_student_id() {
        assert_eq!(validate_student_id(" 42 ").unwrap(), StudentId::from("42"));
        assert!(validate_student_id("4a").is_err());
        assert!(validate_student_id("").is_err());
        assert!(validate_student_id(&"9".repeat(21)).is_err());
    }
}
