//! Fee statement walkthrough against the in-memory backend

use bigdecimal::BigDecimal;
use fees_core::utils::{format_currency, format_date, MemoryBackend};
use fees_core::{FeeDesk, FeeId, FeesConfig, ReconciliationContext};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = FeesConfig::load()?;
    println!("Backend configured at {}\n", config.backend.base_url);

    // Seed a student with two fees and one unlinked payment
    let backend = MemoryBackend::new("2024-25");
    backend.add_student("7", json!({"name": "Asha Rao", "admissionNo": "A-1042", "studentClass": "7-B"}));
    backend.add_fee("7", json!({"feesId": 1, "amount": 1000, "dueDate": "2024-06-30"}));
    backend.add_fee("7", json!({"feesId": 2, "amount": 500, "dueDate": "2024-12-31"}));
    backend.add_transaction(
        "2024-25",
        json!({"transactionId": 100, "userId": 7, "amount": 300, "status": "success", "description": "general payment"}),
    );

    let desk = FeeDesk::new(backend);
    let context = ReconciliationContext::new("7", "2024-25");

    let statement = desk.load_statement(&context).await?;
    print_statement(&statement);

    // Pay part of the first fee; the payment references the fee id
    let fee = statement
        .fee(&FeeId::from("1"))
        .map(|f| f.fee.clone())
        .ok_or("fee 1 missing")?;
    let payment = desk
        .submit_payment(&context, &fee, BigDecimal::from(500))
        .await?;
    println!(
        "Recorded payment {} of {}\n",
        payment.transaction_id,
        format_currency(&payment.amount)
    );

    // Over-paying is refused with a validation error
    if let Err(err) = desk
        .submit_payment(&context, &fee, BigDecimal::from(10_000))
        .await
    {
        println!("Refused: {}\n", err);
    }

    let statement = desk.load_statement(&context).await?;
    print_statement(&statement);

    Ok(())
}

fn print_statement(statement: &fees_core::FeeStatement) {
    if let Some(student) = &statement.student {
        println!(
            "Fee Details - {} ({})",
            student.name.as_deref().unwrap_or("N/A"),
            student.student_class.as_deref().unwrap_or("-")
        );
    }

    for fee in statement.fees() {
        println!(
            "  Fee {:>3}  {:>12}  due {:<12}  {:<8} paid {:>10}  remaining {:>10}",
            fee.fee_id(),
            format_currency(&fee.fee.amount),
            format_date(fee.fee.due_date, "-"),
            fee.status,
            format_currency(&fee.paid_amount),
            format_currency(&fee.remaining_amount),
        );
    }

    let totals = statement.totals();
    println!(
        "  Total {}  Paid {}  Pending {}  ({}%)  {}\n",
        format_currency(&totals.total_fees),
        format_currency(&totals.total_paid),
        format_currency(&totals.total_remaining),
        totals.payment_percentage,
        statement.overall_status().label()
    );
}
