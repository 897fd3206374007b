//! # Fees Core
//!
//! Student fee reconciliation for a school administration backend: merges a
//! student's fee schedule with the session's payment ledger, derives
//! per-fee payment status and session totals, and records new payments.
//!
//! ## Features
//!
//! - **Reconciliation engine**: pure, repeatable computation of paid, remaining and status per fee
//! - **Linked and proportional allocation**: payments referencing a fee are attributed to it, the rest is spread by fee share
//! - **Lenient data boundary**: loosely typed backend JSON is validated into strict records, one bad record never blocks the batch
//! - **Payments**: validated submission against the balance computed at call time
//! - **Backend abstraction**: REST client over `reqwest` and an in-memory backend for tests
//!
//! ## Quick Start
//!
//! ```rust
//! use fees_core::{reconcile, FeeObligation, PaymentStatus, TransactionRecord, TransactionStatus};
//! use bigdecimal::BigDecimal;
//!
//! let fees = vec![FeeObligation::new("1", BigDecimal::from(1000), None)];
//! let ledger = vec![TransactionRecord::new(
//!     "t1",
//!     "7",
//!     BigDecimal::from(1000),
//!     TransactionStatus::Success,
//!     "Payment for Fee ID: 1",
//! )];
//!
//! let result = reconcile(&fees, &ledger);
//! assert_eq!(result.fees[0].status, PaymentStatus::Paid);
//! assert_eq!(result.totals.payment_percentage, 100);
//! ```

pub mod client;
pub mod config;
pub mod desk;
pub mod reconciliation;
pub mod records;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use client::HttpBackend;
pub use crate::config::{BackendConfig, FeesConfig};
pub use desk::{payment_description, FeeDesk, PaymentManager, StatementLoader};
pub use reconciliation::{reconcile, transactions_for_student, ReconciliationEngine, ReferenceTokenLinker};
pub use records::{parse_fees, parse_transactions, Parsed};
pub use traits::*;
pub use types::*;
