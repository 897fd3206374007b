//! Core types and data structures for fee reconciliation

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a fee obligation, held in its decimal string form
    FeeId
);
string_id!(
    /// Identifier of a student (the backend's user id)
    StudentId
);
string_id!(
    /// Identifier of an academic session that scopes the transaction ledger
    SessionId
);
string_id!(
    /// Identifier of a ledger transaction
    TransactionId
);

/// Status of a ledger transaction as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Pending,
    Failed,
    Cancelled,
    Refunded,
}

impl TransactionStatus {
    /// Parse a backend status string, ignoring case and surrounding whitespace
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Some(Self::Success),
            "pending" => Some(Self::Pending),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Only successful transactions count towards amounts paid
    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Derived payment status of a single fee obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Nothing has been paid
    Pending,
    /// Something, but less than the full amount, has been paid
    Partial,
    /// The paid amount covers the obligation
    Paid,
}

impl PaymentStatus {
    /// Derive the status from the obligation amount and the amount paid.
    ///
    /// A zero paid amount is always `Pending`, including for zero-amount fees.
    pub fn from_amounts(amount: &BigDecimal, paid: &BigDecimal) -> Self {
        if paid.is_zero() {
            PaymentStatus::Pending
        } else if paid >= amount {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Paid => "Paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// A single billable item owed by a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeObligation {
    /// Unique identifier of the obligation
    pub fee_id: FeeId,
    /// Amount owed, never negative
    pub amount: BigDecimal,
    /// Optional due date
    pub due_date: Option<NaiveDate>,
}

impl FeeObligation {
    /// Create a new fee obligation
    pub fn new(fee_id: impl Into<FeeId>, amount: BigDecimal, due_date: Option<NaiveDate>) -> Self {
        Self {
            fee_id: fee_id.into(),
            amount,
            due_date,
        }
    }
}

/// A recorded payment event in a session's ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    /// Owning student
    pub user_id: StudentId,
    /// Amount paid, never negative
    pub amount: BigDecimal,
    pub status: TransactionStatus,
    /// Free text; may reference a fee id
    pub description: String,
    pub payment_date: Option<NaiveDateTime>,
}

impl TransactionRecord {
    /// Create a new transaction record without a payment date
    pub fn new(
        transaction_id: impl Into<TransactionId>,
        user_id: impl Into<StudentId>,
        amount: BigDecimal,
        status: TransactionStatus,
        description: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            user_id: user_id.into(),
            amount,
            status,
            description: description.into(),
            payment_date: None,
        }
    }

    /// Amount this transaction contributes to paid totals
    pub fn paid_amount(&self) -> BigDecimal {
        if self.status.is_success() {
            self.amount.clone()
        } else {
            BigDecimal::from(0)
        }
    }
}

/// How the paid amount of a reconciled fee was attributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allocation {
    /// Paid amount comes from transactions whose description references the fee
    Linked { transaction_ids: Vec<TransactionId> },
    /// Paid amount is a proportional share of unattributed payments
    Proportional,
}

/// A fee obligation together with its derived payment state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledFee {
    pub fee: FeeObligation,
    pub paid_amount: BigDecimal,
    /// Always `max(0, amount - paid_amount)`
    pub remaining_amount: BigDecimal,
    pub status: PaymentStatus,
    pub allocation: Allocation,
}

impl ReconciledFee {
    /// Wrap a fee obligation with the amount paid against it
    pub fn new(fee: FeeObligation, paid_amount: BigDecimal, allocation: Allocation) -> Self {
        let remaining_amount = crate::reconciliation::remaining_amount(&fee.amount, &paid_amount);
        let status = PaymentStatus::from_amounts(&fee.amount, &paid_amount);
        Self {
            fee,
            paid_amount,
            remaining_amount,
            status,
            allocation,
        }
    }

    pub fn fee_id(&self) -> &FeeId {
        &self.fee.fee_id
    }

    /// Amount a payment referencing this fee must carry to leave it `Paid`
    ///
    /// Once a payment is linked, only linked payments count towards the fee,
    /// so a fee paid so far through a proportional share needs its full amount.
    pub fn settlement_amount(&self) -> BigDecimal {
        match self.allocation {
            Allocation::Linked { .. } => self.remaining_amount.clone(),
            Allocation::Proportional => self.fee.amount.clone(),
        }
    }

    /// Whether a further payment can be taken against this fee
    pub fn is_payable(&self) -> bool {
        self.status != PaymentStatus::Paid && self.remaining_amount > BigDecimal::from(0)
    }
}

/// Session-level totals over a student's fees and payments
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionTotals {
    pub total_fees: BigDecimal,
    pub total_paid: BigDecimal,
    pub total_remaining: BigDecimal,
    /// Rounded percentage of fees paid, 0 when there are no fees
    pub payment_percentage: u32,
}

/// Overall payment state shown in the statement summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    NoFees,
    FullyPaid,
    PaymentDue,
}

impl OverallStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OverallStatus::NoFees => "No Fees",
            OverallStatus::FullyPaid => "Fully Paid",
            OverallStatus::PaymentDue => "Payment Due",
        }
    }
}

/// Output of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Same order and length as the input fees
    pub fees: Vec<ReconciledFee>,
    pub totals: SessionTotals,
}

impl Reconciliation {
    pub fn overall_status(&self) -> OverallStatus {
        if self.fees.is_empty() {
            OverallStatus::NoFees
        } else if self.totals.total_remaining.is_zero() {
            OverallStatus::FullyPaid
        } else {
            OverallStatus::PaymentDue
        }
    }

    /// Look up a reconciled fee by id
    pub fn fee(&self, fee_id: &FeeId) -> Option<&ReconciledFee> {
        self.fees.iter().find(|f| &f.fee.fee_id == fee_id)
    }
}

/// Basic student details shown alongside a fee statement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: Option<String>,
    pub admission_no: Option<String>,
    pub student_class: Option<String>,
}

/// The student and session a reconciliation is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReconciliationContext {
    pub student_id: StudentId,
    pub session_id: SessionId,
}

impl ReconciliationContext {
    pub fn new(student_id: impl Into<StudentId>, session_id: impl Into<SessionId>) -> Self {
        Self {
            student_id: student_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// A complete fee statement for one student in one session
#[derive(Debug, Clone, PartialEq)]
pub struct FeeStatement {
    pub context: ReconciliationContext,
    pub student: Option<StudentProfile>,
    pub reconciliation: Reconciliation,
    /// Backend records that could not be used
    pub rejected: Vec<DataFormatError>,
}

impl FeeStatement {
    pub fn fees(&self) -> &[ReconciledFee] {
        &self.reconciliation.fees
    }

    pub fn totals(&self) -> &SessionTotals {
        &self.reconciliation.totals
    }

    pub fn fee(&self, fee_id: &FeeId) -> Option<&ReconciledFee> {
        self.reconciliation.fee(fee_id)
    }

    pub fn overall_status(&self) -> OverallStatus {
        self.reconciliation.overall_status()
    }
}

/// Body of a payment submission sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(serialize_with = "serialize_amount")]
    pub amount: BigDecimal,
    pub user_id: StudentId,
    pub description: String,
}

/// Amounts go over the wire as JSON numbers carrying every decimal digit
fn serialize_amount<S: Serializer>(amount: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.with_scale(0) == *amount {
        if let Some(whole) = amount.to_i64() {
            return serializer.serialize_i64(whole);
        }
    }
    let number = serde_json::Number::from_str(&amount.to_string()).map_err(S::Error::custom)?;
    number.serialize(serializer)
}

/// Kind of backend record being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Fee,
    Transaction,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Fee => f.write_str("fee"),
            RecordKind::Transaction => f.write_str("transaction"),
        }
    }
}

/// A backend record that could not be turned into a typed record.
///
/// These are collected and reported, never raised for the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataFormatError {
    #[error("{record} record #{index} is not a JSON object")]
    NotAnObject { record: RecordKind, index: usize },
    #[error("{record} record #{index} is missing required field '{field}'")]
    MissingField {
        record: RecordKind,
        index: usize,
        field: &'static str,
    },
}

/// Errors raised by a fee backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Could not decode backend response: {0}")]
    Decode(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Combined failure of the fee and transaction fetches
#[derive(Debug, Default)]
pub struct FetchFailure {
    pub fees: Option<BackendError>,
    pub transactions: Option<BackendError>,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.fees, &self.transactions) {
            (Some(fees), Some(transactions)) => {
                write!(f, "fees: {}; transactions: {}", fees, transactions)
            }
            (Some(fees), None) => write!(f, "fees: {}", fees),
            (None, Some(transactions)) => write!(f, "transactions: {}", transactions),
            (None, None) => f.write_str("unknown failure"),
        }
    }
}

/// Errors surfaced to callers of the fee desk
#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Payment submission failed: {0}")]
    Submission(#[source] BackendError),
    #[error("Failed to load fee details: {0}")]
    Fetch(FetchFailure),
}

/// Result type for fee operations
pub type FeeResult<T> = Result<T, FeeError>;
