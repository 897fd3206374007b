//! Parsing of backend JSON into typed records
//!
//! The backend is loosely typed: ids arrive as numbers or strings, amounts
//! may be strings, missing or garbage. Amounts are coerced to zero with a
//! warning; records without an id are skipped and reported as
//! [`DataFormatError`]s so the rest of the batch can still be reconciled.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::types::*;

const FEE_ID_FIELDS: &[&str] = &["feesId", "feeId", "id"];
const TRANSACTION_ID_FIELDS: &[&str] = &["transactionId", "id"];
const PAYMENT_DATE_FIELDS: &[&str] = &["paymentDate", "date"];

/// Typed records parsed from a batch, plus the ones that had to be skipped
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub rejected: Vec<DataFormatError>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Parsed<T> {
    /// True when every record in the batch was usable
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Normalise a list response: arrays pass through, `null` is empty and a
/// lone object becomes a one-element list
pub fn normalize_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Parse a single fee record
pub fn parse_fee(value: &Value, index: usize) -> Result<FeeObligation, DataFormatError> {
    let record = value.as_object().ok_or(DataFormatError::NotAnObject {
        record: RecordKind::Fee,
        index,
    })?;

    let fee_id = first_field(record, FEE_ID_FIELDS)
        .and_then(parse_id)
        .ok_or(DataFormatError::MissingField {
            record: RecordKind::Fee,
            index,
            field: "feesId",
        })?;

    let amount = parse_amount(record.get("amount"), RecordKind::Fee, &fee_id);
    let due_date = record.get("dueDate").and_then(parse_date);

    Ok(FeeObligation {
        fee_id: FeeId::new(fee_id),
        amount,
        due_date,
    })
}

/// Parse a batch of fee records, skipping the malformed ones
pub fn parse_fees(values: &[Value]) -> Parsed<FeeObligation> {
    parse_batch(values, RecordKind::Fee, parse_fee)
}

/// Parse a single transaction record
pub fn parse_transaction(
    value: &Value,
    index: usize,
) -> Result<TransactionRecord, DataFormatError> {
    let record = value.as_object().ok_or(DataFormatError::NotAnObject {
        record: RecordKind::Transaction,
        index,
    })?;

    let transaction_id = first_field(record, TRANSACTION_ID_FIELDS)
        .and_then(parse_id)
        .ok_or(DataFormatError::MissingField {
            record: RecordKind::Transaction,
            index,
            field: "transactionId",
        })?;

    let user_id = record
        .get("userId")
        .and_then(parse_id)
        .ok_or(DataFormatError::MissingField {
            record: RecordKind::Transaction,
            index,
            field: "userId",
        })?;

    let amount = parse_amount(
        record.get("amount"),
        RecordKind::Transaction,
        &transaction_id,
    );
    let status = parse_status(record.get("status"), &transaction_id);
    let description = match record.get("description") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let payment_date = first_field(record, PAYMENT_DATE_FIELDS).and_then(parse_timestamp);

    Ok(TransactionRecord {
        transaction_id: TransactionId::new(transaction_id),
        user_id: StudentId::new(user_id),
        amount,
        status,
        description,
        payment_date,
    })
}

/// Parse a batch of transaction records, skipping the malformed ones
pub fn parse_transactions(values: &[Value]) -> Parsed<TransactionRecord> {
    parse_batch(values, RecordKind::Transaction, parse_transaction)
}

/// Parse a student profile; unknown or mistyped fields are left empty
pub fn parse_student_profile(value: &Value) -> StudentProfile {
    let text = |field: &str| value.get(field).and_then(parse_id);
    StudentProfile {
        name: text("name"),
        admission_no: text("admissionNo"),
        student_class: text("studentClass"),
    }
}

fn parse_batch<T>(
    values: &[Value],
    kind: RecordKind,
    parse: impl Fn(&Value, usize) -> Result<T, DataFormatError>,
) -> Parsed<T> {
    let mut parsed = Parsed::default();
    for (index, value) in values.iter().enumerate() {
        match parse(value, index) {
            Ok(record) => parsed.records.push(record),
            Err(err) => {
                warn!(record = %kind, error = %err, "skipping malformed record");
                parsed.rejected.push(err);
            }
        }
    }
    debug!(
        record = %kind,
        accepted = parsed.records.len(),
        rejected = parsed.rejected.len(),
        "parsed backend records"
    );
    parsed
}

/// First of `names` holding something other than null or a blank string
fn first_field<'a>(record: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| record.get(*name))
        .find(|value| match value {
            Value::Null => false,
            Value::String(text) => !text.trim().is_empty(),
            _ => true,
        })
}

/// Ids are numbers or non-blank strings, kept in their decimal string form
fn parse_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

fn parse_amount(value: Option<&Value>, kind: RecordKind, id: &str) -> BigDecimal {
    let parsed = match value {
        None | Some(Value::Null) => {
            debug!(record = %kind, id, "missing amount treated as 0");
            return BigDecimal::from(0);
        }
        Some(Value::Number(number)) => BigDecimal::from_str(&number.to_string()).ok(),
        Some(Value::String(text)) => BigDecimal::from_str(text.trim()).ok(),
        Some(_) => None,
    };

    match parsed {
        Some(amount) if amount >= BigDecimal::from(0) => amount,
        Some(amount) => {
            warn!(record = %kind, id, %amount, "negative amount coerced to 0");
            BigDecimal::from(0)
        }
        None => {
            warn!(record = %kind, id, raw = ?value, "non-numeric amount coerced to 0");
            BigDecimal::from(0)
        }
    }
}

fn parse_status(value: Option<&Value>, id: &str) -> TransactionStatus {
    let status = value
        .and_then(Value::as_str)
        .and_then(TransactionStatus::parse);
    match status {
        Some(status) => status,
        None => {
            warn!(id, raw = ?value, "unrecognised transaction status treated as pending");
            TransactionStatus::Pending
        }
    }
}

/// Accepts `YYYY-MM-DD` or a timestamp, keeping only the date part
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date()))
}

/// Accepts RFC 3339, ISO local date-times and plain dates (midnight)
pub fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    let text = value.as_str()?.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
