// src/model.rs

use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

// ===================== Request types =====================

/// Raw request body as received from the API gateway layer.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RequestInput {
    #[serde(default)]
    pub date: String,
    #[serde(default, rename = "recordNumber")]
    pub record_number: String,
    #[serde(default, rename = "type")]
    pub report_type: String,
    #[serde(default, rename = "stationID")]
    pub station_id: String,
}

/// Validated request. Each variant carries only the fields its report kind
/// needs, so a day request cannot smuggle shift fields along.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportRequest {
    Day {
        date: NaiveDate,
        station_id: ObjectId,
    },
    Shift {
        record_number: String,
        station_id: ObjectId,
    },
}

// ===================== Raw store documents =====================

#[derive(Clone, Debug, Deserialize)]
pub struct Attendant {
    #[serde(rename = "ID")]
    pub id: ObjectId,
    #[serde(default)]
    pub adjustment: Option<String>,
    #[serde(default, rename = "overshortComplete")]
    pub overshort_complete: bool,
    #[serde(default, rename = "overshortValue")]
    pub overshort_value: Option<f64>,
    #[serde(default, rename = "sheetComplete")]
    pub sheet_complete: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Cash {
    #[serde(default)]
    pub bills: Option<f64>,
    #[serde(default)]
    pub debit: Option<f64>,
    #[serde(default, rename = "dieselDiscount")]
    pub diesel_discount: Option<f64>,
    #[serde(default, rename = "driveOffNSF")]
    pub drive_off_nsf: Option<f64>,
    #[serde(default, rename = "galesLoyaltyRedeem")]
    pub gales_loyalty_redeem: Option<f64>,
    #[serde(default, rename = "giftCertRedeem")]
    pub gift_cert_redeem: Option<f64>,
    #[serde(default, rename = "lotteryPayout")]
    pub lottery_payout: Option<f64>,
    #[serde(default)]
    pub other: Option<f64>,
    #[serde(default, rename = "osAdjusted")]
    pub os_adjusted: Option<f64>,
    #[serde(default)]
    pub payout: Option<f64>,
    #[serde(default, rename = "writeOff")]
    pub write_off: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreditCard {
    #[serde(default)]
    pub amex: Option<f64>,
    #[serde(default)]
    pub discover: Option<f64>,
    #[serde(default)]
    pub gales: Option<f64>,
    #[serde(default, rename = "mc")]
    pub mastercard: Option<f64>,
    #[serde(default)]
    pub visa: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Overshort {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub descrip: String,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct FuelType {
    #[serde(default)]
    pub dollar: f64,
    #[serde(default)]
    pub litre: f64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FuelBlock {
    #[serde(default)]
    pub fuel_1: Option<FuelType>,
    #[serde(default)]
    pub fuel_2: Option<FuelType>,
    #[serde(default)]
    pub fuel_3: Option<FuelType>,
    #[serde(default)]
    pub fuel_4: Option<FuelType>,
    #[serde(default)]
    pub fuel_5: Option<FuelType>,
    #[serde(default)]
    pub fuel_6: Option<FuelType>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SalesSummary {
    #[serde(default)]
    pub fuel: FuelBlock,
    #[serde(default, rename = "bobsFuelAdj")]
    pub fuel_adjust: Option<f64>,
    #[serde(default, rename = "fuelDollar")]
    pub fuel_dollar: Option<f64>,
    #[serde(default, rename = "fuelLitre")]
    pub fuel_litre: Option<f64>,
    #[serde(default, rename = "otherFuelDollar")]
    pub other_fuel_dollar: Option<f64>,
    #[serde(default, rename = "otherFuelLitre")]
    pub other_fuel_litre: Option<f64>,
    #[serde(default, rename = "totalNonFuel")]
    pub total_non_fuel: Option<f64>,
    #[serde(default, rename = "totalSales")]
    pub total_sales: Option<f64>,
}

/// One raw per-shift sales document.
#[derive(Clone, Debug, Deserialize)]
pub struct SalesDoc {
    #[serde(rename = "recordNum")]
    pub record_num: String,
    #[serde(rename = "stationID")]
    pub station_id: ObjectId,
    pub attendant: Attendant,
    #[serde(default)]
    pub cash: Cash,
    #[serde(default, rename = "creditCard")]
    pub credit_card: CreditCard,
    #[serde(default)]
    pub overshort: Overshort,
    #[serde(default, rename = "salesSummary")]
    pub summary: SalesSummary,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "nameFirst")]
    pub name_first: String,
    #[serde(rename = "nameLast")]
    pub name_last: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Station {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AdjustAttend {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default, rename = "productName")]
    pub product_name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct JournalValues {
    #[serde(default, rename = "adjustAttend")]
    pub adjust_attend: AdjustAttend,
}

/// One non-fuel sales adjustment entry.
#[derive(Clone, Debug, Deserialize)]
pub struct Journal {
    #[serde(
        rename = "adjustDate",
        with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub adjust_date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub adjust_type: String,
    #[serde(rename = "recordNum")]
    pub record_num: String,
    #[serde(default)]
    pub values: JournalValues,
}

// ===================== Report records =====================

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CardFields {
    pub visa: f64,
    pub mastercard: f64,
    pub gales: f64,
    pub amex: f64,
    pub discover: f64,
    pub debit: f64,
    pub diesel_discount: f64,
    pub total_cards: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CashFields {
    pub cash: f64,
    pub drive_off_nsf: f64,
    pub gales_loyalty_redeem: f64,
    pub gift_cert_redeem: f64,
    pub lottery_payout: f64,
    pub os_adjusted: f64,
    pub other: f64,
    pub payout: f64,
    pub write_off: f64,
    pub total_cash: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FuelGrade {
    pub dollar: f64,
    pub litre: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FuelSummary {
    /// Grades 1 through 6, in pump order.
    pub grades: [FuelGrade; 6],
    pub total_dollar: f64,
    pub total_litre: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DaySummary {
    pub non_fuel: f64,
    pub total: f64,
    pub total_cash_cards: f64,
}

/// Display-ready day report record; the sole renderer input for day reports.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayRecord {
    pub date: String,
    pub station_id: ObjectId,
    pub station_name: String,
    pub cards: CardFields,
    pub cash: CashFields,
    pub fuel: FuelSummary,
    pub summary: DaySummary,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AttendantFields {
    pub adjustment: String,
    pub name: String,
    pub overshort_complete: String,
    pub overshort_value: f64,
    pub sheet_complete: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ShiftSummary {
    pub fuel: f64,
    pub other_fuel_dollar: f64,
    pub other_fuel_litre: f64,
    pub litres: f64,
    pub non_fuel: f64,
    pub fuel_adjust: f64,
    pub total: f64,
    pub total_cash_cards: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NonFuelJournal {
    pub adjust_date: DateTime<Utc>,
    pub amount: f64,
    pub comments: String,
    pub description: String,
    pub product_name: String,
}

/// Display-ready shift report record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShiftRecord {
    pub record_number: String,
    pub station_id: ObjectId,
    pub station_name: String,
    pub attendant: AttendantFields,
    pub cards: CardFields,
    pub cash: CashFields,
    pub overshort_amount: f64,
    pub overshort_descrip: String,
    pub product_adjust: Vec<NonFuelJournal>,
    pub summary: ShiftSummary,
}

// ===================== Response envelope =====================

#[derive(Clone, Debug, Serialize)]
pub struct SignedUrl {
    pub url: String,
}

/// Generic response envelope shared by success and failure paths.
#[derive(Clone, Debug, Serialize)]
pub struct Response {
    pub code: u16,
    pub data: Option<SignedUrl>,
    pub message: String,
    pub status: &'static str,
    pub timestamp: i64,
}

impl Response {
    pub fn success(url: String, timestamp: i64) -> Self {
        Self {
            code: 201,
            data: Some(SignedUrl { url }),
            message: String::new(),
            status: "success",
            timestamp,
        }
    }

    pub fn failure(err: &ReportError, timestamp: i64) -> Self {
        Self {
            code: 500,
            data: None,
            message: err.user_message(),
            status: "error",
            timestamp,
        }
    }
}

// ===================== Helpers =====================

/// Reads a numeric field out of an aggregation row, coalescing missing,
/// null, and any integer width to an `f64`. Mirrors the store convention
/// that an absent value means zero.
pub fn num_field(doc: &Document, key: &str) -> f64 {
    match doc.get(key) {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn num_field_defaults_missing_and_null_to_zero() {
        let row = doc! { "cash_bills": Bson::Null };
        assert_eq!(num_field(&row, "cash_bills"), 0.0);
        assert_eq!(num_field(&row, "cash_debit"), 0.0);
    }

    #[test]
    fn num_field_accepts_any_numeric_width() {
        let row = doc! { "a": 12.5, "b": 3_i32, "c": 9_i64 };
        assert_eq!(num_field(&row, "a"), 12.5);
        assert_eq!(num_field(&row, "b"), 3.0);
        assert_eq!(num_field(&row, "c"), 9.0);
    }

    #[test]
    fn envelope_success_shape() {
        let resp = Response::success("https://example.com/x.pdf".to_string(), 42);
        assert_eq!(resp.code, 201);
        assert_eq!(resp.status, "success");
        assert!(resp.message.is_empty());
        assert_eq!(resp.data.unwrap().url, "https://example.com/x.pdf");
    }

    #[test]
    fn envelope_failure_uses_user_message() {
        let err = ReportError::dependency("db.connect", "tls handshake failed", "Internal error");
        let resp = Response::failure(&err, 42);
        assert_eq!(resp.code, 500);
        assert_eq!(resp.status, "error");
        assert_eq!(resp.message, "Internal error");
        assert!(resp.data.is_none());
    }

    #[test]
    fn shift_doc_tolerates_sparse_documents() {
        let raw = doc! {
            "recordNum": "2019-12-21-2",
            "stationID": ObjectId::new(),
            "attendant": { "ID": ObjectId::new() },
        };
        let shift: SalesDoc = mongodb::bson::from_document(raw).unwrap();
        assert!(shift.cash.bills.is_none());
        assert!(shift.summary.fuel.fuel_1.is_none());
        assert_eq!(shift.overshort.descrip, "");
    }
}
