// src/validate.rs

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ReportError;
use crate::model::{ReportRequest, RequestInput};

const TIME_DAY_FORMAT: &str = "%Y-%m-%d";

static RECORD_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}-[0-9]$").expect("record number pattern")
});

/// Turns the raw gateway input into a validated, typed request. Runs before
/// any store access; every failure here is a `Validation` error.
pub fn set_request(input: &RequestInput) -> Result<ReportRequest, ReportError> {
    // Report type first, then the kind-specific fields, then the station id.
    match input.report_type.as_str() {
        "day" => {
            if input.date.is_empty() {
                return Err(ReportError::validation(
                    "validate.set_request",
                    "empty input.date",
                    "Error missing input.date",
                ));
            }
            let date = NaiveDate::parse_from_str(&input.date, TIME_DAY_FORMAT).map_err(|e| {
                ReportError::validation(
                    "validate.set_request",
                    e.to_string(),
                    "Error parsing input.date",
                )
            })?;
            let station_id = set_station_id(&input.station_id)?;
            Ok(ReportRequest::Day { date, station_id })
        }
        "shift" => {
            if input.record_number.is_empty() {
                return Err(ReportError::validation(
                    "validate.set_request",
                    "empty input.recordNumber",
                    "Error missing input.recordNumber",
                ));
            }
            test_record_number(&input.record_number)?;
            let station_id = set_station_id(&input.station_id)?;
            Ok(ReportRequest::Shift {
                record_number: input.record_number.clone(),
                station_id,
            })
        }
        _ => Err(ReportError::validation(
            "validate.set_request",
            "Invalid report type request",
            "Error missing or invalid input.type",
        )),
    }
}

fn set_station_id(station_id: &str) -> Result<ObjectId, ReportError> {
    if station_id.is_empty() {
        return Err(ReportError::validation(
            "validate.set_request",
            "empty input.stationID",
            "Error missing input.stationID",
        ));
    }
    ObjectId::parse_str(station_id).map_err(|e| {
        ReportError::validation(
            "validate.set_request",
            e.to_string(),
            "Error setting input.stationID",
        )
    })
}

fn test_record_number(record_number: &str) -> Result<(), ReportError> {
    if !RECORD_NUMBER_RE.is_match(record_number) {
        return Err(ReportError::validation(
            "validate.set_request",
            format!("Invalid record number submitted: {}", record_number),
            "Error setting input.recordNumber",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "2019-12-21";
    const RECORD_NUMBER: &str = "2019-12-21-2";
    const STATION_ID: &str = "56cf1815982d82b0f3000001";

    fn day_input() -> RequestInput {
        RequestInput {
            date: DATE.to_string(),
            report_type: "day".to_string(),
            station_id: STATION_ID.to_string(),
            ..Default::default()
        }
    }

    fn shift_input() -> RequestInput {
        RequestInput {
            record_number: RECORD_NUMBER.to_string(),
            report_type: "shift".to_string(),
            station_id: STATION_ID.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn set_day_request() {
        let req = set_request(&day_input()).unwrap();
        let expected_id = ObjectId::parse_str(STATION_ID).unwrap();
        match req {
            ReportRequest::Day { date, station_id } => {
                assert_eq!(date.format(TIME_DAY_FORMAT).to_string(), DATE);
                assert_eq!(station_id, expected_id);
            }
            other => panic!("expected day request, got {:?}", other),
        }
    }

    #[test]
    fn set_shift_request() {
        let req = set_request(&shift_input()).unwrap();
        match req {
            ReportRequest::Shift { record_number, .. } => {
                assert_eq!(record_number, RECORD_NUMBER);
            }
            other => panic!("expected shift request, got {:?}", other),
        }
    }

    #[test]
    fn invalid_report_type_is_rejected() {
        let mut input = day_input();
        input.report_type = "invalid".to_string();
        let err = set_request(&input).unwrap_err();
        assert_eq!(err.to_string(), "validate.set_request: Invalid report type request");
        assert_eq!(err.user_message(), "Error missing or invalid input.type");
    }

    #[test]
    fn record_number_format() {
        assert!(test_record_number(RECORD_NUMBER).is_ok());

        let err = test_record_number("2019-02-02").unwrap_err();
        assert_eq!(
            err.to_string(),
            "validate.set_request: Invalid record number submitted: 2019-02-02"
        );
    }

    #[test]
    fn missing_date_is_rejected() {
        let mut input = day_input();
        input.date = String::new();
        let err = set_request(&input).unwrap_err();
        assert_eq!(err.user_message(), "Error missing input.date");
    }

    #[test]
    fn malformed_station_id_is_rejected() {
        let mut input = shift_input();
        input.station_id = "not-hex".to_string();
        let err = set_request(&input).unwrap_err();
        assert_eq!(err.user_message(), "Error setting input.stationID");
    }

    #[test]
    fn missing_station_id_is_rejected() {
        let mut input = day_input();
        input.station_id = String::new();
        let err = set_request(&input).unwrap_err();
        assert_eq!(err.user_message(), "Error missing input.stationID");
    }
}
