// src/report.rs

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use mongodb::bson::Document;
use tracing::info;

use crate::config::Config;
use crate::db::Db;
use crate::error::ReportError;
use crate::model::{
    AttendantFields, CardFields, CashFields, DayRecord, DaySummary, Employee, FuelGrade,
    FuelSummary, Journal, NonFuelJournal, ReportRequest, SalesDoc, ShiftRecord, ShiftSummary,
    Station, num_field,
};
use crate::pdf::{self, RenderedDocument};
use crate::publish::ArtifactStore;

const TIME_FORMAT_LONG: &str = "%Y-%m-%d";

/// One report invocation: owns the store handle from fetch through build,
/// releases it before rendering, and hands the finished document to the
/// artifact store.
pub struct Report {
    request: ReportRequest,
    db: Db,
}

impl Report {
    pub async fn new(request: ReportRequest, cfg: &Config) -> Result<Self, ReportError> {
        let db = Db::connect(cfg).await?;
        Ok(Self { request, db })
    }

    /// Runs the full pipeline and returns the retrievable URL.
    pub async fn create_signed_url(self, store: &impl ArtifactStore) -> Result<String, ReportError> {
        let document = self.build_document().await?;
        store.publish(&document.filename, document.bytes).await
    }

    /// Local variant used for spot-checking output without an artifact store.
    pub async fn save_to_disk(self, dir: &Path) -> Result<PathBuf, ReportError> {
        let document = self.build_document().await?;
        let path = dir.join(&document.filename);
        fs::write(&path, &document.bytes)
            .map_err(|e| ReportError::render("report.save_to_disk", e.to_string()))?;
        info!(path = %path.display(), "report written to disk");
        Ok(path)
    }

    async fn build_document(self) -> Result<RenderedDocument, ReportError> {
        match self.request.clone() {
            ReportRequest::Day { date, station_id } => {
                let row = self.db.fetch_day_aggregate(date, station_id).await?;
                let station = self.db.fetch_station(station_id).await?;
                self.db.close();

                let record = build_day_record(date, &row, &station);
                pdf::render_day(&record)
            }
            ReportRequest::Shift {
                record_number,
                station_id,
            } => {
                let shift = self.db.fetch_shift(&record_number, station_id).await?;
                let employee = self.db.fetch_employee(shift.attendant.id).await?;
                let journals = self.db.fetch_journals(&record_number, station_id).await?;
                let station = self.db.fetch_station(shift.station_id).await?;
                self.db.close();

                let record = build_shift_record(shift, &employee, &station, journals);
                pdf::render_shift(&record)
            }
        }
    }
}

/// Pure field-rename/default-fill step; the aggregation already did all the
/// arithmetic.
pub fn build_day_record(date: NaiveDate, row: &Document, station: &Station) -> DayRecord {
    let grade = |n: u8| FuelGrade {
        dollar: num_field(row, &format!("fuel_{}_dollar", n)),
        litre: num_field(row, &format!("fuel_{}_litre", n)),
    };

    let fuel = FuelSummary {
        grades: [grade(1), grade(2), grade(3), grade(4), grade(5), grade(6)],
        total_dollar: num_field(row, "total_fuelDollar"),
        total_litre: num_field(row, "total_fuelLitre"),
    };

    let cards = CardFields {
        amex: num_field(row, "cc_amex"),
        discover: num_field(row, "cc_discover"),
        gales: num_field(row, "cc_gales"),
        mastercard: num_field(row, "cc_mastercard"),
        visa: num_field(row, "cc_visa"),
        debit: num_field(row, "cash_debit"),
        diesel_discount: num_field(row, "cash_dieselDiscount"),
        ..Default::default()
    };

    let cash = CashFields {
        cash: num_field(row, "cash_bills"),
        other: num_field(row, "cash_other"),
        payout: num_field(row, "cash_payout"),
        drive_off_nsf: num_field(row, "cash_driveOffNSF"),
        gales_loyalty_redeem: num_field(row, "cash_galesLoyaltyRedeem"),
        gift_cert_redeem: num_field(row, "cash_giftCertRedeem"),
        lottery_payout: num_field(row, "cash_lotteryPayout"),
        os_adjusted: num_field(row, "cash_osAdjusted"),
        write_off: num_field(row, "cash_writeOff"),
        ..Default::default()
    };

    let summary = DaySummary {
        non_fuel: num_field(row, "total_nonFuel"),
        total: num_field(row, "total_sales"),
        total_cash_cards: num_field(row, "total_cashAndCC"),
    };

    DayRecord {
        date: date.format(TIME_FORMAT_LONG).to_string(),
        station_id: station.id,
        station_name: station.name.clone(),
        cards,
        cash,
        fuel,
        summary,
    }
}

pub fn build_shift_record(
    shift: SalesDoc,
    employee: &Employee,
    station: &Station,
    journals: Vec<Journal>,
) -> ShiftRecord {
    let attendant = AttendantFields {
        adjustment: shift.attendant.adjustment.unwrap_or_default(),
        name: format!("{}, {}", employee.name_last, employee.name_first),
        overshort_complete: bool_str(shift.attendant.overshort_complete),
        overshort_value: shift.attendant.overshort_value.unwrap_or(0.0),
        sheet_complete: bool_str(shift.attendant.sheet_complete),
    };

    // Debit and diesel discount sit under cash in the store but count as
    // card tender; the grouping convention is preserved as-is.
    let mut cards = CardFields {
        amex: shift.credit_card.amex.unwrap_or(0.0),
        debit: shift.cash.debit.unwrap_or(0.0),
        diesel_discount: shift.cash.diesel_discount.unwrap_or(0.0),
        discover: shift.credit_card.discover.unwrap_or(0.0),
        gales: shift.credit_card.gales.unwrap_or(0.0),
        mastercard: shift.credit_card.mastercard.unwrap_or(0.0),
        visa: shift.credit_card.visa.unwrap_or(0.0),
        total_cards: 0.0,
    };
    cards.total_cards = cards.amex
        + cards.debit
        + cards.diesel_discount
        + cards.discover
        + cards.gales
        + cards.mastercard
        + cards.visa;

    let mut cash = CashFields {
        cash: shift.cash.bills.unwrap_or(0.0),
        drive_off_nsf: shift.cash.drive_off_nsf.unwrap_or(0.0),
        gales_loyalty_redeem: shift.cash.gales_loyalty_redeem.unwrap_or(0.0),
        gift_cert_redeem: shift.cash.gift_cert_redeem.unwrap_or(0.0),
        lottery_payout: shift.cash.lottery_payout.unwrap_or(0.0),
        os_adjusted: shift.cash.os_adjusted.unwrap_or(0.0),
        other: shift.cash.other.unwrap_or(0.0),
        payout: shift.cash.payout.unwrap_or(0.0),
        write_off: shift.cash.write_off.unwrap_or(0.0),
        total_cash: 0.0,
    };
    cash.total_cash = cash.cash
        + cash.drive_off_nsf
        + cash.gales_loyalty_redeem
        + cash.gift_cert_redeem
        + cash.lottery_payout
        + cash.os_adjusted
        + cash.other
        + cash.payout
        + cash.write_off;

    let product_adjust = journals
        .into_iter()
        .map(|j| NonFuelJournal {
            adjust_date: j.adjust_date,
            amount: j.values.adjust_attend.amount,
            comments: j.values.adjust_attend.comments.unwrap_or_default(),
            description: j.description,
            product_name: j.values.adjust_attend.product_name,
        })
        .collect();

    let summary = ShiftSummary {
        fuel: shift.summary.fuel_dollar.unwrap_or(0.0),
        other_fuel_dollar: shift.summary.other_fuel_dollar.unwrap_or(0.0),
        other_fuel_litre: shift.summary.other_fuel_litre.unwrap_or(0.0),
        litres: shift.summary.fuel_litre.unwrap_or(0.0),
        non_fuel: shift.summary.total_non_fuel.unwrap_or(0.0),
        fuel_adjust: shift.summary.fuel_adjust.unwrap_or(0.0),
        total: shift.summary.total_sales.unwrap_or(0.0),
        total_cash_cards: cards.total_cards + cash.total_cash,
    };

    ShiftRecord {
        record_number: shift.record_num,
        station_id: shift.station_id,
        station_name: station.name.clone(),
        attendant,
        cards,
        cash,
        overshort_amount: shift.overshort.amount.unwrap_or(0.0),
        overshort_descrip: shift.overshort.descrip,
        product_adjust,
        summary,
    }
}

fn bool_str(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mongodb::bson::{doc, from_document, oid::ObjectId};

    fn station() -> Station {
        Station {
            id: ObjectId::new(),
            name: "Bridge Station".to_string(),
        }
    }

    fn employee() -> Employee {
        Employee {
            id: ObjectId::new(),
            active: true,
            name_first: "Jane".to_string(),
            name_last: "Doe".to_string(),
        }
    }

    fn shift_doc() -> SalesDoc {
        from_document(doc! {
            "recordNum": "2019-12-21-2",
            "stationID": ObjectId::new(),
            "attendant": {
                "ID": ObjectId::new(),
                "sheetComplete": true,
                "overshortValue": -1.25,
            },
            "cash": {
                "bills": 100.0,
                "debit": 55.5,
                "dieselDiscount": 4.5,
                "driveOffNSF": 10.0,
                "galesLoyaltyRedeem": 1.0,
                "giftCertRedeem": 2.0,
                "lotteryPayout": 3.0,
                "osAdjusted": 4.0,
                "other": 5.0,
                "payout": 6.0,
                "writeOff": 7.0,
            },
            "creditCard": {
                "amex": 10.0,
                "discover": 20.0,
                "gales": 30.0,
                "mc": 40.0,
                "visa": 50.0,
            },
            "overshort": { "amount": -1.25, "descrip": "till short" },
            "salesSummary": {
                "fuelDollar": 900.0,
                "fuelLitre": 750.123,
                "otherFuelDollar": 25.0,
                "otherFuelLitre": 20.5,
                "totalNonFuel": 80.0,
                "totalSales": 1005.0,
                "bobsFuelAdj": 12.0,
            },
        })
        .unwrap()
    }

    #[test]
    fn day_record_defaults_missing_fields_to_zero() {
        let row = doc! { "_id": ObjectId::new() };
        let date = NaiveDate::from_ymd_opt(2019, 12, 21).unwrap();
        let record = build_day_record(date, &row, &station());

        assert_eq!(record.cash.cash, 0.0);
        assert_eq!(record.cards.visa, 0.0);
        assert_eq!(record.fuel.total_dollar, 0.0);
        assert_eq!(record.summary.total_cash_cards, 0.0);
        for grade in record.fuel.grades {
            assert_eq!(grade.dollar, 0.0);
            assert_eq!(grade.litre, 0.0);
        }
    }

    #[test]
    fn day_record_carries_aggregate_fields_through() {
        let row = doc! {
            "fuel_1_dollar": 500.25,
            "fuel_1_litre": 420.5,
            "fuel_6_dollar": 9.0,
            "total_fuelDollar": 509.25,
            "total_fuelLitre": 428.0,
            "cc_visa": 200.0,
            "cash_debit": 77.0,
            "total_nonFuel": 45.0,
            "total_sales": 554.25,
            "total_cashAndCC": 554.25,
        };
        let date = NaiveDate::from_ymd_opt(2019, 12, 21).unwrap();
        let record = build_day_record(date, &row, &station());

        assert_eq!(record.date, "2019-12-21");
        assert_eq!(record.station_name, "Bridge Station");
        assert_eq!(record.fuel.grades[0].dollar, 500.25);
        assert_eq!(record.fuel.grades[5].dollar, 9.0);
        assert_eq!(record.cards.visa, 200.0);
        assert_eq!(record.cards.debit, 77.0);
        assert_eq!(record.summary.non_fuel, 45.0);
        // No arithmetic of its own: totals are the aggregate's values.
        assert_eq!(record.summary.total, 554.25);
    }

    #[test]
    fn shift_card_total_is_sum_of_seven_fields() {
        let record = build_shift_record(shift_doc(), &employee(), &station(), Vec::new());
        let c = &record.cards;
        let expected = c.amex + c.debit + c.diesel_discount + c.discover + c.gales + c.mastercard + c.visa;
        assert_eq!(c.total_cards, expected);
        assert_eq!(c.total_cards, 210.0);
    }

    #[test]
    fn shift_cash_total_is_sum_of_nine_fields() {
        let record = build_shift_record(shift_doc(), &employee(), &station(), Vec::new());
        let c = &record.cash;
        let expected = c.cash
            + c.drive_off_nsf
            + c.gales_loyalty_redeem
            + c.gift_cert_redeem
            + c.lottery_payout
            + c.os_adjusted
            + c.other
            + c.payout
            + c.write_off;
        assert_eq!(c.total_cash, expected);
        assert_eq!(c.total_cash, 138.0);
    }

    #[test]
    fn shift_combined_total_is_cards_plus_cash() {
        let record = build_shift_record(shift_doc(), &employee(), &station(), Vec::new());
        assert_eq!(
            record.summary.total_cash_cards,
            record.cards.total_cards + record.cash.total_cash
        );
    }

    #[test]
    fn shift_attendant_fields_are_display_ready() {
        let record = build_shift_record(shift_doc(), &employee(), &station(), Vec::new());
        assert_eq!(record.attendant.name, "Doe, Jane");
        assert_eq!(record.attendant.sheet_complete, "true");
        assert_eq!(record.attendant.overshort_complete, "false");
        assert_eq!(record.attendant.adjustment, "");
        assert_eq!(record.attendant.overshort_value, -1.25);
    }

    #[test]
    fn shift_summary_coalesces_fuel_adjustment() {
        let mut shift = shift_doc();
        shift.summary.fuel_adjust = None;
        let record = build_shift_record(shift, &employee(), &station(), Vec::new());
        assert_eq!(record.summary.fuel_adjust, 0.0);
    }

    #[test]
    fn journal_entries_map_in_order_with_empty_comment_default() {
        let journals: Vec<Journal> = vec![
            from_document(doc! {
                "adjustDate": mongodb::bson::DateTime::from_chrono(
                    Utc.with_ymd_and_hms(2019, 12, 21, 9, 0, 0).unwrap()
                ),
                "type": "nonFuelSaleAdjust",
                "recordNum": "2019-12-21-1",
                "description": "adjust non-fuel sale",
                "values": { "adjustAttend": {
                    "amount": 12.5,
                    "productName": "Propane Refill",
                }},
            })
            .unwrap(),
            from_document(doc! {
                "adjustDate": mongodb::bson::DateTime::from_chrono(
                    Utc.with_ymd_and_hms(2019, 12, 21, 14, 0, 0).unwrap()
                ),
                "type": "nonFuelSaleAdjust",
                "recordNum": "2019-12-21-2",
                "description": "adjust non-fuel sale",
                "values": { "adjustAttend": {
                    "amount": -3.0,
                    "comments": "keyed twice",
                    "productName": "Washer Fluid",
                }},
            })
            .unwrap(),
        ];

        let record = build_shift_record(shift_doc(), &employee(), &station(), journals);
        assert_eq!(record.product_adjust.len(), 2);
        assert_eq!(record.product_adjust[0].product_name, "Propane Refill");
        assert_eq!(record.product_adjust[0].comments, "");
        assert_eq!(record.product_adjust[1].comments, "keyed twice");
        assert_eq!(record.product_adjust[1].amount, -3.0);
    }
}
