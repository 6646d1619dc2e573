// src/db.rs

use std::time::Duration;

use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime, Document},
    options::FindOptions,
    Client, Database,
};
use tokio::time::timeout;
use tracing::info;

use crate::config::Config;
use crate::error::ReportError;
use crate::model::{Employee, Journal, SalesDoc, Station};

const COL_EMPLOYEES: &str = "employees";
const COL_JOURNALS: &str = "journals";
const COL_SALES: &str = "sales";
const COL_STATIONS: &str = "stations";

// Per-call deadlines; the grouping aggregation gets the longer one.
const LOOKUP_DEADLINE: Duration = Duration::from_secs(30);
const AGGREGATE_DEADLINE: Duration = Duration::from_secs(45);

#[derive(Clone, Debug)]
pub struct Db {
    client: Client,
    db: Database,
}

impl Db {
    pub async fn connect(cfg: &Config) -> Result<Self, ReportError> {
        let client = Client::with_uri_str(&cfg.db_connect_url())
            .await
            .map_err(|e| ReportError::store("db.connect", e, "Internal error generating report"))?;

        let db = client.database(&cfg.db_name);
        db.run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| ReportError::store("db.connect", e, "Internal error generating report"))?;

        info!("connected to MongoDB");
        Ok(Self { client, db })
    }

    /// Releases the store connection. Rendering and publishing run after
    /// this; nothing downstream touches the store.
    pub fn close(self) {
        drop(self.client);
        info!("connection to MongoDB closed");
    }

    /// Groups every shift document for (date, station) into one summed row.
    /// Zero matching rows is `NotFound`, which is not a store failure.
    pub async fn fetch_day_aggregate(
        &self,
        date: NaiveDate,
        station_id: ObjectId,
    ) -> Result<Document, ReportError> {
        let col = self.db.collection::<Document>(COL_SALES);
        let pipeline = day_pipeline(date, station_id)?;

        let rows: Vec<Document> = run_query(
            "db.fetch_day_aggregate",
            AGGREGATE_DEADLINE,
            "Failed to fetch day record",
            async move { col.aggregate(pipeline, None).await?.try_collect().await },
        )
        .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| ReportError::not_found("db.fetch_day_aggregate"))
    }

    pub async fn fetch_shift(
        &self,
        record_num: &str,
        station_id: ObjectId,
    ) -> Result<SalesDoc, ReportError> {
        let col = self.db.collection::<SalesDoc>(COL_SALES);
        let filter = doc! { "recordNum": record_num, "stationID": station_id };

        let shift = run_query(
            "db.fetch_shift",
            LOOKUP_DEADLINE,
            "Failed to fetch shift record",
            async move { col.find_one(filter, None).await },
        )
        .await?;

        shift.ok_or_else(|| ReportError::not_found("db.fetch_shift"))
    }

    /// Absence of the attendant is a hard failure; the report cannot render
    /// without a name.
    pub async fn fetch_employee(&self, attendant_id: ObjectId) -> Result<Employee, ReportError> {
        let col = self.db.collection::<Employee>(COL_EMPLOYEES);
        let filter = doc! { "_id": attendant_id };

        let employee = run_query(
            "db.fetch_employee",
            LOOKUP_DEADLINE,
            "Failed to fetch employee",
            async move { col.find_one(filter, None).await },
        )
        .await?;

        employee.ok_or_else(|| {
            ReportError::dependency(
                "db.fetch_employee",
                format!("Failed to fetch employee record with id:{}", attendant_id),
                "Failed to fetch employee",
            )
        })
    }

    pub async fn fetch_station(&self, station_id: ObjectId) -> Result<Station, ReportError> {
        let col = self.db.collection::<Station>(COL_STATIONS);
        let filter = doc! { "_id": station_id };

        let station = run_query(
            "db.fetch_station",
            LOOKUP_DEADLINE,
            "Failed to fetch station",
            async move { col.find_one(filter, None).await },
        )
        .await?;

        station.ok_or_else(|| {
            ReportError::dependency(
                "db.fetch_station",
                format!("Failed to fetch station record with id:{}", station_id),
                "Failed to fetch station",
            )
        })
    }

    /// Adjustment entries for one shift, ordered by record number ascending.
    /// An empty list is a valid result.
    pub async fn fetch_journals(
        &self,
        record_num: &str,
        station_id: ObjectId,
    ) -> Result<Vec<Journal>, ReportError> {
        let col = self.db.collection::<Journal>(COL_JOURNALS);
        let filter = doc! {
            "recordNum": record_num,
            "stationID": station_id,
            "type": "nonFuelSaleAdjust",
        };
        let find_options = FindOptions::builder()
            .sort(doc! { "recordNum": 1 })
            .build();

        run_query(
            "db.fetch_journals",
            LOOKUP_DEADLINE,
            "Failed to fetch journal entries",
            async move { col.find(filter, find_options).await?.try_collect().await },
        )
        .await
    }
}

async fn run_query<T>(
    caller: &'static str,
    deadline: Duration,
    msg: &str,
    fut: impl std::future::Future<Output = mongodb::error::Result<T>>,
) -> Result<T, ReportError> {
    timeout(deadline, fut)
        .await
        .map_err(|_| ReportError::dependency(caller, "store call exceeded deadline", msg))?
        .map_err(|e| ReportError::store(caller, e, msg))
}

/// The day-report grouping pipeline: match all shifts for (date, station),
/// then sum every cash, card, fuel-grade, and precomputed-total field.
fn day_pipeline(date: NaiveDate, station_id: ObjectId) -> Result<Vec<Document>, ReportError> {
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
        ReportError::dependency(
            "db.fetch_day_aggregate",
            "invalid report date",
            "Failed to fetch day record",
        )
    })?;
    let record_date = DateTime::from_millis(midnight.timestamp_millis());

    Ok(vec![
        doc! {
            "$match": {
                "recordDate": record_date,
                "stationID": station_id,
            }
        },
        doc! {
            "$group": {
                "_id": "$stationID",
                "cash_bills": { "$sum": "$cash.bills" },
                "cash_debit": { "$sum": "$cash.debit" },
                "cash_dieselDiscount": { "$sum": "$cash.dieselDiscount" },
                "cash_other": { "$sum": "$cash.other" },
                "cash_payout": { "$sum": "$cash.payout" },
                "cash_driveOffNSF": { "$sum": "$cash.driveOffNSF" },
                "cash_galesLoyaltyRedeem": { "$sum": "$cash.galesLoyaltyRedeem" },
                "cash_giftCertRedeem": { "$sum": "$cash.giftCertRedeem" },
                "cash_lotteryPayout": { "$sum": "$cash.lotteryPayout" },
                "cash_osAdjusted": { "$sum": "$cash.osAdjusted" },
                "cash_writeOff": { "$sum": "$cash.writeOff" },
                "cc_amex": { "$sum": "$creditCard.amex" },
                "cc_discover": { "$sum": "$creditCard.discover" },
                "cc_gales": { "$sum": "$creditCard.gales" },
                "cc_mastercard": { "$sum": "$creditCard.mc" },
                "cc_visa": { "$sum": "$creditCard.visa" },
                "fuel_1_dollar": { "$sum": "$salesSummary.fuel.fuel_1.dollar" },
                "fuel_1_litre": { "$sum": "$salesSummary.fuel.fuel_1.litre" },
                "fuel_2_dollar": { "$sum": "$salesSummary.fuel.fuel_2.dollar" },
                "fuel_2_litre": { "$sum": "$salesSummary.fuel.fuel_2.litre" },
                "fuel_3_dollar": { "$sum": "$salesSummary.fuel.fuel_3.dollar" },
                "fuel_3_litre": { "$sum": "$salesSummary.fuel.fuel_3.litre" },
                "fuel_4_dollar": { "$sum": "$salesSummary.fuel.fuel_4.dollar" },
                "fuel_4_litre": { "$sum": "$salesSummary.fuel.fuel_4.litre" },
                "fuel_5_dollar": { "$sum": "$salesSummary.fuel.fuel_5.dollar" },
                "fuel_5_litre": { "$sum": "$salesSummary.fuel.fuel_5.litre" },
                "fuel_6_dollar": { "$sum": "$salesSummary.fuel.fuel_6.dollar" },
                "fuel_6_litre": { "$sum": "$salesSummary.fuel.fuel_6.litre" },
                "total_fuelDollar": { "$sum": "$salesSummary.fuelDollar" },
                "total_fuelLitre": { "$sum": "$salesSummary.fuelLitre" },
                "total_nonFuel": { "$sum": "$salesSummary.totalNonFuel" },
                "total_sales": { "$sum": "$salesSummary.totalSales" },
                "total_cash": { "$sum": "$salesSummary.cashTotal" },
                "total_cashAndCC": { "$sum": "$salesSummary.cashCCTotal" },
                "total_creditCard": { "$sum": "$salesSummary.creditCardTotal" },
                "overshort": { "$sum": "$overshort.amount" },
            }
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    #[test]
    fn day_pipeline_matches_date_and_station() {
        let station_id = ObjectId::new();
        let date = NaiveDate::from_ymd_opt(2019, 12, 21).unwrap();
        let pipeline = day_pipeline(date, station_id).unwrap();

        let matched = pipeline[0].get_document("$match").unwrap();
        assert_eq!(matched.get_object_id("stationID").unwrap(), station_id);
        let record_date = matched.get_datetime("recordDate").unwrap();
        assert_eq!(
            record_date.timestamp_millis(),
            date.and_hms_opt(0, 0, 0).unwrap().timestamp_millis()
        );
    }

    #[test]
    fn day_pipeline_sums_every_summary_field() {
        let pipeline =
            day_pipeline(NaiveDate::from_ymd_opt(2019, 12, 21).unwrap(), ObjectId::new()).unwrap();
        let group = pipeline[1].get_document("$group").unwrap();

        // _id plus 11 cash, 5 card, 12 fuel grade, 7 total, 1 overshort keys
        assert_eq!(group.len(), 37);
        assert_eq!(
            group.get_document("cash_bills").unwrap().get("$sum"),
            Some(&Bson::String("$cash.bills".to_string()))
        );
        assert_eq!(
            group.get_document("cc_mastercard").unwrap().get("$sum"),
            Some(&Bson::String("$creditCard.mc".to_string()))
        );
        assert_eq!(
            group.get_document("fuel_6_litre").unwrap().get("$sum"),
            Some(&Bson::String("$salesSummary.fuel.fuel_6.litre".to_string()))
        );
        assert_eq!(
            group.get_document("overshort").unwrap().get("$sum"),
            Some(&Bson::String("$overshort.amount".to_string()))
        );
    }
}
