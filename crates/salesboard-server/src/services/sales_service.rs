use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::crm::models::{DealObject, DealProperties};
use crate::crm::{CrmSource, OwnerDirectory, OwnerMap};
use crate::roster::{match_owner, Roster, RosterStore};
use crate::utils::error::ApiError;

/// One dashboard bar: total closed-won amount per roster short name.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SalesRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Sales")]
    pub sales: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RejectReason {
    MissingField(&'static str),
    OtherStage,
    BadCloseDate,
    OutsideMonth,
    BadAmount,
    NoRosterMatch,
}

impl RejectReason {
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::MissingField(_) => "missing_field",
            RejectReason::OtherStage => "other_stage",
            RejectReason::BadCloseDate => "bad_close_date",
            RejectReason::OutsideMonth => "outside_month",
            RejectReason::BadAmount => "bad_amount",
            RejectReason::NoRosterMatch => "no_roster_match",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedDeal {
    pub owner_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DealCheck {
    Accepted(QualifiedDeal),
    Rejected(RejectReason),
}

/// Counts of what happened to each deal in one aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    pub accepted: usize,
    pub rejected: BTreeMap<&'static str, usize>,
}

impl AggregationReport {
    fn reject(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason.label()).or_insert(0) += 1;
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn rejected_for(&self, reason: RejectReason) -> usize {
        self.rejected.get(reason.label()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct SalesSummary {
    pub rows: Vec<SalesRow>,
    pub report: AggregationReport,
    /// False when the deal listing stopped early.
    pub complete: bool,
}

/// Validate one deal against the closed-won stage and the current month.
pub fn check_deal(props: &DealProperties, closed_won_stage: &str, today: NaiveDate) -> DealCheck {
    let present = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).is_some();

    for (field, value) in [
        ("dealstage", &props.dealstage),
        ("closedate", &props.closedate),
        ("amount", &props.amount),
        ("hubspot_owner_id", &props.hubspot_owner_id),
    ] {
        if !present(value) {
            return DealCheck::Rejected(RejectReason::MissingField(field));
        }
    }

    if props.dealstage.as_deref() != Some(closed_won_stage) {
        return DealCheck::Rejected(RejectReason::OtherStage);
    }

    let Some(closed) = props.closedate.as_deref().and_then(parse_close_date) else {
        return DealCheck::Rejected(RejectReason::BadCloseDate);
    };
    if closed.year() != today.year() || closed.month() != today.month() {
        return DealCheck::Rejected(RejectReason::OutsideMonth);
    }

    let Some(amount) = props.amount.as_deref().and_then(parse_amount) else {
        return DealCheck::Rejected(RejectReason::BadAmount);
    };

    DealCheck::Accepted(QualifiedDeal {
        owner_id: props.hubspot_owner_id.clone().unwrap_or_default(),
        amount,
    })
}

/// Calendar date of a CRM close date, taken in the timestamp's own offset.
pub fn parse_close_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    // epoch milliseconds
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive());
    }
    None
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|amount| amount.is_finite())
}

/// Sum qualifying deals per roster short name, largest total first.
pub fn aggregate<'a>(
    deals: impl IntoIterator<Item = &'a DealProperties>,
    roster: &Roster,
    owners: &OwnerMap,
    closed_won_stage: &str,
    today: NaiveDate,
) -> (Vec<SalesRow>, AggregationReport) {
    let mut totals: IndexMap<String, f64> = IndexMap::new();
    let mut report = AggregationReport::default();

    for props in deals {
        let deal = match check_deal(props, closed_won_stage, today) {
            DealCheck::Accepted(deal) => deal,
            DealCheck::Rejected(reason) => {
                debug!("Skipping deal: {:?}", reason);
                report.reject(reason);
                continue;
            }
        };

        let owner_name = owners.resolve(&deal.owner_id);
        let Some(found) = match_owner(roster, &deal.owner_id, owner_name) else {
            debug!(
                "Skipping deal of owner {} ({}): not on the roster",
                deal.owner_id, owner_name
            );
            report.reject(RejectReason::NoRosterMatch);
            continue;
        };

        *totals.entry(found.entry.short.clone()).or_insert(0.0) += deal.amount;
        report.accepted += 1;
    }

    let mut rows: Vec<SalesRow> = totals
        .into_iter()
        .map(|(name, sales)| SalesRow { name, sales })
        .collect();
    // stable: equal totals keep first-seen order
    rows.sort_by(|a, b| b.sales.partial_cmp(&a.sales).unwrap_or(Ordering::Equal));

    (rows, report)
}

pub struct SalesService {
    source: Arc<dyn CrmSource>,
    owners: Arc<OwnerDirectory>,
    roster: Arc<RosterStore>,
    closed_won_stage: String,
}

impl SalesService {
    pub fn new(
        source: Arc<dyn CrmSource>,
        owners: Arc<OwnerDirectory>,
        roster: Arc<RosterStore>,
        closed_won_stage: String,
    ) -> Self {
        Self {
            source,
            owners,
            roster,
            closed_won_stage,
        }
    }

    /// Closed-won sales of the current calendar month (local wall clock).
    pub async fn monthly_sales(&self) -> Result<SalesSummary, ApiError> {
        self.sales_for_month_of(Local::now().date_naive()).await
    }

    pub async fn sales_for_month_of(&self, today: NaiveDate) -> Result<SalesSummary, ApiError> {
        let roster = self
            .roster
            .load()
            .await
            .map_err(|e| ApiError::StorageError(e.to_string()))?;

        let outcome = self.source.deals().await;
        if let Some(halt) = &outcome.halt {
            warn!(
                "Deal listing incomplete, aggregating {} deals fetched before: {}",
                outcome.records.len(),
                halt
            );
        }

        let owners = self.owners.snapshot().await;
        let (rows, report) = aggregate(
            outcome.records.iter().map(|deal: &DealObject| &deal.properties),
            &roster,
            &owners,
            &self.closed_won_stage,
            today,
        );

        info!(
            "Aggregated {}-{:02}: {} deals accepted, {} skipped, {} people",
            today.year(),
            today.month(),
            report.accepted,
            report.rejected_total(),
            rows.len()
        );

        Ok(SalesSummary {
            rows,
            report,
            complete: outcome.is_complete(),
        })
    }
}
