use serde::Serialize;

use crate::schemas::Revenue;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RevenueSummary {
    pub total_received: f64,
    pub total_forecast: f64,
}

pub fn summarize(revenues: &[Revenue]) -> RevenueSummary {
    revenues
        .iter()
        .fold(RevenueSummary::default(), |mut summary, revenue| {
            if revenue.received {
                summary.total_received += revenue.amount;
            } else {
                summary.total_forecast += revenue.amount;
            }
            summary
        })
}

/// Received revenues newest first, then forecasts soonest first.
pub fn order_for_listing(mut revenues: Vec<Revenue>) -> Vec<Revenue> {
    revenues.sort_by(|a, b| match (a.received, b.received) {
        (true, true) => b.date.cmp(&a.date),
        (false, false) => a.date.cmp(&b.date),
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
    });
    revenues
}
