use serde::Serialize;

use crate::{core::store::DatasetStore, prelude::*, quantity::price::MegawattHourPrice};

/// Mean price of a country over a year.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct YearAggregate {
    pub country: String,
    pub year: i32,

    /// `None` when the country has no records in the year.
    pub average_price: Option<MegawattHourPrice>,
}

/// Aggregate the year for each requested country, in the requested order.
///
/// Every requested country yields exactly one entry, including duplicates and countries
/// the store does not know.
#[instrument(skip_all, fields(year = year, n_countries = countries.len()))]
pub fn aggregate_all(store: &DatasetStore, countries: &[String], year: i32) -> Vec<YearAggregate> {
    countries
        .iter()
        .map(|country| {
            let average_price = match store.get(country) {
                Some(series) => series.mean_price(year),
                None => {
                    warn!(%country, "unknown country");
                    None
                }
            };
            YearAggregate { country: country.clone(), year, average_price }
        })
        .collect()
}
