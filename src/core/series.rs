use std::{collections::BTreeMap, ops::Range};

use average::Mean;
use chrono::NaiveDateTime;
use itertools::Itertools;

use crate::{core::record::PriceRecord, quantity::price::MegawattHourPrice};

/// Time-ordered price records of one country, indexed by year.
#[must_use]
#[derive(Debug)]
pub struct CountrySeries {
    country: String,
    records: Vec<PriceRecord>,

    /// Records of each year occupy a contiguous range since they are sorted by time.
    years: BTreeMap<i32, Range<usize>>,
}

impl CountrySeries {
    pub fn new(
        country: impl Into<String>,
        observations: impl IntoIterator<Item = (NaiveDateTime, MegawattHourPrice)>,
    ) -> Self {
        let country = country.into();
        let records = observations
            .into_iter()
            .map(|(timestamp, price)| PriceRecord::new(timestamp, price))
            .sorted_by_key(PriceRecord::timestamp)
            .collect_vec();
        let mut years: BTreeMap<i32, Range<usize>> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            years
                .entry(record.year())
                .and_modify(|range| range.end = index + 1)
                .or_insert(index..(index + 1));
        }
        Self { country, records, years }
    }

    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }

    #[must_use]
    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    #[must_use]
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.years.keys().copied()
    }

    /// Records of the specified year, empty if there are none.
    #[must_use]
    pub fn year(&self, year: i32) -> &[PriceRecord] {
        match self.years.get(&year) {
            Some(range) => &self.records[range.clone()],
            None => &[],
        }
    }

    /// Arithmetic mean price over the year, or `None` if the year has no records.
    #[must_use]
    pub fn mean_price(&self, year: i32) -> Option<MegawattHourPrice> {
        mean_price(self.year(year))
    }

    /// Mean price per calendar month of the year, January first.
    #[must_use]
    pub fn mean_monthly_prices(&self, year: i32) -> [Option<MegawattHourPrice>; 12] {
        let mut means = [None; 12];
        let chunks = self.year(year).iter().chunk_by(|record| record.month());
        for (month, records) in &chunks {
            let estimate: Mean = records.map(|record| record.price().0).collect();
            means[(month - 1) as usize] = Some(MegawattHourPrice(estimate.mean()));
        }
        means
    }
}

fn mean_price(records: &[PriceRecord]) -> Option<MegawattHourPrice> {
    let estimate: Mean = records.iter().map(|record| record.price().0).collect();
    if estimate.is_empty() { None } else { Some(MegawattHourPrice(estimate.mean())) }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    fn series(observations: &[(NaiveDateTime, f64)]) -> CountrySeries {
        CountrySeries::new(
            "France",
            observations.iter().map(|(timestamp, price)| (*timestamp, MegawattHourPrice(*price))),
        )
    }

    #[test]
    fn test_records_are_sorted_and_indexed() {
        let series = series(&[
            (at(2021, 1, 1, 0), 3.0),
            (at(2019, 6, 1, 0), 1.0),
            (at(2020, 12, 31, 23), 2.0),
            (at(2019, 1, 1, 0), 0.0),
        ]);
        let prices = series.records().iter().map(|record| record.price().0).collect_vec();
        assert_eq!(prices, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(series.years().collect_vec(), vec![2019, 2020, 2021]);
        assert_eq!(series.year(2019).len(), 2);
        assert_eq!(series.year(2020).len(), 1);
        assert!(series.year(2022).is_empty());
    }

    #[test]
    fn test_mean_price() {
        let series = series(&[
            (at(2020, 1, 1, 0), 40.0),
            (at(2020, 1, 1, 1), 50.4),
            (at(2020, 7, 1, 0), 45.2),
            (at(2021, 1, 1, 0), 1000.0),
        ]);
        assert_relative_eq!(series.mean_price(2020).unwrap().0, 45.2, max_relative = 1e-9);
    }

    #[test]
    fn test_mean_price_missing_year() {
        let series = series(&[(at(2020, 1, 1, 0), 40.0)]);
        assert_eq!(series.mean_price(2019), None);
    }

    #[test]
    fn test_mean_price_within_bounds() {
        let prices = [-12.5, 0.0, 87.3, 310.0, 45.25, 45.25, 12.0];
        let series = series(
            &prices
                .iter()
                .enumerate()
                .map(|(hour, price)| (at(2022, 2, 1, hour as u32), *price))
                .collect_vec(),
        );
        let mean = series.mean_price(2022).unwrap().0;
        assert!((-12.5..=310.0).contains(&mean));
    }

    #[test]
    fn test_mean_price_order_independent() {
        let forward = (0..24).map(|hour| (at(2023, 5, 1, hour), f64::from(hour) * 1.1)).collect_vec();
        let backward = forward.iter().rev().copied().collect_vec();
        assert_relative_eq!(
            series(&forward).mean_price(2023).unwrap().0,
            series(&backward).mean_price(2023).unwrap().0,
            max_relative = 1e-9,
        );
    }

    #[test]
    fn test_mean_monthly_prices() {
        let series = series(&[
            (at(2020, 1, 1, 0), 10.0),
            (at(2020, 1, 2, 0), 20.0),
            (at(2020, 3, 1, 0), 30.0),
        ]);
        let means = series.mean_monthly_prices(2020);
        assert_relative_eq!(means[0].unwrap().0, 15.0);
        assert_eq!(means[1], None);
        assert_relative_eq!(means[2].unwrap().0, 30.0);
        assert!(means[3..].iter().all(Option::is_none));
    }
}
