use std::{
    collections::{BTreeSet, HashMap},
    fs::File,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use itertools::Itertools;
use serde::Deserialize;

use crate::{core::series::CountrySeries, prelude::*, quantity::price::MegawattHourPrice};

pub const TIMESTAMP_COLUMN: &str = "Datetime (Local)";
pub const PRICE_COLUMN: &str = "Price (EUR/MWhe)";

/// Cells meaning "no observation" besides the blank one.
const MISSING_PRICES: [&str; 6] = ["NaN", "nan", "NA", "N/A", "null", "NULL"];

const TIMESTAMP_LAYOUTS: [&str; 4] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("failed to open `{}`", path.display())]
    Io {
        path: PathBuf,

        #[source]
        source: std::io::Error,
    },

    #[error("`{}` has no `{column}` column", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("malformed data in `{}`", path.display())]
    Csv {
        path: PathBuf,

        #[source]
        source: csv::Error,
    },

    #[error("unparseable timestamp `{value}` in `{}` at line {line}", path.display())]
    InvalidTimestamp { path: PathBuf, line: u64, value: String },

    #[error("unparseable price `{value}` in `{}` at line {line}", path.display())]
    InvalidPrice { path: PathBuf, line: u64, value: String },
}

#[derive(Deserialize)]
struct Row {
    #[serde(rename = "Datetime (Local)")]
    timestamp: String,

    #[serde(rename = "Price (EUR/MWhe)")]
    price: String,
}

/// Immutable per-country price series, loaded once at startup.
#[must_use]
pub struct DatasetStore {
    /// Configured order, used as the default selection.
    countries: Vec<String>,

    series: HashMap<String, CountrySeries>,
}

impl DatasetStore {
    /// Load `<data_dir>/<country>.csv` for every country.
    #[instrument(skip_all, fields(data_dir = %data_dir.display()))]
    pub fn load(data_dir: &Path, countries: &[String]) -> Result<Self, DataLoadError> {
        let series = countries
            .iter()
            .unique()
            .map(|country| load_series(&data_dir.join(format!("{country}.csv")), country))
            .collect::<Result<Vec<_>, _>>()?;
        info!(n_countries = series.len(), "loaded the price data");
        Ok(Self::from_series(series))
    }

    pub fn from_series(series: impl IntoIterator<Item = CountrySeries>) -> Self {
        let mut countries = Vec::new();
        let mut by_country = HashMap::new();
        for series in series {
            if !by_country.contains_key(series.country()) {
                countries.push(series.country().to_owned());
                by_country.insert(series.country().to_owned(), series);
            }
        }
        Self { countries, series: by_country }
    }

    #[must_use]
    pub fn get(&self, country: &str) -> Option<&CountrySeries> {
        self.series.get(country)
    }

    #[must_use]
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// All years having at least one record in any country.
    #[must_use]
    pub fn years(&self) -> BTreeSet<i32> {
        self.series.values().flat_map(CountrySeries::years).collect()
    }
}

#[instrument(skip_all, fields(path = %path.display()))]
fn load_series(path: &Path, country: &str) -> Result<CountrySeries, DataLoadError> {
    let file =
        File::open(path).map_err(|source| DataLoadError::Io { path: path.to_owned(), source })?;
    let csv_error = |source: csv::Error| DataLoadError::Csv { path: path.to_owned(), source };
    let mut reader = ReaderBuilder::new().has_headers(true).trim(Trim::All).from_reader(file);

    let headers = reader.headers().map_err(csv_error)?.clone();
    verify_columns(path, &headers)?;

    let mut observations = Vec::new();
    let mut n_blanks = 0_usize;
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let row: Row = record.deserialize(Some(&headers)).map_err(csv_error)?;
        let line = record.position().map_or(0, csv::Position::line);
        let timestamp =
            parse_timestamp(&row.timestamp).ok_or_else(|| DataLoadError::InvalidTimestamp {
                path: path.to_owned(),
                line,
                value: row.timestamp.clone(),
            })?;
        let price = parse_price(&row.price).ok_or_else(|| DataLoadError::InvalidPrice {
            path: path.to_owned(),
            line,
            value: row.price.clone(),
        })?;
        match price {
            Some(price) => observations.push((timestamp, MegawattHourPrice(price))),
            None => n_blanks += 1,
        }
    }
    debug!(n_records = observations.len(), n_blanks, "parsed");
    Ok(CountrySeries::new(country, observations))
}

fn verify_columns(path: &Path, headers: &StringRecord) -> Result<(), DataLoadError> {
    for column in [TIMESTAMP_COLUMN, PRICE_COLUMN] {
        if !headers.iter().any(|header| header == column) {
            return Err(DataLoadError::MissingColumn { path: path.to_owned(), column });
        }
    }
    Ok(())
}

/// Parse a price cell, `Some(None)` for a missing observation.
///
/// Blank cells, the usual NA markers, and non-finite numbers are all missing observations.
fn parse_price(value: &str) -> Option<Option<f64>> {
    if value.is_empty() || MISSING_PRICES.contains(&value) {
        return Some(None);
    }
    let price: f64 = value.parse().ok()?;
    Some(price.is_finite().then_some(price))
}

/// Parse a local timestamp, keeping the wall-clock time when an offset is present.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|timestamp| timestamp.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(|date| date.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use approx::assert_relative_eq;
    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, country: &str, contents: &str) -> Result {
        fs::write(dir.path().join(format!("{country}.csv")), contents)?;
        Ok(())
    }

    #[test]
    fn test_load_ok() -> Result {
        let dir = TempDir::new()?;
        write(
            &dir,
            "France",
            "Country,ISO3 Code,Datetime (UTC),Datetime (Local),Price (EUR/MWhe)\n\
             France,FRA,2019-12-31 23:00:00,2020-01-01 00:00:00,40.0\n\
             France,FRA,2020-01-01 00:00:00,2020-01-01 01:00:00,\n\
             France,FRA,2020-01-01 01:00:00,2020-01-01 02:00:00, 50.4 \n\
             France,FRA,2014-12-31 23:00:00,2015-01-01 00:00:00,10.0\n",
        )?;
        write(&dir, "Germany", "Datetime (Local),Price (EUR/MWhe)\n2021-06-01 12:00:00,-5.5\n")?;

        let countries = ["France", "Germany", "France"].map(String::from);
        let store = DatasetStore::load(dir.path(), &countries)?;
        assert_eq!(store.countries(), ["France", "Germany"]);
        assert_eq!(store.years().into_iter().collect_vec(), vec![2015, 2020, 2021]);

        let france = store.get("France").context("France is missing")?;
        assert_eq!(france.records().len(), 3);
        assert_eq!(france.records()[0].year(), 2015);
        assert_relative_eq!(france.mean_price(2020).context("no 2020 mean")?.0, 45.2);
        assert_relative_eq!(
            store.get("Germany").context("Germany is missing")?.mean_price(2021).unwrap().0,
            -5.5,
        );
        Ok(())
    }

    #[test]
    fn test_load_missing_file() -> Result {
        let dir = TempDir::new()?;
        let error = DatasetStore::load(dir.path(), &["Atlantis".to_owned()]).err().unwrap();
        assert!(matches!(error, DataLoadError::Io { .. }), "{error:?}");
        Ok(())
    }

    #[test]
    fn test_load_missing_column() -> Result {
        let dir = TempDir::new()?;
        write(&dir, "Spain", "Datetime (UTC),Price (EUR/MWhe)\n2020-01-01 00:00:00,1.0\n")?;
        let error = DatasetStore::load(dir.path(), &["Spain".to_owned()]).err().unwrap();
        assert!(
            matches!(error, DataLoadError::MissingColumn { column: TIMESTAMP_COLUMN, .. }),
            "{error:?}",
        );
        Ok(())
    }

    #[test]
    fn test_load_invalid_timestamp() -> Result {
        let dir = TempDir::new()?;
        write(
            &dir,
            "Italy",
            "Datetime (Local),Price (EUR/MWhe)\n2020-01-01 00:00:00,1.0\nyesterday,2.0\n",
        )?;
        let error = DatasetStore::load(dir.path(), &["Italy".to_owned()]).err().unwrap();
        match error {
            DataLoadError::InvalidTimestamp { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "yesterday");
            }
            _ => bail!("unexpected error: {error:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_load_invalid_price() -> Result {
        let dir = TempDir::new()?;
        write(&dir, "Greece", "Datetime (Local),Price (EUR/MWhe)\n2020-01-01 00:00:00,cheap\n")?;
        let error = DatasetStore::load(dir.path(), &["Greece".to_owned()]).err().unwrap();
        match error {
            DataLoadError::InvalidPrice { line, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(value, "cheap");
            }
            _ => bail!("unexpected error: {error:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_load_skips_missing_prices() -> Result {
        let dir = TempDir::new()?;
        write(
            &dir,
            "France",
            "Datetime (Local),Price (EUR/MWhe)\n\
             2020-01-01 00:00:00,40.0\n\
             2020-01-01 01:00:00,NaN\n\
             2020-01-01 02:00:00,NA\n\
             2020-01-01 03:00:00,N/A\n\
             2020-01-01 04:00:00,nan\n\
             2020-01-01 05:00:00,null\n\
             2020-01-01 06:00:00,inf\n\
             2020-01-01 07:00:00,50.0\n",
        )?;
        let store = DatasetStore::load(dir.path(), &["France".to_owned()])?;
        let france = store.get("France").context("France is missing")?;
        assert_eq!(france.records().len(), 2);
        assert_relative_eq!(france.mean_price(2020).context("no 2020 mean")?.0, 45.0);
        Ok(())
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("-12.5"), Some(Some(-12.5)));
        assert_eq!(parse_price(""), Some(None));
        assert_eq!(parse_price("NaN"), Some(None));
        assert_eq!(parse_price("-inf"), Some(None));
        assert_eq!(parse_price("cheap"), None);
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        for value in [
            "2020-05-17 13:00:00",
            "2020-05-17T13:00:00",
            "2020-05-17 13:00",
            "2020-05-17T13:00:00+02:00",
        ] {
            let timestamp = parse_timestamp(value).unwrap();
            assert_eq!((timestamp.year(), timestamp.month(), timestamp.hour()), (2020, 5, 13));
        }
        let midnight = parse_timestamp("2020-05-17").unwrap();
        assert_eq!((midnight.day(), midnight.hour()), (17, 0));
        assert_eq!(parse_timestamp("17/05/2020"), None);
    }
}
