use std::{ops::RangeInclusive, path::PathBuf};

use clap::Parser;

use crate::{
    core::{boundary::Boundaries, store::DatasetStore},
    prelude::*,
    render::Dashboard,
};

const DEFAULT_COUNTRIES: &str = "Austria,Belgium,Bulgaria,Croatia,Czechia,Denmark,Estonia,\
    Finland,France,Germany,Greece,Hungary,Ireland,Italy,Latvia,Lithuania,Luxembourg,\
    Netherlands,North Macedonia,Norway,Poland,Portugal,Romania,Serbia,Slovakia,Slovenia,Spain,\
    Sweden,Switzerland";

#[derive(Parser)]
pub struct DataArgs {
    /// Directory with a `<Country>.csv` file per country.
    #[clap(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// GeoJSON feature collection with the country boundaries.
    #[clap(long, env = "BOUNDARIES_PATH", default_value = "assets/europe.geojson")]
    pub boundaries_path: PathBuf,

    /// Feature property holding the country name, must match the CSV file names exactly.
    #[clap(long, env = "BOUNDARY_NAME_PROPERTY", default_value = "NAME")]
    pub boundary_name_property: String,

    #[clap(
        long,
        env = "COUNTRIES",
        value_delimiter = ',',
        num_args = 1..,
        default_value = DEFAULT_COUNTRIES,
    )]
    pub countries: Vec<String>,

    #[clap(long, env = "FIRST_YEAR", default_value = "2015")]
    pub first_year: i32,

    #[clap(long, env = "LAST_YEAR", default_value = "2023")]
    pub last_year: i32,
}

impl DataArgs {
    pub fn years(&self) -> Result<RangeInclusive<i32>> {
        ensure!(
            self.first_year <= self.last_year,
            "the first year ({}) is after the last one ({})",
            self.first_year,
            self.last_year,
        );
        Ok(self.first_year..=self.last_year)
    }

    /// Load everything the dashboard needs, failing on any unreadable price file.
    #[instrument(skip_all)]
    pub fn load_dashboard(&self) -> Result<Dashboard> {
        let years = self.years()?;
        let store = DatasetStore::load(&self.data_dir, &self.countries)
            .context("failed to load the price data")?;
        let available_years = store.years();
        for year in years.clone().filter(|year| !available_years.contains(year)) {
            warn!(year, "no prices in the year");
        }
        let boundaries = Boundaries::load(&self.boundaries_path, &self.boundary_name_property)?;
        for country in store.countries() {
            if !boundaries.contains(country) {
                warn!(%country, "the country will never appear on the map");
            }
        }
        Ok(Dashboard::builder().store(store).boundaries(boundaries).years(years).build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct TestArgs {
        #[clap(flatten)]
        data: DataArgs,
    }

    #[test]
    fn test_default_countries() -> Result {
        let args = TestArgs::try_parse_from(["test"])?;
        assert_eq!(args.data.countries.len(), 29);
        assert_eq!(args.data.countries[18], "North Macedonia");
        assert_eq!(args.data.years()?, 2015..=2023);
        Ok(())
    }

    #[test]
    fn test_custom_countries() -> Result {
        let args = TestArgs::try_parse_from(["test", "--countries", "Spain,Portugal"])?;
        assert_eq!(args.data.countries, ["Spain", "Portugal"]);
        Ok(())
    }

    #[test]
    fn test_inverted_years() -> Result {
        let args = TestArgs::try_parse_from(["test", "--first-year", "2023", "--last-year", "2015"])?;
        assert!(args.data.years().is_err());
        Ok(())
    }
}
