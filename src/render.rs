use std::ops::RangeInclusive;

use bon::Builder;
use geojson::FeatureCollection;
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::{
    core::{
        aggregate::aggregate_all,
        boundary::{Boundaries, match_boundaries},
        selection::Selection,
        store::DatasetStore,
    },
    prelude::*,
    quantity::price::MegawattHourPrice,
};

const COLOR_SCALE: &str = "Viridis";
const NO_DATA_COLOR: &str = "#d3d3d3";

/// Everything a request needs, built once at startup and never mutated.
#[must_use]
#[derive(Builder)]
pub struct Dashboard {
    store: DatasetStore,
    boundaries: Boundaries,

    /// Years offered by the year selector.
    years: RangeInclusive<i32>,
}

/// Declarative choropleth, ready to be handed over to the charting library.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapSpec {
    pub title: String,
    pub year: i32,

    /// Regions to shade, in selection order.
    pub regions: Vec<MapRegion>,

    /// Matched countries without a single record in the year.
    pub no_data: Vec<String>,

    /// Selected countries which could not be placed on the map.
    pub unmatched: Vec<String>,

    pub color_scale: ColorScale,

    /// Boundaries of the regions, with feature IDs set to the country names.
    pub geojson: FeatureCollection,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MapRegion {
    pub country: String,
    pub average_price: Option<MegawattHourPrice>,
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColorScale {
    pub name: &'static str,

    /// Minimum and maximum of the defined averages, `None` when there are none.
    pub domain: Option<[MegawattHourPrice; 2]>,

    pub no_data_color: &'static str,
}

impl ColorScale {
    fn spanning(prices: impl IntoIterator<Item = MegawattHourPrice>) -> Self {
        let domain = match prices.into_iter().minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(price) => Some([price, price]),
            MinMaxResult::MinMax(min, max) => Some([min, max]),
        };
        Self { name: COLOR_SCALE, domain, no_data_color: NO_DATA_COLOR }
    }
}

/// All years of the configured range, sharing one colour scale.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnimationSpec {
    pub frames: Vec<MapSpec>,
    pub color_scale: ColorScale,
}

impl Dashboard {
    #[must_use]
    pub fn countries(&self) -> &[String] {
        self.store.countries()
    }

    #[must_use]
    pub fn years(&self) -> RangeInclusive<i32> {
        self.years.clone()
    }

    #[must_use]
    pub const fn store(&self) -> &DatasetStore {
        &self.store
    }

    #[must_use]
    pub const fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// First year with every configured country selected.
    pub fn default_selection(&self) -> Selection {
        Selection::new(*self.years.start(), self.countries().to_vec())
    }

    #[instrument(skip_all, fields(year = selection.year, n_countries = selection.countries.len()))]
    pub fn render(&self, selection: &Selection) -> MapSpec {
        let aggregates = aggregate_all(&self.store, &selection.countries, selection.year);
        let join = match_boundaries(aggregates, &self.boundaries);

        let regions = join
            .matched
            .iter()
            .map(|(_, aggregate)| MapRegion {
                country: aggregate.country.clone(),
                average_price: aggregate.average_price,
            })
            .collect_vec();
        let no_data = regions
            .iter()
            .filter(|region| region.average_price.is_none())
            .map(|region| region.country.clone())
            .collect_vec();
        let color_scale = ColorScale::spanning(regions.iter().filter_map(|region| region.average_price));
        let features = join.matched.iter().map(|(polygon, _)| polygon.to_feature()).collect();

        debug!(
            n_regions = regions.len(),
            n_no_data = no_data.len(),
            n_unmatched = join.unmatched.len(),
            "rendered",
        );
        MapSpec {
            title: format!("Average Electricity Prices in Europe for {}", selection.year),
            year: selection.year,
            regions,
            no_data,
            unmatched: join.unmatched,
            color_scale,
            geojson: FeatureCollection { bbox: None, features, foreign_members: None },
        }
    }

    /// Render every configured year for the countries, so that the frames are comparable.
    #[instrument(skip_all, fields(n_countries = countries.len()))]
    pub fn render_animation(&self, countries: &[String]) -> AnimationSpec {
        let mut frames = self
            .years()
            .map(|year| self.render(&Selection::new(year, countries.to_vec())))
            .collect_vec();
        let color_scale = ColorScale::spanning(
            frames.iter().filter_map(|frame| frame.color_scale.domain).flatten(),
        );
        for frame in &mut frames {
            frame.color_scale = color_scale;
        }
        AnimationSpec { frames, color_scale }
    }
}
