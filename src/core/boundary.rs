use std::{
    collections::{BTreeMap, btree_map::Entry},
    fs::File,
    io::BufReader,
    path::Path,
};

use geojson::{Feature, GeoJson, Geometry, JsonObject, feature::Id};

use crate::{core::aggregate::YearAggregate, prelude::*};

/// Country outline keyed by the name used in the price data.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryPolygon {
    pub name: String,
    pub geometry: Geometry,
    pub properties: Option<JsonObject>,
}

impl BoundaryPolygon {
    /// Feature identified by the country name, so that the map can lock onto it by `id`.
    pub fn to_feature(&self) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(self.geometry.clone()),
            id: Some(Id::String(self.name.clone())),
            properties: self.properties.clone(),
            foreign_members: None,
        }
    }
}

/// Boundary polygons by exact name.
#[must_use]
#[derive(Debug, Default)]
pub struct Boundaries(BTreeMap<String, BoundaryPolygon>);

impl Boundaries {
    #[instrument(skip_all, fields(path = %path.display(), name_property = name_property))]
    pub fn load(path: &Path, name_property: &str) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open the boundaries at `{}`", path.display()))?;
        let geojson = GeoJson::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        let boundaries = Self::from_geojson(geojson, name_property)?;
        info!(n_boundaries = boundaries.0.len(), "loaded the boundaries");
        Ok(boundaries)
    }

    /// Collect the named features, keeping the first one on duplicate names.
    pub fn from_geojson(geojson: GeoJson, name_property: &str) -> Result<Self> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            bail!("expected a feature collection");
        };
        let mut boundaries = BTreeMap::new();
        for feature in collection.features {
            let Some(name) = feature.property(name_property).and_then(|name| name.as_str()) else {
                warn!(id = ?feature.id, "feature has no name, skipping");
                continue;
            };
            let name = name.to_owned();
            let Some(geometry) = feature.geometry else {
                warn!(%name, "feature has no geometry, skipping");
                continue;
            };
            match boundaries.entry(name) {
                Entry::Vacant(entry) => {
                    let polygon = BoundaryPolygon {
                        name: entry.key().clone(),
                        geometry,
                        properties: feature.properties,
                    };
                    entry.insert(polygon);
                }
                Entry::Occupied(entry) => {
                    warn!(name = %entry.key(), "duplicate boundary, keeping the first one");
                }
            }
        }
        Ok(Self(boundaries))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundaryPolygon> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl FromIterator<BoundaryPolygon> for Boundaries {
    fn from_iter<T: IntoIterator<Item = BoundaryPolygon>>(iter: T) -> Self {
        let mut boundaries = BTreeMap::new();
        for polygon in iter {
            boundaries.entry(polygon.name.clone()).or_insert(polygon);
        }
        Self(boundaries)
    }
}

/// Aggregates joined with their boundaries.
#[must_use]
#[derive(Debug)]
pub struct BoundaryJoin<'a> {
    /// In aggregate order.
    pub matched: Vec<(&'a BoundaryPolygon, YearAggregate)>,

    /// Countries without a boundary of the exact same name.
    pub unmatched: Vec<String>,
}

/// Join the aggregates with the boundaries on exact, case-sensitive name equality.
///
/// Names are not normalized: a country spelled differently in the two sources
/// is dropped from the map.
pub fn match_boundaries<'a>(
    aggregates: impl IntoIterator<Item = YearAggregate>,
    boundaries: &'a Boundaries,
) -> BoundaryJoin<'a> {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for aggregate in aggregates {
        if let Some(polygon) = boundaries.get(&aggregate.country) {
            matched.push((polygon, aggregate));
        } else {
            warn!(country = %aggregate.country, "no boundary matches the country name");
            unmatched.push(aggregate.country);
        }
    }
    BoundaryJoin { matched, unmatched }
}
