//! Market boundary files (GeoJSON).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use geo_types::MultiPolygon;
use hashbrown::HashMap;
use serde::de::Error as _;

use super::geojson::{Document, Feature};
use crate::error::{PipelineError, Result};
use crate::models::{Crs, MarketTable, Table, Value};

/// Load every feature of a GeoJSON boundary file as a market row.
pub fn load_markets(path: &Path) -> Result<MarketTable> {
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_markets(BufReader::new(file), path)
}

/// Same as [`load_markets`] over any reader.
pub fn read_markets<R: Read>(reader: R) -> Result<MarketTable> {
    parse_markets(reader, Path::new("-"))
}

fn parse_markets<R: Read>(reader: R, path: &Path) -> Result<MarketTable> {
    let json_error = |source: serde_json::Error| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    };

    let document: Document = serde_json::from_reader(reader).map_err(json_error)?;

    let crs = match &document.crs {
        Some(member) => member.to_crs()?,
        None => Crs::WGS84,
    };

    let features = document
        .into_features()
        .map_err(|msg| json_error(serde_json::Error::custom(msg)))?;

    let columns = property_columns(&features);
    let mut rows = Vec::with_capacity(features.len());
    let mut geometry = Vec::with_capacity(features.len());

    {
        let positions: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        for (feature_idx, feature) in features.into_iter().enumerate() {
            let mut row = vec![Value::Null; columns.len()];
            if let Some(properties) = &feature.properties {
                for (key, value) in properties {
                    row[positions[key.as_str()]] = Value::from_json(value);
                }
            }
            rows.push(row);

            let shape = match feature.geometry {
                Some(raw) => raw.into_multi_polygon(feature_idx)?,
                None => MultiPolygon::new(vec![]),
            };
            geometry.push(shape);
        }
    }

    Ok(MarketTable {
        table: Table { columns, rows },
        geometry,
        crs,
    })
}

/// Union of property names across features, in first-seen order
fn property_columns(features: &[Feature]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: hashbrown::HashSet<&str> = hashbrown::HashSet::new();

    for properties in features.iter().filter_map(|f| f.properties.as_ref()) {
        for key in properties.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }

    columns
}
