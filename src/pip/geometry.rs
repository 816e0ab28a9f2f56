//! Point geometry construction from coordinate columns.

use geo_types::Point;

use crate::error::{Result, SchemaError};
use crate::models::{Crs, GeoPointTable, Table, Value};

/// Attach a point geometry to every row, x = longitude, y = latitude.
///
/// Coordinate columns are found case-insensitively. Cells that do not parse
/// as numbers become NaN ordinates; nothing is filtered here, the resolver
/// rejects such rows.
pub fn build_geometries(table: Table) -> Result<GeoPointTable> {
    let lon_idx = table.column_index_ignore_case("longitude");
    let lat_idx = table.column_index_ignore_case("latitude");

    let (lon_idx, lat_idx) = match (lon_idx, lat_idx) {
        (Some(lon), Some(lat)) => (lon, lat),
        (lon, lat) => {
            let mut missing = Vec::new();
            if lat.is_none() {
                missing.push("latitude");
            }
            if lon.is_none() {
                missing.push("longitude");
            }
            return Err(SchemaError::MissingCoordinates { missing }.into());
        }
    };

    let geometry = table
        .rows
        .iter()
        .map(|row| Point::new(ordinate(&row[lon_idx]), ordinate(&row[lat_idx])))
        .collect();

    Ok(GeoPointTable {
        table,
        geometry,
        crs: Crs::WGS84,
    })
}

fn ordinate(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn table(rows: &[(&str, &str, &str)]) -> Table {
        Table {
            columns: vec!["postal_code".into(), "Latitude".into(), "Longitude".into()],
            rows: rows
                .iter()
                .map(|(zip, lat, lon)| {
                    vec![Value::from_field(zip), Value::from_field(lat), Value::from_field(lon)]
                })
                .collect(),
        }
    }

    #[test]
    fn test_coordinates_round_trip() {
        let geo = build_geometries(table(&[
            ("10001", "40.750742", "-73.99653"),
            ("94105", "37.789796", "-122.394223"),
        ]))
        .unwrap();

        assert_eq!(geo.crs, Crs::WGS84);
        assert_eq!(geo.shape(), (2, 4));
        assert_eq!(geo.geometry[0].x(), -73.99653);
        assert_eq!(geo.geometry[0].y(), 40.750742);
        assert_eq!(geo.geometry[1].x_y(), (-122.394223, 37.789796));
        assert_ne!(geo.geometry[0], geo.geometry[1]);
    }

    #[test]
    fn test_swapped_pairs_stay_distinct() {
        let geo = build_geometries(table(&[("a", "10", "20"), ("b", "20", "10")])).unwrap();
        assert_ne!(geo.geometry[0], geo.geometry[1]);
        assert_eq!(geo.geometry[0].x_y(), (20.0, 10.0));
    }

    #[test]
    fn test_invalid_values_become_nan() {
        let geo = build_geometries(table(&[("99999", "", "west")])).unwrap();
        assert_eq!(geo.len(), 1);
        assert!(geo.geometry[0].x().is_nan());
        assert!(geo.geometry[0].y().is_nan());
    }

    #[test]
    fn test_missing_columns() {
        let t = Table::new(vec!["postal_code".into(), "longitude".into()]);
        let err = build_geometries(t).unwrap_err();
        match err {
            PipelineError::Schema(SchemaError::MissingCoordinates { missing }) => {
                assert_eq!(missing, vec!["latitude"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
