//! In-memory tables flowing through the pipeline.

use geo_types::{MultiPolygon, Point};

use super::{Crs, Value};

/// Ordered rows of cells under a fixed column schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive column lookup
    pub fn column_index_ignore_case(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// First `n` rows rendered as delimited lines, header first.
    pub fn head(&self, n: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(n.min(self.rows.len()) + 1);
        lines.push(self.columns.join(" | "));
        for row in self.rows.iter().take(n) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            lines.push(cells.join(" | "));
        }
        lines
    }
}

/// A table with one geometry per row and a table-wide CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTable<G> {
    pub table: Table,
    pub geometry: Vec<G>,
    pub crs: Crs,
}

impl<G> GeoTable<G> {
    /// (rows, columns) including the geometry column
    pub fn shape(&self) -> (usize, usize) {
        let (rows, cols) = self.table.shape();
        (rows, cols + 1)
    }

    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }
}

/// Points built from longitude/latitude columns
pub type GeoPointTable = GeoTable<Point<f64>>;

/// Market regions loaded from a boundary file
pub type MarketTable = GeoTable<MultiPolygon<f64>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table {
            columns: vec!["Zip".into(), "latitude".into()],
            rows: vec![
                vec![Value::from("10001"), Value::from("40.75")],
                vec![Value::from("94105"), Value::from("37.79")],
            ],
        }
    }

    #[test]
    fn test_shape_and_lookup() {
        let table = sample();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.column_index_ignore_case("zip"), Some(0));
        assert_eq!(table.column_index_ignore_case("LATITUDE"), Some(1));
        assert_eq!(table.column_index_ignore_case("longitude"), None);
    }

    #[test]
    fn test_head() {
        let head = sample().head(1);
        assert_eq!(head, vec!["Zip | latitude", "10001 | 40.75"]);
    }

    #[test]
    fn test_geo_shape_counts_geometry() {
        let geo = GeoPointTable {
            table: sample(),
            geometry: vec![Point::new(-73.99, 40.75), Point::new(-122.39, 37.79)],
            crs: Crs::WGS84,
        };
        assert_eq!(geo.shape(), (2, 3));
        assert_eq!(geo.table.shape(), (2, 2));
    }
}
