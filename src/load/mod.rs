//! Input loaders for point and market files.

mod geojson;
mod markets;
mod points;

pub use markets::{load_markets, read_markets};
pub use points::{check_coordinate_columns, load_points, read_points, COORDINATE_COLUMNS};
