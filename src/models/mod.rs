//! Core data models for the resolve pipeline.

pub mod crs;
pub mod table;
pub mod value;

pub use crs::Crs;
pub use table::{GeoPointTable, GeoTable, MarketTable, Table};
pub use value::Value;
