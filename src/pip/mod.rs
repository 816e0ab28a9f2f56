//! Point-in-Polygon (PIP) market resolution.
//!
//! Builds point geometries from coordinate columns and joins them against
//! market polygons using an R-tree spatial index.

mod geometry;
mod index;
mod resolve;

pub use geometry::build_geometries;
pub use index::{IndexedMarket, MarketIndex};
pub use resolve::{resolve, resolve_with, Resolution, ResolveOptions, ResolveStats};
