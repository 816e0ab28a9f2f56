//! marketmap - resolve postal code points to market regions.
//!
//! This library provides the loaders, spatial join and layered
//! configuration used by the `marketmap` binary.

pub mod config;
pub mod error;
pub mod load;
pub mod models;
pub mod observer;
pub mod output;
pub mod pip;
pub mod pipeline;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use models::{Crs, GeoPointTable, MarketTable, Table, Value};
pub use pipeline::{run, RunSummary};
