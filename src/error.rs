//! Error types for the resolve pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Crs;

/// Problems with the resolved configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required config value: {key}")]
    MissingKey { key: &'static str },

    #[error("Invalid value for {key} (from {source_name}): {reason}")]
    InvalidValue {
        key: String,
        source_name: String,
        reason: String,
    },

    #[error("Failed to read config file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// The point table does not have the shape the pipeline needs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Headers must contain latitude and longitude (missing: {missing:?})")]
    MissingCoordinates { missing: Vec<&'static str> },

    #[error("Line {line} has {found} fields, expected {expected}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },
}

/// Geometry or join failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeometryError {
    #[error("Point table CRS {points} does not match market table CRS {markets}")]
    CrsMismatch { points: Crs, markets: Crs },

    #[error("Row {row} has invalid coordinates (longitude {longitude}, latitude {latitude})")]
    InvalidCoordinate {
        row: usize,
        longitude: f64,
        latitude: f64,
    },

    #[error("Unrecognised GeoJSON crs member {member}")]
    UnrecognisedCrs { member: String },

    #[error("Feature {feature} has unsupported geometry type {kind}")]
    UnsupportedGeometry { feature: usize, kind: String },

    #[error("Feature {feature} has malformed coordinates: {reason}")]
    MalformedCoordinates { feature: usize, reason: String },
}

/// Anything that can stop a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Delimited data error in {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid GeoJSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
