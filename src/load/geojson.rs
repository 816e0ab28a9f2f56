//! Minimal GeoJSON document model.
//!
//! Only what market boundary files use: a FeatureCollection (or a single
//! Feature) of Polygon/MultiPolygon features, plus the legacy `crs` member.

use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::GeometryError;
use crate::models::Crs;

pub type Properties = Map<String, JsonValue>;

#[derive(Debug, Deserialize)]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub crs: Option<CrsMember>,
    // Present when the document is a bare Feature
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub geometry: Option<RawGeometry>,
}

/// Geometry with its coordinates left untyped until the kind is known
#[derive(Debug, Deserialize)]
pub struct RawGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: JsonValue,
}

/// `{"type": "name", "properties": {"name": "EPSG:4326"}}`, or the older
/// `{"type": "EPSG", "properties": {"code": 4326}}`.
///
/// Kept as raw JSON so an unreadable member can be reported as written.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct CrsMember(JsonValue);

#[derive(Debug, Default, Deserialize)]
struct CrsFields {
    #[serde(default)]
    properties: CrsProperties,
}

#[derive(Debug, Default, Deserialize)]
struct CrsProperties {
    name: Option<String>,
    code: Option<u32>,
}

impl CrsMember {
    pub fn to_crs(&self) -> Result<Crs, GeometryError> {
        let unrecognised = || GeometryError::UnrecognisedCrs {
            member: self.0.to_string(),
        };

        let fields = CrsFields::deserialize(&self.0).map_err(|_| unrecognised())?;
        let crs = match (&fields.properties.name, fields.properties.code) {
            (Some(name), _) => Crs::from_name(name),
            (None, Some(code)) => Some(Crs::Epsg(code)),
            (None, None) => None,
        };
        crs.ok_or_else(unrecognised)
    }
}

impl Document {
    /// Features in file order; a bare Feature becomes a single-item list.
    pub fn into_features(self) -> Result<Vec<Feature>, String> {
        match self.kind.as_str() {
            "FeatureCollection" => Ok(self.features),
            "Feature" => Ok(vec![Feature {
                properties: self.properties,
                geometry: self.geometry,
            }]),
            other => Err(format!(
                "expected a FeatureCollection or Feature, found {}",
                other
            )),
        }
    }
}

type Position = Vec<f64>;
type Ring = Vec<Position>;

impl RawGeometry {
    /// Decode a Polygon or MultiPolygon into a multipolygon.
    ///
    /// Extra ordinates (altitude) are ignored. `feature` is only used to
    /// label errors.
    pub fn into_multi_polygon(self, feature: usize) -> Result<MultiPolygon<f64>, GeometryError> {
        let malformed = |e: serde_json::Error| GeometryError::MalformedCoordinates {
            feature,
            reason: e.to_string(),
        };

        let RawGeometry { kind, coordinates } = self;
        let polygons = match kind.as_str() {
            "Polygon" => {
                let rings: Vec<Ring> =
                    serde_json::from_value(coordinates).map_err(malformed)?;
                vec![to_polygon(rings, feature)?]
            }
            "MultiPolygon" => {
                let polygons: Vec<Vec<Ring>> =
                    serde_json::from_value(coordinates).map_err(malformed)?;
                polygons
                    .into_iter()
                    .map(|rings| to_polygon(rings, feature))
                    .collect::<Result<Vec<_>, _>>()?
            }
            _ => {
                return Err(GeometryError::UnsupportedGeometry {
                    feature,
                    kind: kind.clone(),
                })
            }
        };

        Ok(MultiPolygon::new(polygons))
    }
}

fn to_polygon(rings: Vec<Ring>, feature: usize) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = rings.into_iter();
    let exterior = match rings.next() {
        Some(ring) => to_line_string(ring, feature)?,
        None => LineString::new(vec![]),
    };
    let interiors = rings
        .map(|ring| to_line_string(ring, feature))
        .collect::<Result<Vec<_>, _>>()?;

    // Polygon::new closes open rings
    Ok(Polygon::new(exterior, interiors))
}

fn to_line_string(ring: Ring, feature: usize) -> Result<LineString<f64>, GeometryError> {
    ring.into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(GeometryError::MalformedCoordinates {
                feature,
                reason: format!("position has {} ordinates", position.len()),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}
