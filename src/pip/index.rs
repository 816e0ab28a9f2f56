//! Spatial index for fast market lookups.

use geo::{BoundingRect, Intersects};
use geo_types::{MultiPolygon, Point};
use rstar::{RTree, RTreeObject, AABB};

use crate::models::MarketTable;

/// R-tree entry: a market row and its bounding box
#[derive(Debug, Clone)]
pub struct IndexedMarket {
    pub row: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedMarket {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedMarket {
    /// `None` for empty geometries, which have no bounding box
    pub fn new(row: usize, geometry: &MultiPolygon<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let (min, max) = (rect.min(), rect.max());
        Some(Self {
            row,
            envelope: AABB::from_corners([min.x, min.y], [max.x, max.y]),
        })
    }
}

/// Spatial index over the market polygons of one table.
///
/// Read-only once built, so lookups can be shared across threads.
pub struct MarketIndex<'a> {
    tree: RTree<IndexedMarket>,
    geometry: &'a [MultiPolygon<f64>],
    skipped: usize,
}

impl<'a> MarketIndex<'a> {
    /// Build spatial index from market boundaries
    pub fn build(markets: &'a MarketTable) -> Self {
        let indexed: Vec<IndexedMarket> = markets
            .geometry
            .iter()
            .enumerate()
            .filter_map(|(row, geometry)| IndexedMarket::new(row, geometry))
            .collect();
        let skipped = markets.len() - indexed.len();

        Self {
            tree: RTree::bulk_load(indexed),
            geometry: &markets.geometry,
            skipped,
        }
    }

    /// Rows of every market the point intersects, boundary included, ascending
    pub fn lookup(&self, point: &Point<f64>) -> Vec<usize> {
        let query_envelope = AABB::from_point([point.x(), point.y()]);

        // Envelope candidates first, then the exact predicate
        let mut rows: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|im| self.geometry[im.row].intersects(point))
            .map(|im| im.row)
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Number of indexed markets
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Markets left out because their geometry was empty
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
