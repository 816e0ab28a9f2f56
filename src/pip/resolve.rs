//! Spatial join of points against market polygons.

use hashbrown::HashSet;
use rayon::prelude::*;

use super::MarketIndex;
use crate::error::{GeometryError, Result};
use crate::models::{GeoPointTable, MarketTable, Table};
use crate::observer::{PipelineEvent, PipelineObserver};

/// Tuning for [`resolve_with`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Run point lookups on the rayon pool
    pub parallel: bool,
}

/// Join diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub input_points: usize,
    pub output_rows: usize,
    /// Points that intersect no market
    pub unmatched_points: usize,
    /// Points that intersect two or more markets
    pub multi_match_points: usize,
}

impl ResolveStats {
    /// Input points minus output rows.
    ///
    /// Fan-out rows offset dropped points, so this undercounts whenever
    /// `multi_match_points > 0`; `unmatched_points` is exact.
    pub fn unresolved(&self) -> usize {
        self.input_points.saturating_sub(self.output_rows)
    }
}

/// Join result with geometry removed
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub table: Table,
    pub stats: ResolveStats,
}

/// Inner spatial join with the intersects predicate, single-threaded.
pub fn resolve(
    points: &GeoPointTable,
    markets: &MarketTable,
    observer: &dyn PipelineObserver,
) -> Result<Resolution> {
    resolve_with(points, markets, ResolveOptions::default(), observer)
}

/// Inner spatial join with the intersects predicate.
///
/// Every point yields one row per market it intersects (boundary included),
/// in market row order; points matching nothing are dropped. Output columns
/// are the point columns followed by the market columns, with `_left` /
/// `_right` appended to names present on both sides.
pub fn resolve_with(
    points: &GeoPointTable,
    markets: &MarketTable,
    options: ResolveOptions,
    observer: &dyn PipelineObserver,
) -> Result<Resolution> {
    if points.crs != markets.crs {
        return Err(GeometryError::CrsMismatch {
            points: points.crs,
            markets: markets.crs,
        }
        .into());
    }
    check_coordinates(points)?;

    let index = MarketIndex::build(markets);
    observer.on_event(&PipelineEvent::IndexBuilt {
        entries: index.len(),
        skipped: index.skipped(),
    });

    let matches: Vec<Vec<usize>> = if options.parallel {
        points.geometry.par_iter().map(|p| index.lookup(p)).collect()
    } else {
        points.geometry.iter().map(|p| index.lookup(p)).collect()
    };

    let mut table = Table::new(joined_columns(&points.table.columns, &markets.table.columns));
    let mut stats = ResolveStats {
        input_points: points.len(),
        ..Default::default()
    };

    for (point_row, market_rows) in matches.iter().enumerate() {
        match market_rows.len() {
            0 => stats.unmatched_points += 1,
            1 => {}
            _ => stats.multi_match_points += 1,
        }

        for &market_row in market_rows {
            let mut row = Vec::with_capacity(table.columns.len());
            row.extend(points.table.rows[point_row].iter().cloned());
            row.extend(markets.table.rows[market_row].iter().cloned());
            table.rows.push(row);
        }
    }
    stats.output_rows = table.len();

    observer.on_event(&PipelineEvent::Resolved(&stats));
    let (rows, columns) = table.shape();
    observer.on_event(&PipelineEvent::GeometryDropped { rows, columns });

    Ok(Resolution { table, stats })
}

/// Reject NaN or out-of-range coordinates before they reach the index.
fn check_coordinates(points: &GeoPointTable) -> Result<(), GeometryError> {
    for (row, point) in points.geometry.iter().enumerate() {
        let (longitude, latitude) = point.x_y();
        let valid = longitude.is_finite()
            && latitude.is_finite()
            && (-180.0..=180.0).contains(&longitude)
            && (-90.0..=90.0).contains(&latitude);

        if !valid {
            return Err(GeometryError::InvalidCoordinate {
                row,
                longitude,
                latitude,
            });
        }
    }
    Ok(())
}

fn joined_columns(left: &[String], right: &[String]) -> Vec<String> {
    let left_names: HashSet<&str> = left.iter().map(String::as_str).collect();
    let right_names: HashSet<&str> = right.iter().map(String::as_str).collect();

    let left_cols = left.iter().map(|c| {
        if right_names.contains(c.as_str()) {
            format!("{}_left", c)
        } else {
            c.clone()
        }
    });
    let right_cols = right.iter().map(|c| {
        if left_names.contains(c.as_str()) {
            format!("{}_right", c)
        } else {
            c.clone()
        }
    });

    left_cols.chain(right_cols).collect()
}
