//! Structured pipeline events.
//!
//! Pipeline code never logs directly. It reports what happened through a
//! [`PipelineObserver`], and the binary plugs in [`TracingObserver`].

use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::pip::ResolveStats;

/// Pipeline stage that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Points,
    Geometries,
    Markets,
    Resolved,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Points => write!(f, "points"),
            Stage::Geometries => write!(f, "geometries"),
            Stage::Markets => write!(f, "markets"),
            Stage::Resolved => write!(f, "resolved"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PipelineEvent<'a> {
    /// A stage produced a table of this shape
    StageComplete {
        stage: Stage,
        rows: usize,
        columns: usize,
    },
    /// First rows of a stage's table, header first
    Preview { stage: Stage, lines: &'a [String] },
    /// R-tree built over market envelopes
    IndexBuilt { entries: usize, skipped: usize },
    /// Join finished
    Resolved(&'a ResolveStats),
    /// Geometry columns removed from the join result
    GeometryDropped { rows: usize, columns: usize },
    OutputWritten { path: &'a Path, rows: usize },
}

/// Sink for pipeline events.
pub trait PipelineObserver {
    fn on_event(&self, event: &PipelineEvent<'_>);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent<'_>) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        match *event {
            PipelineEvent::StageComplete {
                stage,
                rows,
                columns,
            } => {
                info!(
                    %stage,
                    rows,
                    columns,
                    "Built {} table of shape ({}, {})",
                    stage,
                    rows,
                    columns
                );
            }
            PipelineEvent::Preview { stage, lines } => {
                for line in lines {
                    debug!(%stage, "{}", line);
                }
            }
            PipelineEvent::IndexBuilt { entries, skipped } => {
                info!("Spatial index built with {} entries", entries);
                if skipped > 0 {
                    warn!("{} markets have empty geometry and were not indexed", skipped);
                }
            }
            PipelineEvent::Resolved(stats) => {
                info!(
                    input_points = stats.input_points,
                    output_rows = stats.output_rows,
                    "Merged points with markets"
                );
                info!("Unable to resolve markets for {} points", stats.unresolved());
                if stats.unmatched_points > 0 {
                    debug!("{} points matched no market", stats.unmatched_points);
                }
                if stats.multi_match_points > 0 {
                    warn!(
                        "{} points matched more than one market",
                        stats.multi_match_points
                    );
                }
            }
            PipelineEvent::GeometryDropped { rows, columns } => {
                info!("Dropped geometry, result shape ({}, {})", rows, columns);
            }
            PipelineEvent::OutputWritten { path, rows } => {
                info!("Wrote {} rows to {}", rows, path.display());
            }
        }
    }
}
