//! End-to-end run: points and markets in, resolved table out.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::load::{load_markets, load_points};
use crate::models::Table;
use crate::observer::{PipelineEvent, PipelineObserver, Stage};
use crate::output::write_table;
use crate::pip::{build_geometries, resolve_with, ResolveOptions, ResolveStats};

/// Rows shown in stage previews
const PREVIEW_ROWS: usize = 5;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: ResolveStats,
    pub output_filepath: PathBuf,
}

/// Load, resolve and write, reporting each stage to `observer`.
///
/// The output file is written last, so any earlier failure leaves no output.
pub fn run(config: &Config, observer: &dyn PipelineObserver) -> Result<RunSummary> {
    let points = load_points(&config.input_filepath, config.separator, &config.columns)?;
    report(observer, Stage::Points, points.shape(), &points);

    let geo_points = build_geometries(points)?;
    report(observer, Stage::Geometries, geo_points.shape(), &geo_points.table);

    let markets = load_markets(&config.market_filepath)?;
    report(observer, Stage::Markets, markets.shape(), &markets.table);

    let options = ResolveOptions {
        parallel: config.parallel,
    };
    let resolution = resolve_with(&geo_points, &markets, options, observer)?;
    report(
        observer,
        Stage::Resolved,
        resolution.table.shape(),
        &resolution.table,
    );

    write_table(
        &config.output_filepath,
        &resolution.table,
        config.output_separator,
    )?;
    observer.on_event(&PipelineEvent::OutputWritten {
        path: &config.output_filepath,
        rows: resolution.table.len(),
    });

    Ok(RunSummary {
        stats: resolution.stats,
        output_filepath: config.output_filepath.clone(),
    })
}

fn report(observer: &dyn PipelineObserver, stage: Stage, shape: (usize, usize), table: &Table) {
    let (rows, columns) = shape;
    observer.on_event(&PipelineEvent::StageComplete {
        stage,
        rows,
        columns,
    });
    let lines = table.head(PREVIEW_ROWS);
    observer.on_event(&PipelineEvent::Preview {
        stage,
        lines: &lines,
    });
}
