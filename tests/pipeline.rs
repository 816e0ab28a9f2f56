use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use marketmap::config::Config;
use marketmap::observer::{NoopObserver, PipelineEvent, PipelineObserver, Stage};
use marketmap::{run, PipelineError};
use tempfile::TempDir;

/// Two unit-ish squares sharing the edge x = -100
const MARKETS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"dma_code": 1, "NAME": "West Market"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-102, 40], [-100, 40], [-100, 42], [-102, 42], [-102, 40]]]
            }
        },
        {
            "type": "Feature",
            "properties": {"dma_code": 2, "NAME": "East Market"},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [[[[-100, 40], [-98, 40], [-98, 42], [-100, 42], [-100, 40]]]]
            }
        }
    ]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(points: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("points.tsv"), points).expect("write points");
        fs::write(dir.path().join("markets.geojson"), MARKETS).expect("write markets");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self, columns: &[&str], output: &str) -> Config {
        Config {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            input_filepath: self.path("points.tsv"),
            market_filepath: self.path("markets.geojson"),
            output_filepath: self.path(output),
            separator: b'\t',
            output_separator: b',',
            parallel: false,
        }
    }
}

const COLUMNS: [&str; 4] = ["postal_code", "place_name", "latitude", "longitude"];

fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("read output")
}

#[test]
fn resolves_points_to_disjoint_markets() {
    let fixture = Fixture::new(
        "68001\tWestville\t41.0\t-101.0\n\
         68002\tEastville\t41.0\t-99.0\n\
         99999\tNowhere\t10.0\t-50.0\n",
    );
    let config = fixture.config(&COLUMNS, "out.csv");

    let summary = run(&config, &NoopObserver).unwrap();

    assert_eq!(summary.stats.input_points, 3);
    assert_eq!(summary.stats.output_rows, 2);
    assert_eq!(summary.stats.unmatched_points, 1);
    assert_eq!(
        read(&config.output_filepath),
        "postal_code,place_name,latitude,longitude,dma_code,NAME\n\
         68001,Westville,41.0,-101.0,1,West Market\n\
         68002,Eastville,41.0,-99.0,2,East Market\n"
    );
}

#[test]
fn shared_boundary_point_fans_out() {
    let fixture = Fixture::new("68003\tBorderton\t41.0\t-100.0\n");
    let config = fixture.config(&COLUMNS, "out.csv");

    let summary = run(&config, &NoopObserver).unwrap();

    assert_eq!(summary.stats.output_rows, 2);
    assert_eq!(summary.stats.multi_match_points, 1);
    let output = read(&config.output_filepath);
    let rows: Vec<&str> = output.lines().skip(1).collect();
    assert_eq!(
        rows,
        vec![
            "68003,Borderton,41.0,-100.0,1,West Market",
            "68003,Borderton,41.0,-100.0,2,East Market",
        ]
    );
}

#[test]
fn repeated_runs_are_byte_identical() {
    let fixture = Fixture::new(
        "01001\tAgawam\t41.5\t-101.5\n\
         68003\tBorderton\t41.0\t-100.0\n\
         68002\tEastville\t41.9\t-98.1\n",
    );
    let first = fixture.config(&COLUMNS, "first.csv");
    let second = fixture.config(&COLUMNS, "second.csv");

    run(&first, &NoopObserver).unwrap();
    run(&second, &NoopObserver).unwrap();

    let a = fs::read(&first.output_filepath).unwrap();
    let b = fs::read(&second.output_filepath).unwrap();
    assert_eq!(a, b);
    // leading zeros survive the round trip
    assert!(String::from_utf8(a).unwrap().contains("\n01001,Agawam,"));
}

#[test]
fn parallel_run_matches_serial_run() {
    let fixture = Fixture::new(
        "68001\tWestville\t41.0\t-101.0\n\
         68003\tBorderton\t41.0\t-100.0\n\
         99999\tNowhere\t10.0\t-50.0\n\
         68002\tEastville\t41.0\t-99.0\n",
    );
    let serial = fixture.config(&COLUMNS, "serial.csv");
    let mut parallel = fixture.config(&COLUMNS, "parallel.csv");
    parallel.parallel = true;

    run(&serial, &NoopObserver).unwrap();
    run(&parallel, &NoopObserver).unwrap();

    assert_eq!(
        read(&serial.output_filepath),
        read(&parallel.output_filepath)
    );
}

#[test]
fn missing_coordinate_columns_fail_without_output() {
    let fixture = Fixture::new("68001\tWestville\t41.0\t-101.0\n");
    let config = fixture.config(&["postal_code", "place_name", "lat", "long"], "out.csv");

    let err = run(&config, &NoopObserver).unwrap_err();

    assert!(matches!(err, PipelineError::Schema(_)));
    assert!(!config.output_filepath.exists());
}

#[test]
fn invalid_coordinates_fail_without_output() {
    let fixture = Fixture::new(
        "68001\tWestville\t41.0\t-101.0\n\
         00000\tBroken\tunknown\t-101.0\n",
    );
    let config = fixture.config(&COLUMNS, "out.csv");

    let err = run(&config, &NoopObserver).unwrap_err();

    assert!(matches!(err, PipelineError::Geometry(_)));
    assert!(!config.output_filepath.exists());
}

#[test]
fn colliding_column_names_are_suffixed() {
    let fixture = Fixture::new("68001\tWestville\t41.0\t-101.0\n");
    let config = fixture.config(&["postal_code", "NAME", "Latitude", "Longitude"], "out.csv");

    run(&config, &NoopObserver).unwrap();

    let output = read(&config.output_filepath);
    assert_eq!(
        output.lines().next().unwrap(),
        "postal_code,NAME_left,Latitude,Longitude,dma_code,NAME_right"
    );
}

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<String>>,
}

impl PipelineObserver for Recorder {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        let entry = match event {
            PipelineEvent::StageComplete {
                stage,
                rows,
                columns,
            } => format!("{} {}x{}", stage, rows, columns),
            PipelineEvent::Preview { stage, lines } => {
                format!("preview {} {}", stage, lines.len())
            }
            PipelineEvent::IndexBuilt { entries, skipped } => {
                format!("index {} {}", entries, skipped)
            }
            PipelineEvent::Resolved(stats) => format!("unresolved {}", stats.unresolved()),
            PipelineEvent::GeometryDropped { rows, columns } => {
                format!("dropped {}x{}", rows, columns)
            }
            PipelineEvent::OutputWritten { rows, .. } => format!("written {}", rows),
        };
        self.events.borrow_mut().push(entry);
    }
}

#[test]
fn observer_sees_every_stage_shape() {
    let fixture = Fixture::new(
        "68001\tWestville\t41.0\t-101.0\n\
         99999\tNowhere\t10.0\t-50.0\n",
    );
    let config = fixture.config(&COLUMNS, "out.csv");
    let recorder = Recorder::default();

    run(&config, &recorder).unwrap();

    let events = recorder.events.into_inner();
    assert_eq!(
        events,
        vec![
            format!("{} 2x4", Stage::Points),
            "preview points 3".to_string(),
            "geometries 2x5".to_string(),
            "preview geometries 3".to_string(),
            "markets 2x3".to_string(),
            "preview markets 3".to_string(),
            "index 2 0".to_string(),
            "unresolved 1".to_string(),
            "dropped 1x6".to_string(),
            "resolved 1x6".to_string(),
            "preview resolved 2".to_string(),
            "written 1".to_string(),
        ]
    );
}
