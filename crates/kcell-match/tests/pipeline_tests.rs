//! End-to-end tests of the kcell pipeline over synthetic CAMx files.

use kcell_match::{DedupMode, KcellError, OutputLayout, Pipeline, PipelineConfig, PipelineInputs};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use test_utils::{
    files_with_prefix, temp_test_dir, write_lines, write_point_source, SyntheticStack,
};

/// Five stacks, three above the default 1000 mol/h threshold.
///
/// Stack 1 sits next to a substation but is too small to count.
fn five_stacks() -> Vec<SyntheticStack> {
    vec![
        SyntheticStack::new(10_000.0, 20_000.0, 5_000.0),
        SyntheticStack::new(10_100.0, 20_000.0, 200.0),
        SyntheticStack::new(-30_000.0, 5_000.0, 3_000.0),
        SyntheticStack::new(60_000.0, 60_000.0, 900.0),
        SyntheticStack::new(80_000.0, -40_000.0, 2_500.0),
    ]
}

/// Two valid lines near stacks 0 and 2, and one malformed line.
const REFERENCE_LINES: [&str; 3] = ["10200.0 20000.0", "substation 17", "-30500.0 5000.0"];

fn config_for(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        output: OutputLayout {
            dir: dir.join("out"),
            ..OutputLayout::default()
        },
        ..PipelineConfig::default()
    }
}

fn inputs(ptsrc: PathBuf, refs: PathBuf, num_points: usize, group_size: usize) -> PipelineInputs {
    PipelineInputs {
        point_sources: ptsrc,
        references: refs,
        lat: 40.0,
        lon: -97.0,
        num_points,
        group_size,
    }
}

fn count_placemarks(path: &Path) -> usize {
    let kml = std::fs::read_to_string(path).unwrap();
    let mut reader = Reader::from_str(&kml);
    let mut count = 0;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) if e.name().as_ref() == b"Placemark" => count += 1,
            Event::Eof => break,
            _ => {}
        }
    }
    count
}

#[test]
fn test_end_to_end_two_matches() {
    let dir = temp_test_dir();
    let ptsrc = write_point_source(dir.path(), "ptsrc.bin", &five_stacks(), 24);
    let refs = write_lines(dir.path(), "substations.txt", &REFERENCE_LINES);

    let pipeline = Pipeline::new(config_for(dir.path())).unwrap();
    let report = pipeline.run(&inputs(ptsrc, refs, 10, 1)).unwrap();

    assert_eq!(report.total_stacks, 5);
    assert_eq!(report.kept_stacks, 3);
    assert_eq!(report.rejected_stacks, 2);
    assert_eq!(report.references, 2);
    assert_eq!(report.skipped_lines, 1);
    assert_eq!(report.matches, 2);
    assert_eq!(report.selected, 2);

    let out = dir.path().join("out");
    assert_eq!(files_with_prefix(&out, "kcell"), vec!["kcell1.out", "kcell2.out"]);

    // Stack 0 is closer to the grid origin than stack 2
    let first = std::fs::read_to_string(out.join("kcell1.out")).unwrap();
    let second = std::fs::read_to_string(out.join("kcell2.out")).unwrap();
    assert_eq!(first, "10000.0000 20000.0000 1\n");
    assert_eq!(second, "-30000.0000 5000.0000 1\n");

    let kml = report.kml.expect("KML should be written by default");
    assert_eq!(count_placemarks(&kml), 2);
}

#[test]
fn test_group_size_splits_rows() {
    let dir = temp_test_dir();
    let ptsrc = write_point_source(dir.path(), "ptsrc.bin", &five_stacks(), 24);
    let refs = write_lines(dir.path(), "substations.txt", &REFERENCE_LINES);

    let pipeline = Pipeline::new(config_for(dir.path())).unwrap();
    let report = pipeline.run(&inputs(ptsrc, refs, 10, 5)).unwrap();

    assert_eq!(report.group_files.len(), 1);
    let rows = std::fs::read_to_string(&report.group_files[0]).unwrap();
    assert_eq!(rows, "10000.0000 20000.0000 1\n-30000.0000 5000.0000 2\n");
}

#[test]
fn test_diagnostics_record_the_run() {
    let dir = temp_test_dir();
    let ptsrc = write_point_source(dir.path(), "ptsrc.bin", &five_stacks(), 24);
    let refs = write_lines(dir.path(), "substations.txt", &REFERENCE_LINES);

    let pipeline = Pipeline::new(config_for(dir.path())).unwrap();
    let report = pipeline.run(&inputs(ptsrc, refs, 1, 1)).unwrap();

    let diag = std::fs::read_to_string(&report.diag).unwrap();
    assert!(diag.contains("Minimum NOx emission: 1000 mole/hr"));
    assert!(diag.contains("Maximum point-source radius: 750 meters"));
    assert!(diag.contains("----------------Matches----------------"));
    assert!(diag.contains("10000.0000, 20000.0000 --> "));
    assert!(diag.contains("Total matching points found: 2"));
    assert!(diag.contains("1 skipped"));
    assert!(diag.contains("Wrote 1 files, for a total of 1 points"));

    let closest = (10_000.0_f64).hypot(20_000.0) / 1000.0;
    assert!(diag.contains(&format!("Closest point from center: {:.4} km", closest)));
}

#[test]
fn test_no_matches_writes_empty_outputs() {
    let dir = temp_test_dir();
    let ptsrc = write_point_source(dir.path(), "ptsrc.bin", &five_stacks(), 24);
    let refs = write_lines(dir.path(), "substations.txt", &["900000.0 900000.0"]);

    let pipeline = Pipeline::new(config_for(dir.path())).unwrap();
    let report = pipeline.run(&inputs(ptsrc, refs, 5, 2)).unwrap();

    assert_eq!(report.matches, 0);
    assert!(report.group_files.is_empty());
    assert!(report.closest_km.is_none());
    assert_eq!(count_placemarks(report.kml.as_ref().unwrap()), 0);

    let diag = std::fs::read_to_string(&report.diag).unwrap();
    assert!(diag.contains("No matching points"));
}

#[test]
fn test_full_history_mode_over_file() {
    // The same stack listed twice, separated by another matching stack
    let stacks = vec![
        SyntheticStack::new(0.0, 0.0, 5_000.0),
        SyntheticStack::new(50_000.0, 0.0, 5_000.0),
        SyntheticStack::new(0.0, 0.0, 5_000.0),
    ];
    let lines = ["100.0 0.0", "50100.0 0.0"];

    let adjacent_dir = temp_test_dir();
    let ptsrc = write_point_source(adjacent_dir.path(), "ptsrc.bin", &stacks, 2);
    let refs = write_lines(adjacent_dir.path(), "subs.txt", &lines);
    let adjacent = Pipeline::new(config_for(adjacent_dir.path()))
        .unwrap()
        .run(&inputs(ptsrc, refs, 10, 10))
        .unwrap();
    assert_eq!(adjacent.matches, 3);

    let full_dir = temp_test_dir();
    let ptsrc = write_point_source(full_dir.path(), "ptsrc.bin", &stacks, 2);
    let refs = write_lines(full_dir.path(), "subs.txt", &lines);
    let config = PipelineConfig {
        dedup_mode: DedupMode::FullHistory,
        ..config_for(full_dir.path())
    };
    let full = Pipeline::new(config)
        .unwrap()
        .run(&inputs(ptsrc, refs, 10, 10))
        .unwrap();
    assert_eq!(full.matches, 2);
}

#[test]
fn test_missing_reference_file_is_fatal() {
    let dir = temp_test_dir();
    let ptsrc = write_point_source(dir.path(), "ptsrc.bin", &five_stacks(), 2);

    let pipeline = Pipeline::new(config_for(dir.path())).unwrap();
    let result = pipeline.run(&inputs(ptsrc, dir.path().join("missing.txt"), 1, 1));
    assert!(matches!(result, Err(KcellError::Read { .. })));
}

#[test]
fn test_missing_point_source_file_is_fatal() {
    let dir = temp_test_dir();
    let refs = write_lines(dir.path(), "subs.txt", &REFERENCE_LINES);

    let pipeline = Pipeline::new(config_for(dir.path())).unwrap();
    let result = pipeline.run(&inputs(dir.path().join("missing.bin"), refs, 1, 1));
    assert!(matches!(result, Err(KcellError::PointSource(_))));
}
