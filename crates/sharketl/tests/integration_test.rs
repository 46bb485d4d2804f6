//! Integration tests for the sharketl pipeline.

use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use tempfile::{NamedTempFile, TempDir};

use sharketl::transform::{CONVERSION_FAILED, UNKNOWN_DATE};
use sharketl::{
    ColumnType, EtlError, Extractor, FillStrategy, OutputFormat, Pipeline, PipelineConfig,
    Transformer, Value,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write file");
    path
}

/// Ten incidents: rows 4 and 7 repeat rows 0 and 1, row 8 is empty, three
/// surviving rows lack an area and row 3 has no usable date.
const INCIDENTS: &str = ",CaseNumber,Year,Area,Injury,Date\n\
    0,2001.06.05,2001,Florida,Bite to leg,05-Jun-2001\n\
    1,2002.07.01,2002,,Bite to arm,2002-07-01\n\
    2,2015.01.03,2015,,Laceration,Reported 03-Jan-2015\n\
    3,2004.00.00,2004,Hawaii,No injury,bogus date\n\
    4,2001.06.05,2001,Florida,Bite to leg,05-Jun-2001\n\
    5,1995.00.00,1995,,Fatal,1995\n\
    6,1998.12.05,1998,Queensland,Minor,12--05--1998 text\n\
    7,2002.07.01,2002,,Bite to arm,2002-07-01\n\
    8,,,,,\n\
    9,2007.06.00,2007,Cape Town,Bite,June 2007\n";

// =============================================================================
// Extract
// =============================================================================

#[test]
fn test_load_drops_nothing() {
    let file = create_test_file(INCIDENTS);
    let (table, source) = Extractor::new().load(file.path()).expect("Load failed");

    assert_eq!(table.row_count(), 10);
    assert_eq!(table.headers()[0], "Unnamed: 0");
    assert_eq!(source.format, "csv");
    assert_eq!(source.row_count, 10);
    assert!(source.hash.starts_with("sha256:"));
}

#[test]
fn test_rationalize_against_master() {
    let dir = TempDir::new().unwrap();
    let master = write(dir.path(), "master.csv", ",CaseNumber,Area\n0,1,X\n1,2,Y\n2,3,Z\n");
    let input = write(
        dir.path(),
        "new.csv",
        ",CaseNumber,Area\n0,2,B\n1,3,C\n2,4,D\n3,5,E\n",
    );

    let extractor = Extractor::new();
    let (table, _) = extractor.load(&input).unwrap();
    let reduced = extractor.rationalize(&table, &master).unwrap();

    let areas: Vec<String> = reduced
        .column_by_name("Area")
        .unwrap()
        .into_iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(areas, vec!["D", "E"]);
}

#[test]
fn test_rationalize_without_master() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "new.csv", ",CaseNumber\n0,2\n1,3\n");

    let extractor = Extractor::new();
    let (table, _) = extractor.load(&input).unwrap();
    let err = extractor
        .rationalize(&table, dir.path().join("missing.csv"))
        .unwrap_err();

    assert!(matches!(err, EtlError::MasterNotFound { .. }));
    assert_eq!(table.row_count(), 2);
}

#[test]
fn test_rationalize_missing_key_column() {
    let dir = TempDir::new().unwrap();
    let master = write(dir.path(), "master.csv", ",Other\n0,1\n");
    let input = write(dir.path(), "new.csv", ",CaseNumber\n0,2\n");

    let extractor = Extractor::new();
    let (table, _) = extractor.load(&input).unwrap();
    let err = extractor.rationalize(&table, &master).unwrap_err();
    assert!(matches!(err, EtlError::MissingColumn(ref c) if c == "CaseNumber"));
}

#[test]
fn test_invalid_utf8_is_an_error() {
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    file.write_all(b",CaseNumber\n0,\xff\xfe\n").unwrap();

    let err = Extractor::new().load(file.path()).unwrap_err();
    assert!(matches!(err, EtlError::Decoding { .. }));
}

// =============================================================================
// Transform
// =============================================================================

#[test]
fn test_invalid_fill_method_is_recorded() {
    let file = create_test_file(INCIDENTS);
    let (table, _) = Extractor::new().load(file.path()).unwrap();
    let before = table.column_by_name("Area").unwrap().into_iter().cloned().collect::<Vec<_>>();

    let transformer = Transformer::new(table, "unused.json")
        .check_row_na(false)
        .fill_na_vals("Area", FillStrategy::method("invalid_method"));

    let after = transformer.table().column_by_name("Area").unwrap();
    assert_eq!(after.into_iter().cloned().collect::<Vec<_>>(), before);
    assert!(transformer.report().message("FillNA Area").is_some());
}

#[test]
fn test_type_check_garbage_year() {
    let file = create_test_file(",CaseNumber,Year,Area\n0,a,1995,X\n1,b,circa 1900s,Y\n");
    let (table, _) = Extractor::new().load(file.path()).unwrap();

    let mut expected = IndexMap::new();
    expected.insert("Year".to_string(), ColumnType::Float);

    let transformer = Transformer::new(table, "unused.json")
        .check_row_na(true)
        .check_type(&expected, true);

    assert_eq!(
        transformer.report().message("DTypes Year").as_deref(),
        Some(CONVERSION_FAILED)
    );
    let table = transformer.table();
    assert_eq!(table.column_type("Year"), Some(ColumnType::String));
    assert_eq!(table.column_type("Area"), Some(ColumnType::String));
    assert_eq!(table.get(1, 1), Some(&Value::from("circa 1900s")));
}

// =============================================================================
// End to end
// =============================================================================

#[test]
fn test_end_to_end_run() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "incidents.csv", INCIDENTS);
    let log = dir.path().join("logging").join("log.json");
    let output = dir.path().join("data").join("cleaned.csv");

    let config = PipelineConfig::default()
        .with_master_path(dir.path().join("data").join("master.csv"))
        .with_log_path(&log)
        .with_output_path(&output);
    let outcome = Pipeline::with_config(config).run(&input).expect("Run failed");

    assert!(!outcome.rationalized);
    assert_eq!(outcome.input_rows, 10);
    assert_eq!(outcome.output_rows, 7);
    assert_eq!(outcome.report.count("Duplicates"), Some(2));
    assert_eq!(outcome.report.count("NA"), Some(1));
    assert_eq!(outcome.report.count("FilledNA"), Some(3));
    assert_eq!(outcome.report.count("UnknownDates"), Some(1));

    // Report on disk matches the in-memory one
    let logged = sharketl::DiagnosticReport::load_flat(&log).unwrap();
    assert_eq!(logged, outcome.report.to_flat_record());

    let (cleaned, _) = Extractor::new().load(&output).unwrap();
    assert_eq!(cleaned.row_count(), 7);
    assert!(cleaned.column_by_name("Unnamed: 0").is_none());

    let areas = cleaned.column_by_name("Area").unwrap();
    assert!(areas.iter().all(|v| !v.is_missing()));
    assert_eq!(areas.iter().filter(|v| v.to_string() == "Unknown").count(), 3);

    let dates: Vec<String> = cleaned
        .column_by_name("Date")
        .unwrap()
        .into_iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(
        dates,
        vec![
            "2001-06-05",
            "2002-07-01",
            "2015-01-03",
            UNKNOWN_DATE,
            "1995-01-01",
            "1998-12-05",
            "2007-01-01",
        ]
    );
}

#[test]
fn test_end_to_end_with_master() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "incidents.csv", INCIDENTS);
    let master = write(
        dir.path(),
        "master.csv",
        ",CaseNumber,Year\n0,2001.06.05,2001\n1,1995.00.00,1995\n",
    );

    let config = PipelineConfig::default()
        .with_master_path(&master)
        .with_log_path(dir.path().join("log.json"))
        .with_output_path(dir.path().join("cleaned.json"));
    let outcome = Pipeline::with_config(config).run(&input).unwrap();

    assert!(outcome.rationalized);
    assert_eq!(outcome.rationalized_rows, 7);
    assert_eq!(outcome.output_format, OutputFormat::Json);
    // One duplicate pair went with the master rows
    assert_eq!(outcome.report.count("Duplicates"), Some(1));
    assert_eq!(outcome.output_rows, 5);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("cleaned.json")).unwrap())
            .unwrap();
    assert_eq!(json.as_array().unwrap().len(), 5);

    // The master is read-only
    let master_text = std::fs::read_to_string(&master).unwrap();
    assert_eq!(master_text.lines().count(), 3);
}

#[test]
fn test_run_fails_on_missing_input() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::default()
        .with_log_path(dir.path().join("log.json"))
        .with_output_path(dir.path().join("cleaned.csv"));

    let err = Pipeline::with_config(config)
        .run(dir.path().join("nope.csv"))
        .unwrap_err();
    assert!(matches!(err, EtlError::Io { .. }));
    assert!(!dir.path().join("log.json").exists());
}

#[test]
fn test_output_formats() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "incidents.csv", INCIDENTS);

    for format in [OutputFormat::Csv, OutputFormat::Tsv, OutputFormat::Json] {
        let output = dir.path().join(format!("cleaned.{}", format.extension()));
        let config = PipelineConfig::default()
            .without_rationalize()
            .with_log_path(dir.path().join("log.json"))
            .with_output_path(&output)
            .with_output_format(format);

        let outcome = Pipeline::with_config(config).run(&input).unwrap();
        assert_eq!(outcome.output_format, format);
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }
}
