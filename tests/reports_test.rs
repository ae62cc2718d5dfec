use std::path::Path;

use chrono::NaiveDate;
use price_sheets::{save, AppError, JsonCatalog, OutputFormat, Report, Sheet};

const CATALOG: &str = "tests/fixtures/catalog.json";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

#[test]
fn every_report_builds_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = JsonCatalog::open(Path::new(CATALOG), "PLATTSALAT").unwrap();

    for report in Report::ALL {
        let sheet = report
            .build(&catalog, today())
            .unwrap_or_else(|e| panic!("{} failed: {}", report.id(), e));
        assert!(sheet.page_style().scale > 0, "{}", report.id());

        for format in [OutputFormat::Xlsx, OutputFormat::Pdf] {
            let path = dir.path().join(format!("{}.{}", report.id(), format.extension()));
            save(&sheet, &path, format).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }
}

#[test]
fn other_stores_are_not_listed() {
    let sheet = price_sheets::generate(Report::TillProduce, Path::new(CATALOG), "PLATTSALAT", today())
        .unwrap();
    let eans: Vec<String> = (0..sheet.extent().1)
        .filter_map(|y| sheet.cell_text(0, y))
        .collect();
    assert!(eans.contains(&"1001".to_string()));
    assert!(!eans.contains(&"9001".to_string()));
}

#[test]
fn long_eans_stay_text() {
    let sheet = price_sheets::generate(Report::FridgeDairy1, Path::new(CATALOG), "PLATTSALAT", today())
        .unwrap();
    // Joghurt sorts before Vollmilch, row 0 holds the column titles
    assert_eq!(sheet.cell_text(0, 2).as_deref(), Some("4006040000130"));
    assert_eq!(sheet.cell_text(0, 3).as_deref(), Some("4006040000123"));
    assert_eq!(sheet.cell_text(3, 2).as_deref(), Some("0,99 €"));
}

#[test]
fn date_goes_into_the_header() {
    let sheet = price_sheets::generate(Report::ScaleList, Path::new(CATALOG), "PLATTSALAT", today())
        .unwrap();
    assert_eq!(sheet.page_style().header.as_deref(), Some("01.05.2024"));
    assert!(sheet.page_style().is_landscape());
}

#[test]
fn unknown_store_has_nothing_to_lay_out() {
    let err = price_sheets::generate(Report::TillBulk, Path::new(CATALOG), "NIRGENDWO", today())
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyInput));
}

#[test]
fn missing_catalog_is_a_data_source_error() {
    let err = price_sheets::generate(
        Report::ScaleList,
        Path::new("tests/fixtures/missing.json"),
        "PLATTSALAT",
        today(),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::DataSource(_)));
}
