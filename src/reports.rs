//! The named reports. Each one queries its lists, lays them out on a fresh
//! sheet and sets up the printed page.

use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;

use crate::builder::{PageOptions, ReportBuilder, LABEL_CHAR_HEIGHT};
use crate::catalog::{DataSource, Field, JsonCatalog, Query};
use crate::column::{ColumnFormat, HeaderTitle, HorizontalAlign};
use crate::error::AppError;
use crate::sheet::GridSheet;
use crate::style::RowStyle;
use crate::value::{capitalize_column, Row};

const VEGETABLES: &str = "0001";
const FRUIT: &str = "0003";

/// Locations of the produce department, one page each.
const SCALE_LOCATIONS: [&str; 8] = [
    "Apfel",
    "Kartoffel",
    "Knoblauch",
    "kühl links",
    "kühl rechts",
    "Pilze",
    "Zitrone",
    "Zwiebel",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    ScaleList,
    ScaleListPortrait,
    ScaleLocationPages,
    FridgeLeft,
    FridgeRight,
    FridgeDairy1,
    FridgeDairy2,
    FridgeMix,
    FridgeVegan,
    FridgeMeat,
    TillProduce,
    TillBreadSchaefer,
    TillBreadWeber,
    TillMeatFauser,
    TillMeatUnterweger,
    TillMeatUria,
    TillBulk,
}

impl Report {
    pub const ALL: [Report; 17] = [
        Report::ScaleList,
        Report::ScaleListPortrait,
        Report::ScaleLocationPages,
        Report::FridgeLeft,
        Report::FridgeRight,
        Report::FridgeDairy1,
        Report::FridgeDairy2,
        Report::FridgeMix,
        Report::FridgeVegan,
        Report::FridgeMeat,
        Report::TillProduce,
        Report::TillBreadSchaefer,
        Report::TillBreadWeber,
        Report::TillMeatFauser,
        Report::TillMeatUnterweger,
        Report::TillMeatUria,
        Report::TillBulk,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Report::ScaleList => "scale-list",
            Report::ScaleListPortrait => "scale-list-portrait",
            Report::ScaleLocationPages => "scale-location-pages",
            Report::FridgeLeft => "fridge-left",
            Report::FridgeRight => "fridge-right",
            Report::FridgeDairy1 => "fridge-dairy-1",
            Report::FridgeDairy2 => "fridge-dairy-2",
            Report::FridgeMix => "fridge-mix",
            Report::FridgeVegan => "fridge-vegan",
            Report::FridgeMeat => "fridge-meat",
            Report::TillProduce => "till-produce",
            Report::TillBreadSchaefer => "till-bread-schaefer",
            Report::TillBreadWeber => "till-bread-weber",
            Report::TillMeatFauser => "till-meat-fauser",
            Report::TillMeatUnterweger => "till-meat-unterweger",
            Report::TillMeatUria => "till-meat-uria",
            Report::TillBulk => "till-bulk",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Report::ScaleList => "Scale list, vegetables and fruit, landscape on two pages",
            Report::ScaleListPortrait => "Scale list, EAN, name and unit, portrait on one page",
            Report::ScaleLocationPages => "One large-print page per produce location",
            Report::FridgeLeft => "Fridge label, left fridge",
            Report::FridgeRight => "Fridge label, right fridge",
            Report::FridgeDairy1 => "Fridge label, dairy fridge 1",
            Report::FridgeDairy2 => "Fridge label, dairy fridge 2",
            Report::FridgeMix => "Fridge label, mixed fridge",
            Report::FridgeVegan => "Fridge label, vegan fridge",
            Report::FridgeMeat => "Fridge label, meat fridge, two pages",
            Report::TillProduce => "Till list, vegetables and fruit with country",
            Report::TillBreadSchaefer => "Till list, bread and pastries from Schäfer",
            Report::TillBreadWeber => "Till list, bread and pastries from Weber",
            Report::TillMeatFauser => "Till list, meat from Fauser",
            Report::TillMeatUnterweger => "Till list, meat from Unterweger",
            Report::TillMeatUria => "Till list, meat from Uria",
            Report::TillBulk => "Till list, bulk food, detergents and juices",
        }
    }

    pub fn from_id(id: &str) -> Option<Report> {
        Report::ALL.iter().copied().find(|r| r.id() == id)
    }

    /// Build the report from `source`. `today` goes into the running
    /// header of reports that print the date.
    pub fn build(&self, source: &dyn DataSource, today: NaiveDate) -> Result<GridSheet, AppError> {
        match self {
            Report::ScaleList => scale_list(source, today),
            Report::ScaleListPortrait => scale_list_portrait(source),
            Report::ScaleLocationPages => scale_location_pages(source, today),
            Report::FridgeLeft => fridge_list(source, "Kühlschrank links", "kühl links", 1),
            Report::FridgeRight => fridge_list(source, "Kühlschrank rechts", "kühl rechts", 1),
            Report::FridgeDairy1 => {
                fridge_list(source, "Kühlschrank Molkereiprodukte 1", "1Mopro", 1)
            }
            Report::FridgeDairy2 => {
                fridge_list(source, "Kühlschrank Molkereiprodukte 2", "2Mopro", 1)
            }
            Report::FridgeMix => fridge_list(source, "Kühlschrank Mix", "3Mix", 1),
            Report::FridgeVegan => fridge_list(source, "Kühlschrank Vegan", "4Vegan", 1),
            Report::FridgeMeat => fridge_list(source, "Kühlschrank Fleisch", "5Fleisch", 2),
            Report::TillProduce => till_produce(source),
            Report::TillBreadSchaefer => till_bread(source, "Schäfer", "SCHÄFERBROT"),
            Report::TillBreadWeber => till_bread(source, "Weber", "WEBER"),
            Report::TillMeatFauser => till_meat(source, "Fauser", "FAUSER"),
            Report::TillMeatUnterweger => till_meat(source, "Unterweger", "UNTERWEGER"),
            Report::TillMeatUria => till_meat(source, "Uria", "URIA"),
            Report::TillBulk => till_bulk(source),
        }
    }
}

/// Open the catalog, build `report` and release the catalog again,
/// whether the build succeeds or not.
pub fn generate(
    report: Report,
    catalog: &Path,
    store: &str,
    today: NaiveDate,
) -> Result<GridSheet, AppError> {
    let t0 = Instant::now();
    log::info!("Building {} from {}", report.id(), catalog.display());

    let source = JsonCatalog::open(catalog, store)?;
    let t_open = t0.elapsed();
    let sheet = report.build(&source, today)?;
    drop(source);

    let (cols, rows) = sheet.extent();
    log::info!(
        "Built {}: {} x {} cells at {}%, open={:.1}ms, build={:.1}ms",
        report.id(),
        cols,
        rows,
        sheet.page_style().scale,
        t_open.as_secs_f64() * 1000.0,
        (t0.elapsed() - t_open).as_secs_f64() * 1000.0,
    );
    Ok(sheet)
}

// ============================================================================
// Queries
// ============================================================================

fn run_capitalized(
    source: &dyn DataSource,
    query: &Query,
    unit_col: usize,
) -> Result<Vec<Row>, AppError> {
    let mut rows = source.run(query)?;
    capitalize_column(&mut rows, unit_col);
    Ok(rows)
}

fn scale_query() -> Query {
    Query::new(
        &[
            Field::Ean,
            Field::Description,
            Field::Country,
            Field::MemberPrice,
            Field::Price,
            Field::Unit,
        ],
        "SSSDDS",
    )
    .on_scale()
}

fn scale_portrait_query() -> Query {
    Query::new(
        &[Field::Ean, Field::Description, Field::MemberPrice, Field::Unit],
        "SSDS",
    )
    .on_scale()
}

/// Columns of the location pages and of the produce till list.
fn produce_query() -> Query {
    Query::new(
        &[
            Field::Ean,
            Field::Description,
            Field::Country,
            Field::Unit,
            Field::MemberPrice,
            Field::Price,
        ],
        "SSSSDD",
    )
    .on_scale()
}

fn fridge_query() -> Query {
    Query::new(
        &[
            Field::Ean,
            Field::Description,
            Field::Country,
            Field::MemberPrice,
            Field::Price,
            Field::Manufacturer,
        ],
        "SSSDDS",
    )
}

fn till_query() -> Query {
    Query::new(
        &[
            Field::Ean,
            Field::Description,
            Field::Unit,
            Field::MemberPrice,
            Field::Price,
        ],
        "SSSDD",
    )
}

fn price_titles() -> [HeaderTitle; 2] {
    [
        HeaderTitle::new(
            3,
            "Mitglieder",
            ColumnFormat::new().align(HorizontalAlign::Center).height(10).bold(),
        ),
        HeaderTitle::new(
            4,
            "Nicht-\nmitglieder",
            ColumnFormat::new().align(HorizontalAlign::Center).height(10).bold(),
        ),
    ]
}

// ============================================================================
// Scale Lists
// ============================================================================

fn scale_list(source: &dyn DataSource, today: NaiveDate) -> Result<GridSheet, AppError> {
    let vegetables = run_capitalized(source, &scale_query().group(VEGETABLES), 5)?;
    let fruit = run_capitalized(source, &scale_query().group(FRUIT), 5)?;

    let mut b = ReportBuilder::new(GridSheet::new("Waagenliste"), 2, 1);
    b.add_data(&[vegetables, fruit], RowStyle::AltGrey)?;
    b.add_columns(&[
        ColumnFormat::new().height(13).width(10).bold().align(HorizontalAlign::Left),
        ColumnFormat::new().height(13).width(57).bold().optimal_width(),
        ColumnFormat::new().width(7),
        ColumnFormat::new().height(14).width(21),
        ColumnFormat::new().height(14).width(21),
        ColumnFormat::new().width(8).grey_unit().align(HorizontalAlign::Right),
    ]);
    b.format_columns();
    b.set_list_labels(&["Gemüse", "Obst"], 15);

    let [members, others] = price_titles();
    b.set_header_row(&[
        HeaderTitle::new(2, "Land", ColumnFormat::new().align(HorizontalAlign::Center).height(9)),
        members,
        others,
    ]);
    b.set_page_style(&PageOptions {
        landscape: true,
        pages: 2,
        date: Some(today),
        ..Default::default()
    });
    Ok(b.finish())
}

fn scale_list_portrait(source: &dyn DataSource) -> Result<GridSheet, AppError> {
    let vegetables = run_capitalized(source, &scale_portrait_query().group(VEGETABLES), 3)?;
    let fruit = run_capitalized(source, &scale_portrait_query().group(FRUIT), 3)?;

    let mut b = ReportBuilder::new(GridSheet::new("Waagenliste"), 2, 0);
    b.add_data(&[vegetables, fruit], RowStyle::Block)?;
    b.add_columns(&[
        ColumnFormat::new().width(10).bold(),
        ColumnFormat::new().width(50).optimal_width(),
        ColumnFormat::new().width(17),
        ColumnFormat::new().width(10).grey_unit(),
    ]);
    b.format_columns();
    b.set_list_labels(&["Gemüse", "Obst"], LABEL_CHAR_HEIGHT);
    b.set_page_style(&PageOptions::default());
    Ok(b.finish())
}

fn scale_location_pages(source: &dyn DataSource, today: NaiveDate) -> Result<GridSheet, AppError> {
    let lists = SCALE_LOCATIONS
        .iter()
        .map(|loc| {
            let query = produce_query().groups(&[VEGETABLES, FRUIT]).internal_group(loc);
            run_capitalized(source, &query, 3)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut b = ReportBuilder::new(GridSheet::new("Waagenliste"), 1, 1);
    b.add_page_list(&lists, RowStyle::Block)?;
    b.add_columns(&[
        ColumnFormat::new().height(24).width(18).bold().align(HorizontalAlign::Left),
        ColumnFormat::new().height(29).width(100).bold(),
        ColumnFormat::new().width(8),
        ColumnFormat::new().height(22).width(35),
        ColumnFormat::new().height(22).width(35),
    ]);
    b.format_columns();

    let [members, _] = price_titles();
    b.set_header_row(&[
        HeaderTitle::new(2, "", ColumnFormat::new().align(HorizontalAlign::Center).height(9)),
        members,
        HeaderTitle::new(
            4,
            "Nichtmitglieder",
            ColumnFormat::new().align(HorizontalAlign::Center).height(10).bold(),
        ),
    ]);
    b.set_page_style(&PageOptions {
        fit: false,
        date: Some(today),
        ..Default::default()
    });
    Ok(b.finish())
}

// ============================================================================
// Fridge Labels
// ============================================================================

fn fridge_list(
    source: &dyn DataSource,
    title: &str,
    location: &str,
    pages: usize,
) -> Result<GridSheet, AppError> {
    let data = source.run(&fridge_query().internal_group(location))?;

    let mut b = ReportBuilder::new(GridSheet::new(title), 1, 1);
    b.add_data(&[data], RowStyle::Block)?;

    let [members, others] = price_titles();
    b.set_header_row(&[
        HeaderTitle::new(0, "EAN", ColumnFormat::new().bold().align(HorizontalAlign::Center)),
        HeaderTitle::new(1, "Bezeichnung", ColumnFormat::new()),
        HeaderTitle::new(2, "Land", ColumnFormat::new()),
        members,
        others,
        HeaderTitle::new(5, "Hersteller", ColumnFormat::new().align(HorizontalAlign::Center)),
    ]);
    b.add_columns(&[
        ColumnFormat::new().width(35).bold(),
        ColumnFormat::new().width(90),
        ColumnFormat::new().width(10),
        ColumnFormat::new().width(25),
        ColumnFormat::new().width(25),
        ColumnFormat::new().width(30),
    ]);
    b.format_columns();
    b.set_page_style(&PageOptions {
        pages,
        ..Default::default()
    });
    Ok(b.finish())
}

// ============================================================================
// Till Lists
// ============================================================================

fn till_produce(source: &dyn DataSource) -> Result<GridSheet, AppError> {
    let vegetables = run_capitalized(source, &produce_query().group(VEGETABLES), 3)?;
    let fruit = run_capitalized(source, &produce_query().group(FRUIT), 3)?;

    let mut b = ReportBuilder::new(GridSheet::new("Kassenliste"), 2, 0);
    b.add_data(&[vegetables, fruit], RowStyle::Block)?;
    b.add_columns(&[
        ColumnFormat::new().width(10).bold(),
        ColumnFormat::new().width(50).optimal_width(),
        ColumnFormat::new().width(8),
        ColumnFormat::new().width(8).grey_unit(),
        ColumnFormat::new().width(17),
        ColumnFormat::new().width(17),
    ]);
    b.format_columns();
    b.set_list_labels(&["Gemüse", "Obst"], LABEL_CHAR_HEIGHT);
    b.set_page_style(&PageOptions::default());
    Ok(b.finish())
}

/// Columns shared by the bread, meat and bulk till lists.
fn till_columns(ean_width: u32, price_width: u32) -> [ColumnFormat; 5] {
    [
        ColumnFormat::new().width(ean_width).bold(),
        ColumnFormat::new().width(50).optimal_width(),
        ColumnFormat::new().width(12).grey_unit(),
        ColumnFormat::new().width(price_width).height(10),
        ColumnFormat::new().width(price_width).height(10),
    ]
}

fn till_sheet(
    name: &str,
    lists: &[Vec<Row>],
    columns: &[ColumnFormat],
    labels: &[&str],
) -> Result<GridSheet, AppError> {
    let mut b = ReportBuilder::new(GridSheet::new(name), 2, 0);
    b.add_data(lists, RowStyle::Block)?;
    b.add_columns(columns);
    b.format_columns();
    b.set_list_labels(labels, LABEL_CHAR_HEIGHT);
    b.set_page_style(&PageOptions::default());
    Ok(b.finish())
}

fn till_bread(source: &dyn DataSource, name: &str, supplier: &str) -> Result<GridSheet, AppError> {
    let bread = run_capitalized(source, &till_query().group("0020").supplier(supplier), 2)?;
    let pastries = run_capitalized(source, &till_query().group("0025").supplier(supplier), 2)?;

    let bread_label = format!("{} Brot", name);
    let pastry_label = format!("{} Kleingebäck", name);
    till_sheet(
        &format!("KassenlisteBrot{}", supplier),
        &[bread, pastries],
        &till_columns(15, 14),
        &[bread_label.as_str(), pastry_label.as_str()],
    )
}

fn till_meat(source: &dyn DataSource, name: &str, supplier: &str) -> Result<GridSheet, AppError> {
    let meat = run_capitalized(source, &till_query().group("0090").supplier(supplier), 2)?;

    let label = format!("Fleisch {}", name);
    till_sheet(
        &format!("KassenlisteFleisch{}", name),
        &[meat],
        &till_columns(15, 14),
        &[label.as_str()],
    )
}

fn till_bulk(source: &dyn DataSource) -> Result<GridSheet, AppError> {
    let queries = [
        till_query().group("0585"),
        till_query().group("0590"),
        till_query().internal_group("HH").group("0400"),
        till_query()
            .internal_group("HH")
            .groups(&["0070", "0200", "0280", "0340"]),
        till_query().internal_group("HH").groups(&["0020", "0025", "0060"]),
    ];
    let lists = queries
        .iter()
        .map(|q| run_capitalized(source, q, 2))
        .collect::<Result<Vec<_>, _>>()?;

    till_sheet(
        "KassenlisteLoseWare",
        &lists,
        &till_columns(32, 16),
        &[
            "Lose Lebensmittel",
            "Lose Waschmittel",
            "Säfte",
            "5 Elemente",
            "Tennental",
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Article;
    use crate::sheet::Sheet;
    use crate::value::CellContent;

    fn article(ean: &str, description: &str, group: &str, iwg: &str, supplier: &str) -> Article {
        Article {
            ean: ean.to_string(),
            description: description.to_string(),
            country: "DE".to_string(),
            unit: "KG".to_string(),
            member_price: 2.0,
            price: 2.4,
            manufacturer: "Hof".to_string(),
            group: group.to_string(),
            internal_group: iwg.to_string(),
            supplier: supplier.to_string(),
            scale: "A".to_string(),
            store: "PLATTSALAT".to_string(),
        }
    }

    fn source() -> JsonCatalog {
        JsonCatalog::from_articles(
            "PLATTSALAT",
            vec![
                article("101", "Möhren", VEGETABLES, "Kartoffel", ""),
                article("102", "Lauch", VEGETABLES, "kühl links", ""),
                article("201", "Äpfel Elstar", FRUIT, "Apfel", ""),
                article("301", "Dinkelbrot", "0020", "", "WEBER"),
                article("401", "Bratwurst", "0090", "kühl links", "URIA"),
            ],
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn ids_round_trip() {
        for report in Report::ALL {
            assert_eq!(Report::from_id(report.id()), Some(report));
            assert!(!report.description().is_empty());
        }
        assert_eq!(Report::from_id("nope"), None);
    }

    #[test]
    fn scale_list_layout() {
        let sheet = Report::ScaleList.build(&source(), today()).unwrap();
        assert_eq!(sheet.name(), "Waagenliste");
        assert!(sheet.page_style().is_landscape());
        assert_eq!(sheet.page_style().header.as_deref(), Some("01.05.2024"));
        assert_eq!(sheet.title_rows(), 1);
        assert_eq!(sheet.cell_text(1, 1).as_deref(), Some("Gemüse"));
        // units were capitalized
        assert_eq!(sheet.cell_text(5, 2).as_deref(), Some("Kg"));
    }

    #[test]
    fn location_pages_break_per_location() {
        let sheet = Report::ScaleLocationPages.build(&source(), today()).unwrap();
        // Apfel, Kartoffel and "kühl links" have one record each
        assert_eq!(sheet.page_breaks().count(), 2);
        assert_eq!(sheet.page_style().scale, 100);
        assert_eq!(sheet.cell_text(1, 1).as_deref(), Some("Äpfel Elstar"));
    }

    #[test]
    fn fridge_list_uses_location() {
        let sheet = Report::FridgeLeft.build(&source(), today()).unwrap();
        assert_eq!(sheet.name(), "Kühlschrank links");
        assert_eq!(sheet.cell_text(0, 0).as_deref(), Some("EAN"));
        // the lone list keeps its (unlabelled) label row
        assert_eq!(sheet.cell_text(1, 1), None);
        assert_eq!(sheet.cell_text(1, 2).as_deref(), Some("Bratwurst"));
        assert_eq!(sheet.cell_text(1, 3).as_deref(), Some("Lauch"));
        assert_eq!(sheet.column_width(1), 9000);
    }

    #[test]
    fn till_lists_filter_by_supplier() {
        let sheet = Report::TillBreadWeber.build(&source(), today()).unwrap();
        assert_eq!(sheet.cell_text(1, 0).as_deref(), Some("Weber Brot"));
        assert_eq!(sheet.cell_text(1, 1).as_deref(), Some("Dinkelbrot"));

        let err = Report::TillBreadSchaefer.build(&source(), today()).unwrap_err();
        assert!(matches!(err, AppError::EmptyInput));
    }

    #[test]
    fn failing_source_aborts_the_report() {
        struct Broken;
        impl DataSource for Broken {
            fn run(&self, _query: &Query) -> Result<Vec<Row>, AppError> {
                Err(AppError::DataSource("connection refused".to_string()))
            }
        }
        let err = Report::TillBulk.build(&Broken, today()).unwrap_err();
        assert!(matches!(err, AppError::DataSource(_)));
    }

    #[test]
    fn till_produce_is_fitted() {
        let sheet = Report::TillProduce.build(&source(), today()).unwrap();
        assert!(sheet.page_style().scale > 0);
        // Lauch sorts before Möhren
        assert_eq!(sheet.content(0, 1), Some(&CellContent::Text("102".into())));
    }
}
