//! Product catalog access.
//!
//! Reports describe what they need as a [`Query`]: the columns to select,
//! their type tags and equality / set-membership filters. A [`DataSource`]
//! runs it. The shipped source is [`JsonCatalog`], an export of the
//! article-info view read from a JSON file.

use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;
use crate::value::{CellValue, Row};

// ============================================================================
// Fields and Conditions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Ean,
    Description,
    Country,
    Unit,
    MemberPrice,
    Price,
    Manufacturer,
    Group,
    InternalGroup,
    Supplier,
    Scale,
    Store,
}

impl Field {
    /// Column name in the article-info view.
    pub fn column(&self) -> &'static str {
        match self {
            Field::Ean => "EAN",
            Field::Description => "Bezeichnung",
            Field::Country => "Land",
            Field::Unit => "VKEinheit",
            Field::MemberPrice => "VK1",
            Field::Price => "VK0",
            Field::Manufacturer => "Hersteller",
            Field::Group => "WG",
            Field::InternalGroup => "iWG",
            Field::Supplier => "LiefID",
            Field::Scale => "Waage",
            Field::Store => "LadenID",
        }
    }

    /// Select expression. The EAN is stored as a decimal and selected as
    /// plain digits.
    fn select(&self) -> String {
        match self {
            Field::Ean => "CAST(CAST(EAN AS DECIMAL(20)) AS VARCHAR(20))".to_string(),
            other => other.column().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Eq(Field, String),
    In(Field, Vec<String>),
}

impl Condition {
    pub fn eq(field: Field, value: &str) -> Self {
        Condition::Eq(field, value.to_string())
    }

    pub fn one_of(field: Field, values: &[&str]) -> Self {
        Condition::In(field, values.iter().map(|v| v.to_string()).collect())
    }

    fn to_sql(&self) -> String {
        match self {
            Condition::Eq(field, value) => format!("{} = {}", field.column(), quote(value)),
            Condition::In(field, values) => {
                let list: Vec<String> = values.iter().map(|v| quote(v)).collect();
                format!("{} IN ({})", field.column(), list.join(","))
            }
        }
    }

    fn matches(&self, article: &Article) -> bool {
        match self {
            Condition::Eq(field, value) => article.text(*field) == *value,
            Condition::In(field, values) => {
                let text = article.text(*field);
                values.iter().any(|v| *v == text)
            }
        }
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ============================================================================
// Query
// ============================================================================

/// Column list, type tags and filters of one catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    fields: Vec<Field>,
    /// One tag per field: `S` text, `D` decimal, `I` integer.
    types: String,
    conditions: Vec<Condition>,
}

impl Query {
    pub fn new(fields: &[Field], types: &str) -> Self {
        Query {
            fields: fields.to_vec(),
            types: types.to_string(),
            conditions: Vec::new(),
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Only articles on the scale list.
    pub fn on_scale(self) -> Self {
        self.when(Condition::eq(Field::Scale, "A"))
    }

    pub fn group(self, group: &str) -> Self {
        self.when(Condition::eq(Field::Group, group))
    }

    pub fn groups(self, groups: &[&str]) -> Self {
        self.when(Condition::one_of(Field::Group, groups))
    }

    pub fn internal_group(self, group: &str) -> Self {
        self.when(Condition::eq(Field::InternalGroup, group))
    }

    pub fn supplier(self, supplier: &str) -> Self {
        self.when(Condition::eq(Field::Supplier, supplier))
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// The statement against the article-info view, scoped to `store`.
    pub fn to_sql(&self, store: &str) -> String {
        let cols: Vec<String> = self.fields.iter().map(Field::select).collect();
        let mut conds = vec![Condition::eq(Field::Store, store).to_sql()];
        conds.extend(self.conditions.iter().map(Condition::to_sql));
        format!(
            "SELECT DISTINCT {} FROM V_Artikelinfo WHERE {} ORDER BY Bezeichnung",
            cols.join(","),
            conds.join(" AND ")
        )
    }

    fn tags(&self) -> Result<Vec<(Field, char)>, AppError> {
        if self.types.chars().count() != self.fields.len() {
            return Err(AppError::DataSource(format!(
                "type tags {:?} do not match {} columns",
                self.types,
                self.fields.len()
            )));
        }
        Ok(self.fields.iter().copied().zip(self.types.chars()).collect())
    }
}

// ============================================================================
// Data Source
// ============================================================================

pub trait DataSource {
    /// Rows in description order, without duplicates.
    fn run(&self, query: &Query) -> Result<Vec<Row>, AppError>;
}

/// One record of the article-info view.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Article {
    #[serde(rename = "EAN")]
    pub ean: String,
    #[serde(rename = "Bezeichnung")]
    pub description: String,
    #[serde(rename = "Land", default)]
    pub country: String,
    #[serde(rename = "VKEinheit", default)]
    pub unit: String,
    #[serde(rename = "VK1", default)]
    pub member_price: f64,
    #[serde(rename = "VK0", default)]
    pub price: f64,
    #[serde(rename = "Hersteller", default)]
    pub manufacturer: String,
    #[serde(rename = "WG", default)]
    pub group: String,
    #[serde(rename = "iWG", default)]
    pub internal_group: String,
    #[serde(rename = "LiefID", default)]
    pub supplier: String,
    #[serde(rename = "Waage", default)]
    pub scale: String,
    #[serde(rename = "LadenID", default)]
    pub store: String,
}

impl Article {
    fn text(&self, field: Field) -> String {
        match field {
            Field::Ean => self.ean.clone(),
            Field::Description => self.description.clone(),
            Field::Country => self.country.clone(),
            Field::Unit => self.unit.clone(),
            Field::MemberPrice => self.member_price.to_string(),
            Field::Price => self.price.to_string(),
            Field::Manufacturer => self.manufacturer.clone(),
            Field::Group => self.group.clone(),
            Field::InternalGroup => self.internal_group.clone(),
            Field::Supplier => self.supplier.clone(),
            Field::Scale => self.scale.clone(),
            Field::Store => self.store.clone(),
        }
    }

    fn value(&self, field: Field, tag: char) -> Result<CellValue, AppError> {
        let text = match field {
            Field::Ean => normalize_ean(&self.ean)?,
            Field::MemberPrice | Field::Price => {
                let amount = if field == Field::Price {
                    self.price
                } else {
                    self.member_price
                };
                return match tag {
                    'D' => Ok(CellValue::Amount(amount)),
                    'I' => Ok(CellValue::Integer(amount.trunc() as i64)),
                    'S' => Ok(CellValue::Text(amount.to_string())),
                    other => Err(unknown_tag(other)),
                };
            }
            other => self.text(other),
        };

        match tag {
            'S' => Ok(CellValue::Text(text)),
            'D' => text.trim().parse().map(CellValue::Amount).map_err(|_| {
                AppError::DataSource(format!("{} value {:?} is not a decimal", field.column(), text))
            }),
            'I' => text.trim().parse().map(CellValue::Integer).map_err(|_| {
                AppError::DataSource(format!("{} value {:?} is not an integer", field.column(), text))
            }),
            other => Err(unknown_tag(other)),
        }
    }
}

fn unknown_tag(tag: char) -> AppError {
    AppError::DataSource(format!("unknown type tag {:?}", tag))
}

/// Digits only, no fraction, no leading zeros: `"0004001234.0"` -> `"4001234"`.
fn normalize_ean(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    let int_part = raw.split('.').next().unwrap_or(raw);
    if int_part.is_empty() || !int_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::DataSource(format!("EAN {:?} is not numeric", raw)));
    }
    let digits = int_part.trim_start_matches('0');
    Ok(if digits.is_empty() { "0" } else { digits }.to_string())
}

/// Catalog exported as a JSON array of articles.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    store: String,
    articles: Vec<Article>,
}

impl JsonCatalog {
    pub fn open(path: &Path, store: &str) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::DataSource(format!("{}: {}", path.display(), e)))?;
        let articles: Vec<Article> = serde_json::from_str(&content)?;
        log::debug!("catalog {}: {} articles", path.display(), articles.len());
        Ok(Self::from_articles(store, articles))
    }

    pub fn from_articles(store: &str, mut articles: Vec<Article>) -> Self {
        articles.sort_by(|a, b| a.description.cmp(&b.description));
        JsonCatalog {
            store: store.to_string(),
            articles,
        }
    }
}

impl DataSource for JsonCatalog {
    fn run(&self, query: &Query) -> Result<Vec<Row>, AppError> {
        log::debug!("query: {}", query.to_sql(&self.store));
        let tags = query.tags()?;

        let mut rows: Vec<Row> = Vec::new();
        for article in self
            .articles
            .iter()
            .filter(|a| a.store == self.store)
            .filter(|a| query.conditions.iter().all(|c| c.matches(a)))
        {
            let row = tags
                .iter()
                .map(|&(field, tag)| article.value(field, tag))
                .collect::<Result<Row, AppError>>()?;
            if !rows.contains(&row) {
                rows.push(row);
            }
        }

        log::debug!("query returned {} rows", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(ean: &str, description: &str, group: &str) -> Article {
        Article {
            ean: ean.to_string(),
            description: description.to_string(),
            country: "DE".to_string(),
            unit: "kg".to_string(),
            member_price: 2.5,
            price: 2.99,
            manufacturer: String::new(),
            group: group.to_string(),
            internal_group: String::new(),
            supplier: String::new(),
            scale: "A".to_string(),
            store: "PLATTSALAT".to_string(),
        }
    }

    fn catalog() -> JsonCatalog {
        let mut other_store = article("9", "Zucchini", "0001");
        other_store.store = "ELSEWHERE".to_string();
        let mut off_scale = article("10", "Aubergine", "0001");
        off_scale.scale = String::new();
        JsonCatalog::from_articles(
            "PLATTSALAT",
            vec![
                article("0003", "Möhren", "0001"),
                article("2.0", "Birnen", "0003"),
                article("1", "Äpfel", "0003"),
                article("3", "Möhren", "0001"),
                article("4", "Kartoffeln", "0001"),
                other_store,
                off_scale,
            ],
        )
    }

    #[test]
    fn sql_text() {
        let q = Query::new(&[Field::Ean, Field::Description, Field::MemberPrice], "SSD")
            .on_scale()
            .internal_group("HH")
            .groups(&["0070", "0200"]);
        assert_eq!(
            q.to_sql("PLATTSALAT"),
            "SELECT DISTINCT CAST(CAST(EAN AS DECIMAL(20)) AS VARCHAR(20)),Bezeichnung,VK1 \
             FROM V_Artikelinfo WHERE LadenID = 'PLATTSALAT' AND Waage = 'A' AND iWG = 'HH' \
             AND WG IN ('0070','0200') ORDER BY Bezeichnung"
        );
    }

    #[test]
    fn sql_quotes_values() {
        let q = Query::new(&[Field::Description], "S").internal_group("kühl's");
        assert!(q.to_sql("X").contains("iWG = 'kühl''s'"));
    }

    #[test]
    fn filters_scopes_and_orders() {
        let q = Query::new(&[Field::Ean, Field::Description], "SS")
            .on_scale()
            .group("0001");
        let rows = catalog().run(&q).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![CellValue::from("4"), CellValue::from("Kartoffeln")],
                vec![CellValue::from("3"), CellValue::from("Möhren")],
            ]
        );
    }

    #[test]
    fn set_membership_and_typed_columns() {
        let q = Query::new(&[Field::Description, Field::MemberPrice, Field::Price], "SDD")
            .groups(&["0003"]);
        let rows = catalog().run(&q).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], CellValue::from("Birnen"));
        assert_eq!(rows[0][1], CellValue::Amount(2.5));
        assert_eq!(rows[0][2], CellValue::Amount(2.99));
    }

    #[test]
    fn distinct_rows() {
        let q = Query::new(&[Field::Description, Field::Unit], "SS").group("0001");
        let rows = catalog().run(&q).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn integer_ean_column() {
        let q = Query::new(&[Field::Ean], "I").group("0003");
        let rows = catalog().run(&q).unwrap();
        assert_eq!(rows, vec![vec![CellValue::Integer(2)], vec![CellValue::Integer(1)]]);
    }

    #[test]
    fn bad_tags_are_data_source_errors() {
        let short = Query::new(&[Field::Ean, Field::Description], "S");
        assert!(matches!(catalog().run(&short), Err(AppError::DataSource(_))));

        let not_decimal = Query::new(&[Field::Description], "D");
        assert!(matches!(catalog().run(&not_decimal), Err(AppError::DataSource(_))));

        let unknown = Query::new(&[Field::Description], "X");
        assert!(matches!(catalog().run(&unknown), Err(AppError::DataSource(_))));
    }

    #[test]
    fn ean_normalization() {
        assert_eq!(normalize_ean("0004001234").unwrap(), "4001234");
        assert_eq!(normalize_ean("4001234.0").unwrap(), "4001234");
        assert_eq!(normalize_ean("000").unwrap(), "0");
        assert!(normalize_ean("abc").is_err());
    }

    #[test]
    fn missing_file_is_a_data_source_error() {
        let err = JsonCatalog::open(Path::new("does/not/exist.json"), "X").unwrap_err();
        assert!(matches!(err, AppError::DataSource(_)));
    }
}
