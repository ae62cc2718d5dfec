// ============================================================================
// Values
// ============================================================================

/// Integers at or above this value are written as text, not as numbers.
///
/// EANs come out of the catalog as long digit strings; once they are parsed
/// into integers a spreadsheet would show them in scientific notation, so
/// anything this large is treated as an identifier.
pub const NUMERIC_OVERFLOW_SENTINEL: i64 = 2_000_000_000;

/// Number format used for every `Amount` cell (German locale, Euro).
pub const CURRENCY_FORMAT: &str = "#,##0.00 [$€-407]";

/// A scalar coming out of the data source.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    /// Decimal amount, tagged for currency formatting.
    Amount(f64),
}

/// One record of a record-group.
pub type Row = Vec<CellValue>;

/// What a sheet cell holds after the rendering rules are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Text(String),
    Number(f64),
    Currency(f64),
}

impl CellValue {
    pub fn to_content(&self) -> CellContent {
        match self {
            CellValue::Text(s) => CellContent::Text(s.clone()),
            CellValue::Integer(n) if *n < NUMERIC_OVERFLOW_SENTINEL => CellContent::Number(*n as f64),
            CellValue::Integer(n) => CellContent::Text(n.to_string()),
            CellValue::Amount(a) => CellContent::Currency(*a),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl CellContent {
    /// Text as a printed sheet shows it.
    pub fn display_text(&self) -> String {
        match self {
            CellContent::Text(s) => s.clone(),
            CellContent::Number(n) if n.fract() == 0.0 => format!("{:.0}", n),
            CellContent::Number(n) => n.to_string().replace('.', ","),
            CellContent::Currency(a) => format!("{} €", format_german_decimal(*a)),
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, CellContent::Text(_))
    }
}

/// `1234.5` -> `1.234,50`
fn format_german_decimal(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{},{}", sign, grouped, frac_part)
}

/// First character upper case, the rest lower case ("KG" -> "Kg").
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Capitalize the text in column `col` of every row.
pub fn capitalize_column(rows: &mut [Row], col: usize) {
    for row in rows.iter_mut() {
        if let Some(CellValue::Text(s)) = row.get_mut(col) {
            *s = capitalize(s);
        }
    }
}
