use crate::invoice::model::Attribute;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub const INVOICE_ID: &str = "InvoiceId";
pub const INVOICE_DATE: &str = "InvoiceDate";
pub const INVOICE_TOTAL: &str = "InvoiceTotal";

/// Invoice totals must stay strictly below one lakh
pub const DEFAULT_TOTAL_CEILING: f64 = 100_000.0;

pub const INVALID_DATE_FORMAT: &str = "Invalid date format";
pub const FUTURE_DATE: &str = "Date should not be in the future";
pub const TOTAL_TOO_LARGE: &str = "Invoice total must be less than 1 Lakh";
pub const TOTAL_NOT_A_NUMBER: &str = "Invoice total must be a number";

static STRICT_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("date regex is valid"));

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRules {
    pub allowed_fields: Vec<String>,
    pub total_ceiling: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            allowed_fields: [INVOICE_ID, INVOICE_DATE, INVOICE_TOTAL]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            total_ceiling: DEFAULT_TOTAL_CEILING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub attribute_name: String,
    pub attribute_value: Option<String>,
    pub is_valid: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| !r.is_valid)
    }

    pub fn get(&self, name: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.attribute_name == name)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.is_valid)
    }
}

/// Parse a `DD/MM/YYYY` date, rejecting anything that is not exactly that shape
pub fn parse_strict_date(value: &str) -> Option<NaiveDate> {
    if !STRICT_DATE_RE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%d/%m/%Y").ok()
}

pub fn check_invoice_date(value: Option<&str>, today: NaiveDate) -> Result<(), &'static str> {
    let date = value.and_then(parse_strict_date).ok_or(INVALID_DATE_FORMAT)?;
    if date > today {
        return Err(FUTURE_DATE);
    }
    Ok(())
}

/// Blank totals count as zero; thousands separators are ignored.
pub fn check_invoice_total(value: Option<&str>, ceiling: f64) -> Result<(), &'static str> {
    let raw = value.map(str::trim).unwrap_or_default().replace(',', "");
    let total = if raw.is_empty() {
        0.0
    } else {
        raw.parse::<f64>().map_err(|_| TOTAL_NOT_A_NUMBER)?
    };
    if !total.is_finite() {
        return Err(TOTAL_NOT_A_NUMBER);
    }
    if total >= ceiling {
        return Err(TOTAL_TOO_LARGE);
    }
    Ok(())
}

/// Check every allow-listed root attribute against its rule
pub fn validate(attributes: &[Attribute], rules: &ValidationRules, today: NaiveDate) -> ValidationReport {
    let results = attributes
        .iter()
        .filter(|attr| rules.allowed_fields.iter().any(|f| *f == attr.attribute_name))
        .map(|attr| {
            let value = attr.attribute_value.as_deref();
            let outcome = match attr.attribute_name.as_str() {
                INVOICE_DATE => check_invoice_date(value, today),
                INVOICE_TOTAL => check_invoice_total(value, rules.total_ceiling),
                _ => Ok(()),
            };
            ValidationResult {
                attribute_name: attr.attribute_name.clone(),
                attribute_value: attr.attribute_value.clone(),
                is_valid: outcome.is_ok(),
                message: outcome.err().unwrap_or_default().to_string(),
            }
        })
        .collect();

    ValidationReport { results }
}
