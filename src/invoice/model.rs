use crate::workflow::WizardStep;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Lifecycle state of an invoice as reported by the invoice store.
///
/// The store sends a bare integer; values outside the known range are kept
/// as `Unknown` so they survive a round-trip untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum InvoiceState {
    #[default]
    Processing,
    Processed,
    AttributeMapped,
    Discarded,
    Validated,
    Completed,
    Unknown(i64),
}

impl From<i64> for InvoiceState {
    fn from(code: i64) -> Self {
        match code {
            0 => InvoiceState::Processing,
            1 => InvoiceState::Processed,
            2 => InvoiceState::AttributeMapped,
            3 => InvoiceState::Discarded,
            4 => InvoiceState::Validated,
            5 => InvoiceState::Completed,
            other => InvoiceState::Unknown(other),
        }
    }
}

impl From<InvoiceState> for i64 {
    fn from(state: InvoiceState) -> Self {
        match state {
            InvoiceState::Processing => 0,
            InvoiceState::Processed => 1,
            InvoiceState::AttributeMapped => 2,
            InvoiceState::Discarded => 3,
            InvoiceState::Validated => 4,
            InvoiceState::Completed => 5,
            InvoiceState::Unknown(code) => code,
        }
    }
}

impl InvoiceState {
    /// Status label shown on the dashboard grid
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceState::Processing => "Processing",
            InvoiceState::Processed => "Processed",
            InvoiceState::AttributeMapped => "Attribute Mapped",
            InvoiceState::Discarded => "Discarded",
            InvoiceState::Validated => "Validated",
            InvoiceState::Completed => "Completed",
            InvoiceState::Unknown(_) => "Unknown",
        }
    }

    pub fn code(&self) -> i64 {
        (*self).into()
    }

    /// Wizard step an invoice in this state is reopened at
    pub fn wizard_step(&self) -> WizardStep {
        WizardStep::initial_for(*self)
    }
}

impl fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Highlight rectangle for one attribute occurrence, in percent of the page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default)]
    pub page_index: u32,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

/// Extracted attribute. Line items nest under their parent through `children`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub attribute_name: String,
    #[serde(default)]
    pub attribute_value: Option<String>,
    #[serde(default)]
    pub is_attribute_mapped: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub position: Vec<Position>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<Attribute>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            attribute_name: name.into(),
            attribute_value: value.map(str::to_string),
            is_attribute_mapped: false,
            position: Vec::new(),
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Attribute>) -> Self {
        self.children = children;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position.push(position);
        self
    }

    pub fn mapped(mut self, mapped: bool) -> Self {
        self.is_attribute_mapped = mapped;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Local working copy of an invoice held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub state: InvoiceState,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub custom_generated_invoice_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Invoice {
    /// File name under which the generated output is uploaded
    pub fn custom_invoice_file_name(&self) -> String {
        format!("Custom_Invoice_{}", self.file_name)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invoice id must be a string or number, got {other}"
        ))),
    }
}
