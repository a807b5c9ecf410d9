// Invoice Review Library - attribute mapping, validation and generation workflow
// This exposes the core components for the CLI and for integration tests

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod highlight;
pub mod invoice;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use api::{ApiError, InvoiceApi, InvoiceApiClient};
pub use config::InvoiceReviewConfig;
pub use dashboard::DashboardRow;
pub use highlight::{extract_highlights, Highlight, HighlightLayer, PdfPreview, PdfSource, PreviewSlot};
pub use invoice::{
    validate, Attribute, AttributeEditor, AttributeId, AttributeSelector, Invoice, InvoiceState,
    MappingRules, ValidationReport, ValidationRules,
};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflow::{ReviewSession, ReviewSettings, StepOutcome, WizardStep, WorkflowError};
