use crate::api::{ApiError, InvoiceApi};
use crate::highlight::{HighlightLayer, PreviewError, PreviewSlot};
use crate::invoice::{
    validate, AttributeEditor, EditorError, Invoice, InvoiceState, MappingRules, ValidationReport,
    ValidationRules,
};
use crate::workflow::wizard::{current_step, wizard_for, Wizard, WizardEvent, WizardStep};
use chrono::NaiveDate;
use statig::prelude::*;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

pub const DISCARDED_NOTICE: &str = "Invoice Discarded Successfully";
pub const VALIDATED_NOTICE: &str = "Invoice Validated Successfully";
pub const GENERATED_NOTICE: &str = "Invoice Generated Successfully";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Please map every attribute before continuing (unmapped: {})", .0.join(", "))]
    UnmappedAttributes(Vec<String>),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Preview(#[from] PreviewError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("the review of this invoice is already finished")]
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Toast-style message produced by the workflow for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Success => write!(f, "✅ {}", self.message),
            NoticeLevel::Error => write!(f, "❌ {}", self.message),
        }
    }
}

/// What the primary button does on the current step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    Next,
    Discard,
    Generate,
    GoHome,
}

/// Result of a successful forward move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced(WizardStep),
    /// The invoice was discarded; the user goes back to the dashboard
    Discarded,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewSettings {
    pub mapping: MappingRules,
    pub validation: ValidationRules,
}

/// Drives one invoice through mapping, validation and generation.
///
/// Each forward move commits to the invoice store first and only moves the
/// wizard when the commit succeeds. Failed commits leave the step untouched
/// and are reported as an error notice; nothing is retried.
pub struct ReviewSession {
    api: Arc<dyn InvoiceApi>,
    invoice: Invoice,
    editor: AttributeEditor,
    rules: ValidationRules,
    wizard: StateMachine<Wizard>,
    generated: PreviewSlot,
    notices: Vec<Notice>,
}

impl fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewSession")
            .field("invoice_id", &self.invoice.id)
            .field("state", &self.invoice.state)
            .field("step", &self.step())
            .field("validation_failed", &self.validation_failed())
            .finish()
    }
}

impl ReviewSession {
    /// Fetch the invoice and position the wizard from its state
    pub async fn open(
        api: Arc<dyn InvoiceApi>,
        id: &str,
        settings: ReviewSettings,
    ) -> Result<Self, WorkflowError> {
        let invoice = api.get_invoice(id).await?;
        Ok(Self::from_invoice(api, invoice, settings))
    }

    pub fn from_invoice(api: Arc<dyn InvoiceApi>, invoice: Invoice, settings: ReviewSettings) -> Self {
        let editor = AttributeEditor::new(&invoice.attributes, settings.mapping);
        let wizard = wizard_for(invoice.state);
        info!(
            invoice_id = %invoice.id,
            state = %invoice.state,
            step = %current_step(&wizard),
            "review session opened"
        );
        Self {
            api,
            invoice,
            editor,
            rules: settings.validation,
            wizard,
            generated: PreviewSlot::new(),
            notices: Vec::new(),
        }
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    pub fn step(&self) -> WizardStep {
        current_step(&self.wizard)
    }

    pub fn editor(&self) -> &AttributeEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut AttributeEditor {
        &mut self.editor
    }

    /// True while the Validate step shows a failing report for the current edits
    pub fn validation_failed(&self) -> bool {
        self.step() == WizardStep::Validate && self.validation_report().has_errors()
    }

    /// Generated output fetched during the last Generate commit
    pub fn generated_preview(&self) -> Option<&crate::highlight::PdfPreview> {
        self.generated.current()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Highlights for the current edit state
    pub fn highlights(&self) -> HighlightLayer {
        HighlightLayer::from_attributes(&self.editor.to_attributes())
    }

    pub fn validation_report_at(&self, today: NaiveDate) -> ValidationReport {
        validate(&self.editor.to_attributes(), &self.rules, today)
    }

    /// Validation of the current edits as of today
    pub fn validation_report(&self) -> ValidationReport {
        self.validation_report_at(chrono::Local::now().date_naive())
    }

    /// Recomputed on every call so edits and step changes are always reflected
    pub fn next_action(&self) -> NextAction {
        match self.step() {
            WizardStep::Mapping => NextAction::Next,
            WizardStep::Validate if self.validation_failed() => NextAction::Discard,
            WizardStep::Validate => NextAction::Next,
            WizardStep::Generate => NextAction::Generate,
            WizardStep::Success => NextAction::GoHome,
        }
    }

    /// Commit the active step, advancing only when the commit succeeds
    pub async fn next(&mut self) -> Result<StepOutcome, WorkflowError> {
        let result = match self.step() {
            WizardStep::Mapping => self.commit_mapping().await,
            WizardStep::Validate => self.commit_validation().await,
            WizardStep::Generate => self.generate().await,
            WizardStep::Success => Err(WorkflowError::Finished),
        };

        if let Err(err) = &result {
            let message = match err {
                WorkflowError::Api(api_err) => api_err.notice(),
                other => other.to_string(),
            };
            warn!(invoice_id = %self.invoice.id, step = %self.step(), "commit failed: {}", err);
            self.push_notice(NoticeLevel::Error, message);
        }
        result
    }

    /// Move one step back without touching the server
    pub fn back(&mut self) -> WizardStep {
        self.wizard.handle(&WizardEvent::Back);
        self.step()
    }

    async fn commit_mapping(&mut self) -> Result<StepOutcome, WorkflowError> {
        let unmapped = self.editor.unmapped_required();
        if !unmapped.is_empty() {
            return Err(WorkflowError::UnmappedAttributes(unmapped));
        }

        let mut updated = self.invoice.clone();
        updated.attributes = self.editor.to_attributes();
        updated.state = InvoiceState::AttributeMapped;
        self.persist(updated).await?;

        Ok(self.advance())
    }

    async fn commit_validation(&mut self) -> Result<StepOutcome, WorkflowError> {
        let report = self.validation_report();

        let mut updated = self.invoice.clone();
        updated.attributes = self.editor.to_attributes();

        if report.has_errors() {
            updated.state = InvoiceState::Discarded;
            self.persist(updated).await?;
            self.push_notice(NoticeLevel::Success, DISCARDED_NOTICE);
            return Ok(StepOutcome::Discarded);
        }

        updated.state = InvoiceState::Validated;
        self.persist(updated).await?;
        self.push_notice(NoticeLevel::Success, VALIDATED_NOTICE);
        Ok(self.advance())
    }

    /// Fetch the server-rendered output and upload it back as the custom invoice
    async fn generate(&mut self) -> Result<StepOutcome, WorkflowError> {
        let bytes = self.api.get_custom_invoice(&self.invoice.id).await?;
        self.generated.load_bytes(&bytes)?;

        let file_name = self.invoice.custom_invoice_file_name();
        self.api
            .upload_custom_invoice(&self.invoice.id, &file_name, bytes)
            .await?;

        self.push_notice(NoticeLevel::Success, GENERATED_NOTICE);
        Ok(self.advance())
    }

    async fn persist(&mut self, updated: Invoice) -> Result<(), WorkflowError> {
        self.api.update_invoice(&updated).await?;
        self.invoice = updated;
        Ok(())
    }

    fn advance(&mut self) -> StepOutcome {
        self.wizard.handle(&WizardEvent::Advance);
        let step = self.step();
        info!(invoice_id = %self.invoice.id, step = %step, "wizard advanced");
        StepOutcome::Advanced(step)
    }

    fn push_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
        };
        match level {
            NoticeLevel::Success => info!("{}", notice.message),
            NoticeLevel::Error => error!("{}", notice.message),
        }
        self.notices.push(notice);
    }
}
