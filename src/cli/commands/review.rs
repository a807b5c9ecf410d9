use crate::api::InvoiceApi;
use crate::cli::commands::{connect, print_attribute_table};
use crate::config::InvoiceReviewConfig;
use crate::dashboard::DashboardRow;
use crate::invoice::{AttributeEditor, AttributeSelector, EditorError};
use crate::workflow::{ReviewSession, ReviewSettings, StepOutcome, WizardStep};
use anyhow::{anyhow, bail, Result};
use std::sync::Arc;

pub struct ReviewCommand {
    pub id: String,
    pub set: Vec<String>,
    pub confirm: Vec<String>,
    pub map_all: bool,
    pub through: Option<WizardStep>,
    config: InvoiceReviewConfig,
}

impl ReviewCommand {
    pub fn new(id: String, config: InvoiceReviewConfig) -> Self {
        Self {
            id,
            set: Vec::new(),
            confirm: Vec::new(),
            map_all: false,
            through: None,
            config,
        }
    }

    pub fn with_edits(mut self, set: Vec<String>, confirm: Vec<String>, map_all: bool) -> Self {
        self.set = set;
        self.confirm = confirm;
        self.map_all = map_all;
        self
    }

    pub fn with_through(mut self, through: Option<WizardStep>) -> Self {
        self.through = through;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        println!("✏️  REVIEW INVOICE {}", self.id);
        println!("==================");
        println!();

        let api: Arc<dyn InvoiceApi> = connect(&self.config)?;
        let settings = ReviewSettings {
            mapping: self.config.mapping_rules(),
            validation: self.config.validation_rules(),
        };
        let mut session = ReviewSession::open(api, &self.id, settings).await?;

        if !DashboardRow::from_invoice(session.invoice()).can_open {
            bail!(
                "Invoice {} is {} and can no longer be reviewed",
                self.id,
                session.invoice().state
            );
        }

        let edits = apply_edits(session.editor_mut(), &self.set, &self.confirm, self.map_all)?;
        if edits > 0 {
            println!("📝 Applied {edits} edits");
        }

        let target = self.through.unwrap_or_else(|| session.step());
        loop {
            let step = session.step();
            print_stepper(step);
            if step == WizardStep::Success || step > target {
                break;
            }
            print_step_details(&mut session);

            let result = session.next().await;
            for notice in session.take_notices() {
                println!("{notice}");
            }
            match result {
                Ok(StepOutcome::Advanced(next)) => {
                    println!("➡️  {step} committed, now at {next}");
                    println!();
                }
                Ok(StepOutcome::Discarded) => {
                    println!("🏠 Invoice discarded, back to the invoice list");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(preview) = session.generated_preview() {
            println!(
                "🏁 {} uploaded ({} bytes)",
                session.invoice().custom_invoice_file_name(),
                preview.len()
            );
            println!("💡 Download it with 'invoice-review download {}'", self.id);
        } else if session.step() != WizardStep::Success {
            println!("💡 Continue with 'invoice-review review {} --through generate'", self.id);
        }
        Ok(())
    }
}

/// Apply `--set`, `--confirm` and `--map-all` to the editor; returns the number of edits.
///
/// Setting a value also confirms the attribute, like leaving an edited field does.
pub fn apply_edits(
    editor: &mut AttributeEditor,
    set: &[String],
    confirm: &[String],
    map_all: bool,
) -> Result<usize> {
    let mut count = 0;
    for assignment in set {
        let (selector, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected SEL=VALUE, got '{assignment}'"))?;
        let id = editor.resolve(&selector.parse::<AttributeSelector>()?)?;
        editor.set_value(id, value.trim())?;
        editor.confirm(id)?;
        count += 1;
    }

    for selector in confirm {
        let id = editor.resolve(&selector.parse::<AttributeSelector>()?)?;
        match editor.confirm(id) {
            Ok(()) => {}
            // Confirming a parent maps its whole subtree
            Err(EditorError::NotALeaf(_)) => editor.set_mapped(id, true)?,
            Err(e) => return Err(e.into()),
        }
        count += 1;
    }

    if map_all {
        editor.select_all(true);
        count += 1;
    }
    Ok(count)
}

fn print_stepper(current: WizardStep) {
    let steps: Vec<String> = WizardStep::STEPS
        .iter()
        .map(|step| {
            let mark = if *step == current {
                "●"
            } else if *step < current {
                "✔"
            } else {
                "○"
            };
            format!("{mark} {}", step.label())
        })
        .collect();
    println!("🧭 {}", steps.join("  →  "));
    if current == WizardStep::Success {
        println!("🎉 {}", current.label());
    }
}

fn print_step_details(session: &mut ReviewSession) {
    match session.step() {
        WizardStep::Mapping => {
            print_attribute_table(session.editor());
            let unmapped = session.editor().unmapped_required();
            if !unmapped.is_empty() {
                println!("⚠️  Still unmapped: {}", unmapped.join(", "));
            }
        }
        WizardStep::Validate => {
            let report = session.validation_report();
            for result in &report.results {
                let mark = if result.is_valid { "✅" } else { "❌" };
                println!(
                    "   {} {:<16} {:<14} {}",
                    mark,
                    result.attribute_name,
                    result.attribute_value.as_deref().unwrap_or(""),
                    result.message
                );
            }
        }
        WizardStep::Generate => println!("🛠️  Generating custom invoice..."),
        WizardStep::Success => {}
    }
}
