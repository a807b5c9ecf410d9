//! Review workflow: the step wizard and the session that commits each step.

pub mod controller;
pub mod wizard;

pub use controller::{
    NextAction, Notice, NoticeLevel, ReviewSession, ReviewSettings, StepOutcome, WorkflowError,
    DISCARDED_NOTICE, GENERATED_NOTICE, VALIDATED_NOTICE,
};
pub use wizard::{current_step, wizard_for, Wizard, WizardEvent, WizardStep};
