use crate::invoice::InvoiceState;
use serde::{Deserialize, Serialize};
use statig::prelude::*;
use std::fmt;

/// Position in the three-step review wizard, plus the terminal success screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WizardStep {
    Mapping,
    Validate,
    Generate,
    Success,
}

impl WizardStep {
    pub const STEPS: [WizardStep; 3] = [WizardStep::Mapping, WizardStep::Validate, WizardStep::Generate];

    /// Step shown when an invoice is opened in the given state
    pub fn initial_for(state: InvoiceState) -> Self {
        match state {
            InvoiceState::AttributeMapped | InvoiceState::Discarded => WizardStep::Validate,
            InvoiceState::Validated => WizardStep::Generate,
            _ => WizardStep::Mapping,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            WizardStep::Mapping => 0,
            WizardStep::Validate => 1,
            WizardStep::Generate => 2,
            WizardStep::Success => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WizardStep::Mapping => "Attribute Mapping",
            WizardStep::Validate => "Validate",
            WizardStep::Generate => "Custom Invoice",
            WizardStep::Success => "Invoice Generated Successfully",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    /// Jump straight to a step when reopening an invoice; only honoured before any move
    Resume(WizardStep),
    Advance,
    Back,
}

/// Step-position state machine. Commit side effects live in the review session;
/// this only knows which moves are legal.
#[derive(Debug, Default)]
pub struct Wizard;

#[state_machine(initial = "State::mapping()")]
impl Wizard {
    #[state]
    fn mapping(event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Resume(WizardStep::Validate) => Transition(State::validate()),
            WizardEvent::Resume(WizardStep::Generate) => Transition(State::generate()),
            WizardEvent::Advance => Transition(State::validate()),
            _ => Handled,
        }
    }

    #[state]
    fn validate(event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Advance => Transition(State::generate()),
            WizardEvent::Back => Transition(State::mapping()),
            _ => Handled,
        }
    }

    #[state]
    fn generate(event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Advance => Transition(State::success()),
            WizardEvent::Back => Transition(State::validate()),
            _ => Handled,
        }
    }

    #[state]
    fn success(event: &WizardEvent) -> Outcome<State> {
        let _ = event;
        Handled
    }
}

/// Current step of a wizard state machine
pub fn current_step(machine: &StateMachine<Wizard>) -> WizardStep {
    match machine.state() {
        State::Mapping { .. } => WizardStep::Mapping,
        State::Validate { .. } => WizardStep::Validate,
        State::Generate { .. } => WizardStep::Generate,
        State::Success { .. } => WizardStep::Success,
    }
}

/// Build a wizard positioned at the step matching the invoice state
pub fn wizard_for(state: InvoiceState) -> StateMachine<Wizard> {
    let mut machine = Wizard.state_machine();
    machine.handle(&WizardEvent::Resume(WizardStep::initial_for(state)));
    machine
}
