// Invoice data model, attribute editing and validation rules

pub mod editor;
pub mod model;
pub mod validation;

pub use editor::{
    AttributeEditor, AttributeId, AttributeRef, AttributeSelector, ChildrenDialog, DialogRow,
    EditorError, MappingRules,
};
pub use model::{Attribute, Invoice, InvoiceState, Position};
pub use validation::{validate, ValidationReport, ValidationResult, ValidationRules};
