//! Operation outcomes with non-fatal warnings
//!
//! A lifecycle transition that commits successfully may still fail to
//! generate its document or notify the customer. Those failures never undo
//! the transition; they are reported alongside the committed value.

use super::error::RentalError;
use std::fmt;

/// Post-commit step that produced a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    /// Rendering the agreement or invoice
    Document,

    /// Saving the document reference on the rental
    DocumentLink,

    /// Sending the customer notification
    Notification,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchStage::Document => write!(f, "document"),
            DispatchStage::DocumentLink => write!(f, "document link"),
            DispatchStage::Notification => write!(f, "notification"),
        }
    }
}

/// A collaborator failure after a committed transition
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub stage: DispatchStage,
    pub error: RentalError,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

/// Committed result of an operation plus any warnings
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    /// Outcome without warnings
    pub fn new(value: T) -> Self {
        Outcome {
            value,
            warnings: Vec::new(),
        }
    }

    /// Record a warning
    pub fn warn(&mut self, stage: DispatchStage, error: RentalError) {
        self.warnings.push(Warning { stage, error });
    }

    /// Whether every post-commit step succeeded
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
