//! Error and diagnostic types.
//!
//! The core grammar is total: only directive contract violations can fail,
//! and only when the caller asked for strict directives. Everything else
//! that deserves attention is reported as a [`Diagnostic`] next to the tree.

use crate::location::SourceLocation;
use thiserror::Error;

/// A directive's options did not satisfy its contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("directive `{directive}` at {location}: {message}")]
pub struct DirectiveContractError {
    pub directive: String,
    pub message: String,
    pub location: SourceLocation,
}

impl DirectiveContractError {
    pub fn new(
        directive: impl Into<String>,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            directive: directive.into(),
            message: message.into(),
            location,
        }
    }
}

/// Failure of a whole `parse` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Raised only when `strict_directives` is enabled.
    #[error(transparent)]
    Directive(#[from] DirectiveContractError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DiagnosticKind {
    UnknownDirective { name: String },
    UnknownRole { name: String },
    /// A role given options its contract rejects; kept literal.
    RoleContract { name: String },
    DirectiveContract(DirectiveContractError),
    /// Directive bodies nested deeper than the limit are kept literal.
    DirectiveTooDeep { name: String },
}

/// A warning or recoverable error found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn unknown_directive(name: &str, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Warning,
            kind: DiagnosticKind::UnknownDirective { name: name.to_owned() },
            message: format!("unknown directive `{name}`, rendered literally"),
            location,
        }
    }

    pub fn unknown_role(name: &str, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Warning,
            kind: DiagnosticKind::UnknownRole { name: name.to_owned() },
            message: format!("unknown role `{name}`, rendered literally"),
            location,
        }
    }

    pub fn role_contract(name: &str, message: &str, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Warning,
            kind: DiagnosticKind::RoleContract { name: name.to_owned() },
            message: format!("role `{name}`: {message}, rendered literally"),
            location,
        }
    }

    pub fn contract(err: DirectiveContractError) -> Self {
        Self {
            severity: Severity::Error,
            message: err.to_string(),
            location: err.location,
            kind: DiagnosticKind::DirectiveContract(err),
        }
    }

    pub fn too_deep(name: &str, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Warning,
            kind: DiagnosticKind::DirectiveTooDeep { name: name.to_owned() },
            message: format!("directive `{name}` nested too deeply, rendered literally"),
            location,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level} at {}: {}", self.location, self.message)
    }
}
