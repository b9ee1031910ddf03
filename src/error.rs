//! Error and diagnostic types.
//!
//! Fatal problems abort a parse with an [`OverlayError`]. Recoverable problems
//! are collected as [`Diagnostic`]s on the returned
//! [`ParseResult`](crate::ParseResult).

use crate::pair::{BodyName, CollisionPair};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A 1-based line and column within a description text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    /// Converts a byte offset into `text` to a line and column.
    ///
    /// Offsets past the end are clamped to the end of the text.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut end = offset.min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let prefix = &text[..end];
        let line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map_or(0, |i| i + 1);
        let column = prefix[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn at(location: &Option<SourceLocation>) -> String {
    location.map(|l| format!(" at {l}")).unwrap_or_default()
}

/// Fatal errors. Any of these aborts the parse before the model is touched.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// A locator could not be resolved to text.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// The robot (URDF) text is not a valid description.
    #[error("malformed robot description{}: {message}", at(.location))]
    MalformedRobotDescription {
        message: String,
        location: Option<SourceLocation>,
    },

    /// The semantic (SRDF) text is not a valid description.
    #[error("malformed semantic description{}: {message}", at(.location))]
    MalformedSemanticDescription {
        message: String,
        location: Option<SourceLocation>,
    },
}

impl OverlayError {
    pub fn malformed_robot(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self::MalformedRobotDescription {
            message: message.into(),
            location,
        }
    }

    pub fn malformed_semantic(
        message: impl Into<String>,
        location: Option<SourceLocation>,
    ) -> Self {
        Self::MalformedSemanticDescription {
            message: message.into(),
            location,
        }
    }

    /// The source location carried by a `Malformed*` error.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::MalformedRobotDescription { location, .. }
            | Self::MalformedSemanticDescription { location, .. } => *location,
            Self::Retrieval(_) => None,
        }
    }
}

/// Result type for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Failures of the resource-retrieval layer.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The string is not of the form `scheme://...`.
    #[error("invalid resource locator: {0}")]
    InvalidLocator(String),

    /// The scheme is not handled by this retriever.
    #[error("unsupported scheme '{scheme}' in {locator}")]
    UnsupportedScheme { scheme: String, locator: String },

    /// A `package://` locator names a package that is not on the search path.
    #[error("unknown package '{package}' in {locator}")]
    UnknownPackage { package: String, locator: String },

    /// The resolved file does not exist.
    #[error("resource not found: {locator}")]
    NotFound { locator: String },

    /// Reading the resolved file failed.
    #[error("cannot read {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    /// Fetching a remote resource failed.
    #[error("cannot fetch {locator}: {message}")]
    Network { locator: String, message: String },
}

/// A rejected registration on a [`KinematicModel`](crate::KinematicModel).
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RegistrationError {
    #[error("unknown body '{0}'")]
    UnknownBody(BodyName),

    #[error("unknown joint '{0}'")]
    UnknownJoint(String),

    #[error("registration rejected: {0}")]
    Rejected(String),
}

/// Recoverable problems found during a parse.
///
/// A successful parse may carry any number of these.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A disabled-collision declaration names a body the model does not have.
    #[error("disabled pair '{first}' / '{second}' references unknown body '{body}'")]
    UnknownBodyReference {
        body: BodyName,
        first: BodyName,
        second: BodyName,
    },

    /// A disabled-collision declaration names the same body twice.
    #[error("disabled pair declares body '{body}' against itself")]
    SelfPairDeclaration { body: BodyName },

    /// The model refused one collision pair.
    #[error("cannot register collision pair {pair}: {source}")]
    RegistrationFailure {
        pair: CollisionPair,
        #[source]
        source: RegistrationError,
    },

    /// A named configuration sets a joint the robot does not have.
    #[error("configuration '{configuration}' references unknown joint '{joint}'")]
    UnknownJointReference { configuration: String, joint: String },

    /// A named configuration appears more than once; the first one is kept.
    #[error("configuration '{0}' is declared more than once")]
    DuplicateConfiguration(String),

    /// The model refused a named configuration.
    #[error("cannot register configuration '{configuration}': {source}")]
    ConfigurationRegistrationFailure {
        configuration: String,
        #[source]
        source: RegistrationError,
    },

    /// The two descriptions disagree on the robot name.
    #[error("semantic description targets robot '{semantic}' but robot description is '{robot}'")]
    RobotNameMismatch { robot: String, semantic: String },
}
