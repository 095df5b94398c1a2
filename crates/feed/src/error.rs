// ABOUTME: Error types for feed and catalog parsing operations.
// ABOUTME: Separates fatal stream-level errors from recoverable per-element failures.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing a feed or catalog document.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The underlying XML stream is malformed. Aborts the whole parse.
    #[error("malformed xml: {0}")]
    Xml(String),

    /// An element is missing data a mapper requires (href, name, term, ...).
    /// Recoverable: dispatch loops drop the element and keep scanning.
    #[error("element <{element}> is missing {what}")]
    MissingData { element: String, what: &'static str },

    /// Element nesting exceeded the defensive limit.
    /// Recoverable: the offending subtree is dropped.
    #[error("nesting too deep inside <{0}>")]
    TooDeep(String),
}

impl FeedError {
    /// Creates an Xml error from an underlying quick-xml error.
    pub fn xml(err: impl fmt::Display) -> Self {
        FeedError::Xml(err.to_string())
    }

    /// Creates a MissingData error for the named element.
    pub fn missing(element: impl Into<String>, what: &'static str) -> Self {
        FeedError::MissingData {
            element: element.into(),
            what,
        }
    }

    /// Creates a TooDeep error for the named element.
    pub fn too_deep(element: impl Into<String>) -> Self {
        FeedError::TooDeep(element.into())
    }

    /// True for errors that must abort the whole parse rather than skip one element.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FeedError::Xml(_))
    }
}
