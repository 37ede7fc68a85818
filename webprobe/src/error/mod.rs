//! Error types and error handling
//!
//! Every failure is reported synchronously at the call site with what was
//! searched for and what was found instead. Nothing is retried.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, WebProbeError>;

/// Framework error type
#[derive(Debug, Error)]
pub enum WebProbeError {
    // ---------------------------------------------------------------------
    // Form parsing
    // ---------------------------------------------------------------------
    /// The form text has no `<form>` start tag
    #[error("No <form> tag found")]
    NoFormTag,

    /// The form text has no `</form>` end tag
    #[error("No </form> tag found")]
    NoFormCloseTag,

    /// Malformed control markup (nested selects, stray closing tags, ...)
    #[error("Parse error: {0}")]
    Parse(String),

    // ---------------------------------------------------------------------
    // Lookup and ambiguity
    // ---------------------------------------------------------------------
    /// `response.form()` was used on a page without forms
    #[error("You used response.form(), but no forms exist")]
    NoForms,

    /// `response.form()` was used on a page with several forms
    #[error("You used response.form(), but {0} forms exist")]
    MultipleForms(usize),

    /// No form at the given position or with the given id
    #[error("No form found for {0} (forms: {1})")]
    FormNotFound(String, String),

    /// No field by that name
    #[error("No field by the name {name:?} found (fields: {available})")]
    FieldNotFound {
        /// Requested field name
        name: String,
        /// Comma separated names that do exist
        available: String,
    },

    /// Several fields share the name and no index was given
    #[error("Multiple fields match {name:?}: {matches}")]
    AmbiguousField {
        /// Requested field name
        name: String,
        /// Description of every matching field
        matches: String,
    },

    /// `select()` was used on something other than a single-value select
    #[error("Field {0:?} is not a <select>")]
    NotASelect(String),

    /// An index past the end of the candidates
    #[error("Only {matched} (out of {total}) elements match; index {index} out of range")]
    IndexOutOfRange {
        /// Number of matching candidates
        matched: usize,
        /// Number of candidates considered before filtering
        total: usize,
        /// Requested index
        index: usize,
    },

    // ---------------------------------------------------------------------
    // Field state
    // ---------------------------------------------------------------------
    /// The value is not one of the declared options
    #[error("Option(s) {value} not found (from {options})")]
    OptionNotFound {
        /// Value(s) that failed to match
        value: String,
        /// Declared options
        options: String,
    },

    /// Submit, button and image controls cannot be assigned
    #[error("You cannot set the value of the <{tag}> field {name:?}")]
    ImmutableField {
        /// Tag of the control
        tag: String,
        /// Name of the control
        name: String,
    },

    /// A value of the wrong shape for the field or encoder
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// What the field or encoder accepts
        expected: String,
        /// What it was given
        actual: String,
    },

    /// Accessibility check failed
    #[error("Lint error: {0}")]
    Lint(String),

    // ---------------------------------------------------------------------
    // Link and button lookup
    // ---------------------------------------------------------------------
    /// A match pattern could not be compiled
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// No element passed every filter
    #[error("No matching elements found (from {total} possible)")]
    NoMatchingElement {
        /// Number of navigable candidates on the page
        total: usize,
    },

    /// Several elements passed every filter and no index was given
    #[error("Multiple links match: {}", .matches.join(", "))]
    AmbiguousMatch {
        /// HTML of every matching element
        matches: Vec<String>,
    },

    // ---------------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------------
    /// The response status was not the expected one
    #[error("Bad response: {0}")]
    App(String),

    /// `mustcontain` found a missing or forbidden string
    #[error("{0}")]
    Content(String),

    /// The application did not produce a response
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// `goto()` only supports GET and POST
    #[error("Only \"get\" or \"post\" are allowed for method (you gave {0:?})")]
    InvalidMethod(String),

    /// `follow()` on a response that is not a redirect
    #[error("You can only follow redirect responses (not {0})")]
    NotRedirect(u16),

    /// A header the operation needs is absent
    #[error("Missing {0} header")]
    MissingHeader(&'static str),

    /// The form was parsed from bare text and has nowhere to submit to
    #[error("Form is not attached to a response")]
    Detached,

    /// Request construction error
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    /// URL resolution error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading an upload from disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for WebProbeError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
