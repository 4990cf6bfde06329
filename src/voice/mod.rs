//! Voice Module
//!
//! Call-control documents (TwiML), webhook signature validation and the
//! REST account client used to place and tear down calls.

pub mod account;
pub mod signature;
pub mod twiml;

pub use account::*;
pub use signature::*;
pub use twiml::*;

use thiserror::Error;

/// Errors raised while building a call-control document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TwimlError {
    #[error("Invalid {attribute} parameter '{value}', must be one of: {allowed}")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("{0} is not nestable")]
    NotNestable(&'static str),

    #[error("{child} is not nestable inside {parent}")]
    NestingViolation {
        child: &'static str,
        parent: &'static str,
    },
}

/// Errors raised by the request validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Malformed request input: {0}")]
    MalformedInput(String),
}

/// Errors raised by the REST account client
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Invalid path parameter: {0:?}")]
    InvalidPath(String),

    #[error("HTTP {0} method not implemented")]
    UnsupportedMethod(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Result type for document construction
pub type Result<T> = std::result::Result<T, TwimlError>;
