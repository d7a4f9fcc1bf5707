// src/error.rs

//! Unified error handling for the result pipeline.

use std::fmt;

use thiserror::Error;

use crate::models::Platform;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Athlete identifier rejected before any network activity
    #[error("Validation error: {0}")]
    Validation(String),

    /// A time or date string that does not match any accepted format
    #[error("Format error for '{input}': {message}")]
    Format { input: String, message: String },

    /// Network/HTTP failure that survived the retry budget
    #[error("Fetch error for {url}: {message}")]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Upstream page structure was not what the parser expected
    #[error("Parse error ({platform}): {message}")]
    Parse { platform: Platform, message: String },

    /// No age-grading table entry for the requested distance/gender
    #[error("No age grading entry for {context}")]
    Lookup { context: String },

    /// Forced refresh requested before the cooldown elapsed
    #[error("Refresh cooldown active: {remaining_mins} minutes remaining")]
    Cooldown { remaining_mins: i64 },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a format error for a rejected input string.
    pub fn format(input: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Format {
            input: input.into(),
            message: message.to_string(),
        }
    }

    /// Create a fetch error with optional HTTP status.
    pub fn fetch(url: impl Into<String>, status: Option<u16>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            status,
            message: message.to_string(),
        }
    }

    /// Create a parse error naming the platform whose page broke.
    pub fn parse(platform: Platform, message: impl Into<String>) -> Self {
        Self::Parse {
            platform,
            message: message.into(),
        }
    }

    /// Create a lookup error for a missing grading table entry.
    pub fn lookup(context: impl Into<String>) -> Self {
        Self::Lookup {
            context: context.into(),
        }
    }

    /// True for failures the orchestrator may paper over with stale data.
    pub fn is_fetch_or_parse(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Parse { .. } | Self::Http(_))
    }
}
