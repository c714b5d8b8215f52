//! Error taxonomy for the tracking engine
//!
//! Per-item errors (one listing, one route, one notification) are contained by
//! the caller that produced them. Only `ConfigurationInvalid` stops the process.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// A raw listing did not have the positional layout the parser expects
    #[error("Malformed fare record: {fields} fields, at least {required} required")]
    MalformedRecord { fields: usize, required: usize },

    /// `update_cycle` was handed no fares
    #[error("Empty fare batch")]
    EmptyBatch,

    #[error("Provider unavailable for {origin}->{destination} on {date}: {reason}")]
    ProviderUnavailable { origin: String, destination: String, date: String, reason: String },

    #[error("Persistence failure at {path}: {reason}")]
    Persistence { path: String, reason: String },

    #[error("Notification failed for {date}: {reason}")]
    Notification { date: String, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

impl TrackerError {
    pub fn provider(origin: &str, destination: &str, date: &str, reason: impl ToString) -> Self {
        Self::ProviderUnavailable {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: date.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(path: impl ToString, reason: impl ToString) -> Self {
        Self::Persistence { path: path.to_string(), reason: reason.to_string() }
    }

    pub fn notification(date: &str, reason: impl ToString) -> Self {
        Self::Notification { date: date.to_string(), reason: reason.to_string() }
    }

    /// Short label for structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::MalformedRecord { .. } => "malformed_record",
            TrackerError::EmptyBatch => "empty_batch",
            TrackerError::ProviderUnavailable { .. } => "provider_unavailable",
            TrackerError::Persistence { .. } => "persistence_failure",
            TrackerError::Notification { .. } => "notification_failure",
            TrackerError::ConfigurationInvalid(_) => "configuration_invalid",
        }
    }
}
