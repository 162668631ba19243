use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Standard response envelope for machine-readable outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

impl<T> Envelope<T> {
    pub fn success(meta: EnvelopeMeta, data: T) -> Self {
        Self {
            meta,
            data,
            errors: Vec::new(),
        }
    }

    pub fn failure(meta: EnvelopeMeta, data: T, error: EnvelopeError) -> Self {
        Self {
            meta,
            data,
            errors: vec![error],
        }
    }
}

/// Metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    pub generated_at: String,
    pub latency_ms: u64,
}

impl EnvelopeMeta {
    pub fn new(
        request_id: impl Into<String>,
        generated_at: impl Into<String>,
        latency_ms: u64,
    ) -> Result<Self, ValidationError> {
        let request_id = request_id.into();
        if request_id.trim().len() < 8 {
            return Err(ValidationError::InvalidRequestId);
        }

        Ok(Self {
            request_id,
            generated_at: generated_at.into(),
            latency_ms,
        })
    }
}

/// Structured error payload for failed responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl EnvelopeError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let error = Self {
            code: code.into(),
            message: message.into(),
            status: None,
        };

        if error.code.trim().is_empty() {
            return Err(ValidationError::EmptyErrorCode);
        }
        if error.message.trim().is_empty() {
            return Err(ValidationError::EmptyErrorMessage);
        }

        Ok(error)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}
