//! Error taxonomy shared by every stage of an invocation.

use std::borrow::Cow;

/// Result type alias for chunk-dispatch operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad configuration or input, e.g. a non-positive chunk size.
    #[error("invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),

    /// The source document could not be fetched or parsed.
    #[error("failed to read document {document}")]
    DocumentRead {
        document: String,
        #[source]
        source: anyhow::Error,
    },

    /// Submission of one chunk to the analysis service failed.
    #[error("dispatch failed for pages [{start_page}, {end_page})")]
    Dispatch {
        start_page: u32,
        end_page: u32,
        #[source]
        source: anyhow::Error,
    },

    /// The job was submitted, but its correlation record never reached the
    /// outbound queue. The job is orphaned and needs external reconciliation.
    #[error(
        "job {job_id} for pages [{start_page}, {end_page}) was submitted but its correlation record was not published"
    )]
    CorrelationPublish {
        job_id: String,
        start_page: u32,
        end_page: u32,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn document_read(document: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::DocumentRead {
            document: document.into(),
            source: source.into(),
        }
    }

    /// Short machine-friendly name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "invalid_argument",
            Error::DocumentRead { .. } => "document_read",
            Error::Dispatch { .. } => "dispatch",
            Error::CorrelationPublish { .. } => "correlation_publish",
        }
    }
}
