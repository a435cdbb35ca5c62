use std::fmt;

use crate::error::{Result, WorkerError};
use crate::identity::{JobType, WorkerIdentity};

const MAX_TOKEN_LEN: usize = 4096;

/// Everything needed to open a worker session.
#[derive(Clone)]
pub struct WorkerConfig {
    /// Dispatcher address, e.g. `ws://localhost:7880/agent`.
    pub target: String,
    /// Bearer credential presented on connect.
    /// Opaque credential material; redacted in debug output.
    pub token: String,
    /// Job type to register for.
    pub job_type: JobType,
    /// Worker software version reported at registration.
    pub version: String,
    /// Human-readable worker name reported at registration.
    pub name: String,
    /// Fixed worker id. Generated when `None`.
    pub worker_id: Option<String>,
}

impl WorkerConfig {
    pub fn new(target: impl Into<String>, token: impl Into<String>, job_type: JobType) -> Self {
        Self {
            target: target.into(),
            token: token.into(),
            job_type,
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: "jobwire".to_string(),
            worker_id: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }

    /// Build the identity this configuration describes.
    pub fn identity(&self) -> Result<WorkerIdentity> {
        match &self.worker_id {
            Some(id) => {
                WorkerIdentity::with_worker_id(self.job_type, id, &self.version, &self.name)
            }
            None => WorkerIdentity::generate(self.job_type, &self.version, &self.name),
        }
    }

    pub(crate) fn validate_token(&self) -> Result<()> {
        if self.token.is_empty() || self.token.len() > MAX_TOKEN_LEN {
            return Err(WorkerError::Config(format!(
                "invalid token length: {}",
                self.token.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("target", &self.target)
            .field(
                "token",
                &format_args!("<redacted:{} bytes>", self.token.len()),
            )
            .field("job_type", &self.job_type)
            .field("version", &self.version)
            .field("name", &self.name)
            .field("worker_id", &self.worker_id)
            .finish()
    }
}
