use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkerError};

const WORKER_ID_PREFIX: &str = "W_";
const WORKER_ID_RANDOM_LEN: usize = 12;
const MAX_WORKER_ID_LEN: usize = 128;
const MAX_VERSION_LEN: usize = 128;
const MAX_NAME_LEN: usize = 128;

/// Classification of dispatchable work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    /// Room-scoped jobs.
    #[serde(rename = "JT_ROOM")]
    Room,
    /// Publisher (participant) scoped jobs.
    #[serde(rename = "JT_PUBLISHER")]
    Publisher,
}

impl JobType {
    /// Wire name of this job type.
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Room => "JT_ROOM",
            JobType::Publisher => "JT_PUBLISHER",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "room" | "jt_room" => Ok(JobType::Room),
            "publisher" | "jt_publisher" => Ok(JobType::Publisher),
            other => Err(WorkerError::Config(format!(
                "unknown job type '{other}' (expected room or publisher)"
            ))),
        }
    }
}

/// Who this worker is. Fixed for the lifetime of a client.
///
/// Serializes to the body of a `REGISTER` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerIdentity {
    #[serde(rename = "type")]
    job_type: JobType,
    worker_id: String,
    version: String,
    name: String,
}

impl WorkerIdentity {
    /// Create an identity with a freshly generated worker id.
    pub fn generate(
        job_type: JobType,
        version: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        Self::with_worker_id(job_type, generate_worker_id(), version, name)
    }

    /// Create an identity with an explicit worker id.
    pub fn with_worker_id(
        job_type: JobType,
        worker_id: impl Into<String>,
        version: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let identity = Self {
            job_type,
            worker_id: worker_id.into(),
            version: version.into(),
            name: name.into(),
        };
        identity.validate()?;
        Ok(identity)
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        validate_field("worker_id", &self.worker_id, MAX_WORKER_ID_LEN)?;
        validate_field("version", &self.version, MAX_VERSION_LEN)?;
        validate_field("name", &self.name, MAX_NAME_LEN)
    }
}

/// `W_` followed by 12 hex characters of a random v4 UUID.
pub fn generate_worker_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{WORKER_ID_PREFIX}{}", &uuid[..WORKER_ID_RANDOM_LEN])
}

fn validate_field(field: &str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() || value.len() > max {
        return Err(WorkerError::Config(format!(
            "invalid {field} length: {} (must be 1..={max})",
            value.len()
        )));
    }
    Ok(())
}
