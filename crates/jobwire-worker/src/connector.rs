use jobwire_transport::{Target, TransportError};
use tracing::debug;

use crate::client::WorkerClient;
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::identity::JobType;

/// Connect to a dispatcher with a generated identity for `job_type`.
pub async fn connect(target: &str, token: &str, job_type: JobType) -> Result<WorkerClient> {
    connect_with_config(&WorkerConfig::new(target, token, job_type)).await
}

/// Connect with explicit configuration.
///
/// The target, credential, and identity are validated before any network
/// activity; problems there are [`WorkerError::Config`]. Failing to open the
/// transport is [`WorkerError::Connection`]. The returned client is
/// `Connected` with its receive loop running, but not yet registered.
pub async fn connect_with_config(config: &WorkerConfig) -> Result<WorkerClient> {
    let target = Target::parse(&config.target).map_err(|err| WorkerError::Config(err.to_string()))?;
    config.validate_token()?;
    let identity = config.identity()?;

    debug!(?config, worker_id = identity.worker_id(), "connecting worker");
    let (sink, source) = jobwire_transport::connect(&target, &config.token)
        .await
        .map_err(|err| match err {
            TransportError::InvalidTarget { .. } | TransportError::InvalidCredential(_) => {
                WorkerError::Config(err.to_string())
            }
            other => WorkerError::Connection(other),
        })?;

    Ok(WorkerClient::start(identity, target, sink, source))
}
