use std::time::Duration;

use jobwire_worker::{connect_with_config, JobType, SessionEnd, WorkerConfig};
use tracing::{info, warn};

use crate::cmd::RunArgs;
use crate::exit::{worker_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_summary, OutputFormat, SessionSummary};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = args.duration.as_deref().map(parse_duration).transpose()?;

    let job_type = JobType::from(args.job_type);
    let mut config = WorkerConfig::new(&args.url, &args.token, job_type)
        .with_name(&args.name)
        .with_version(&args.worker_version);
    if let Some(worker_id) = &args.worker_id {
        config = config.with_worker_id(worker_id);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("failed to start runtime: {err}")))?;

    runtime.block_on(serve(config, duration, format))
}

async fn serve(
    config: WorkerConfig,
    duration: Option<Duration>,
    format: OutputFormat,
) -> CliResult<i32> {
    let client = connect_with_config(&config)
        .await
        .map_err(|err| worker_error("connect failed", err))?;

    if let Err(err) = client.register().await {
        client.close().await;
        return Err(worker_error("register failed", err));
    }

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };

    let stopped_by = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received");
            "interrupt".to_string()
        }
        _ = deadline => "duration".to_string(),
        end = client.session_ended() => {
            warn!(reason = ?end, "session ended");
            session_end_label(end).to_string()
        }
    };

    client.close().await;

    let summary = SessionSummary {
        worker_id: client.identity().worker_id().to_string(),
        job_type: client.identity().job_type().to_string(),
        target: client.target().to_string(),
        phase: client.phase().to_string(),
        stopped_by,
        state: client.state().snapshot(),
    };
    print_summary(&summary, format);

    match client.session_end() {
        Some(SessionEnd::ReadFailed | SessionEnd::DecodeFailed) => Ok(FAILURE),
        _ => Ok(SUCCESS),
    }
}

fn session_end_label(end: SessionEnd) -> &'static str {
    match end {
        SessionEnd::Shutdown => "shutdown",
        SessionEnd::ClosedByPeer => "peer_closed",
        SessionEnd::ReadFailed => "read_failed",
        SessionEnd::DecodeFailed => "decode_failed",
    }
}

/// Parse `500ms`, `30s`, `5m`, or a bare number of seconds.
pub fn parse_duration(raw: &str) -> CliResult<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => raw.split_at(idx),
        None => (raw, "s"),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {raw:?}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        _ => Err(CliError::new(
            USAGE,
            format!("invalid duration unit in {raw:?} (expected ms, s, or m)"),
        )),
    }
}
