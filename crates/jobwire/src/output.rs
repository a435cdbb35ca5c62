use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use jobwire_worker::WorkerStateSnapshot;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Final report for one worker session.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub worker_id: String,
    pub job_type: String,
    pub target: String,
    pub phase: String,
    pub stopped_by: String,
    pub state: WorkerStateSnapshot,
}

pub fn print_summary(summary: &SessionSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let state = &summary.state;
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["worker_id", summary.worker_id.as_str()])
                .add_row(vec!["job_type", summary.job_type.as_str()])
                .add_row(vec!["target", summary.target.as_str()])
                .add_row(vec!["phase", summary.phase.as_str()])
                .add_row(vec!["stopped_by", summary.stopped_by.as_str()]);
            for (name, value) in counter_rows(state) {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let counters = counter_rows(&summary.state)
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!(
                "worker={} type={} target={} phase={} stopped_by={} {}",
                summary.worker_id,
                summary.job_type,
                summary.target,
                summary.phase,
                summary.stopped_by,
                counters
            );
        }
    }
}

fn counter_rows(state: &WorkerStateSnapshot) -> [(&'static str, u64); 5] {
    [
        ("registered", state.registered),
        ("room_availability", state.room_availability_count),
        ("room_jobs", state.room_job_count),
        ("participant_availability", state.participant_availability_count),
        ("participant_jobs", state.participant_job_count),
    ]
}
