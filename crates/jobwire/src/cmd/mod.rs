use clap::{Args, Subcommand, ValueEnum};
use jobwire_worker::JobType;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a dispatcher, register, and serve availability requests.
    Run(RunArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum JobTypeArg {
    Room,
    Publisher,
}

impl From<JobTypeArg> for JobType {
    fn from(arg: JobTypeArg) -> Self {
        match arg {
            JobTypeArg::Room => JobType::Room,
            JobTypeArg::Publisher => JobType::Publisher,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Dispatcher URL (ws:// or wss://).
    #[arg(env = "JOBWIRE_URL")]
    pub url: String,
    /// Bearer token presented to the dispatcher.
    #[arg(long, env = "JOBWIRE_TOKEN", hide_env_values = true)]
    pub token: String,
    /// Job type to register for.
    #[arg(long, value_enum, default_value = "room")]
    pub job_type: JobTypeArg,
    /// Worker name reported at registration.
    #[arg(long, default_value = "jobwire")]
    pub name: String,
    /// Worker version reported at registration.
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    pub worker_version: String,
    /// Fixed worker id (generated when omitted).
    #[arg(long)]
    pub worker_id: Option<String>,
    /// Stop after this long (e.g. 30s, 500ms, 5m). Runs until Ctrl-C when omitted.
    #[arg(long)]
    pub duration: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
