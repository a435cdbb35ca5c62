mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "jobwire", version, about = "Job-dispatch worker CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). JOBWIRE_LOG takes precedence when set.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::JobTypeArg;

    #[test]
    fn parses_run_subcommand() {
        let cli = Cli::try_parse_from([
            "jobwire",
            "run",
            "ws://localhost:7880/agent",
            "--token",
            "abc",
            "--job-type",
            "publisher",
            "--duration",
            "2s",
        ])
        .expect("run args should parse");

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.url, "ws://localhost:7880/agent");
                assert!(matches!(args.job_type, JobTypeArg::Publisher));
                assert_eq!(args.duration.as_deref(), Some("2s"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_requires_token() {
        // Guard against a token leaking in from the test environment.
        if std::env::var_os("JOBWIRE_TOKEN").is_some() {
            return;
        }
        let err = Cli::try_parse_from(["jobwire", "run", "ws://localhost:7880/agent"])
            .expect_err("missing token should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_unknown_job_type() {
        let err = Cli::try_parse_from([
            "jobwire",
            "run",
            "ws://localhost:7880/agent",
            "--token",
            "abc",
            "--job-type",
            "participant",
        ])
        .expect_err("unknown job type should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parses_version_subcommand() {
        let cli = Cli::try_parse_from(["jobwire", "version", "--extended"])
            .expect("version args should parse");
        assert!(matches!(cli.command, Command::Version(_)));
    }
}
