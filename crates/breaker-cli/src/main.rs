use clap::{Parser, Subcommand};

use breaker_cli::{commands, ExitCode};

/// Fails CI builds when collected issues reach a severity threshold.
#[derive(Parser)]
#[command(name = "breaker", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gate collected issues and break the build if the threshold is reached.
    Check(commands::check::CheckArgs),
    /// Show or validate breaker settings.
    Config(commands::config::ConfigArgs),
}

impl Commands {
    fn execute(self) -> anyhow::Result<ExitCode> {
        match self {
            Self::Check(args) => commands::check::execute(args),
            Self::Config(args) => commands::config::execute(args),
        }
    }
}

/// Prints the error and its causes, one per line.
fn report_error(err: &anyhow::Error) {
    eprintln!("breaker: error: {err}");
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Anything a subcommand did not map to an exit code is an engine error.
    let code = cli.command.execute().unwrap_or_else(|err| {
        report_error(&err);
        ExitCode::EngineError
    });

    breaker_cli::terminate(code)
}
