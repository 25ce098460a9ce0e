use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use idse_governance::cli::commands::{
    command_for, show_quick_start, Command, CommandContext, CommandStatus,
};
use idse_governance::cli::Cli;
use idse_governance::config::GovernanceConfig;
use idse_governance::telemetry::{create_command_span, generate_correlation_id, init_telemetry};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version arrive here too and are not failures
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(status) => status.exit_code(),
        Err(e) => {
            eprintln!("❌ Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<CommandStatus> {
    GovernanceConfig::load_env_file(&cli.root)?;
    let config = GovernanceConfig::load(&cli.root)?;
    init_telemetry(&config.observability)?;

    let Some(command) = cli.command else {
        show_quick_start();
        return Ok(CommandStatus::Success);
    };

    let correlation_id = generate_correlation_id();
    let span = create_command_span(command.name(), command.actor(), &correlation_id);
    let _entered = span.enter();

    let ctx = CommandContext::new(cli.root, config);
    command_for(command).execute(&ctx)
}
