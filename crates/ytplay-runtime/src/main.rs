//! ytplay: terminal client for the ytplay playback daemon.

use clap::Parser;

use ytplay_core::command::ControlCommand;

mod cli;
mod cmd_control;
mod cmd_tables;
mod cmd_watch;
mod render;

use cli::Command;
use cmd_control::Action;

fn init_logging(default: &str) {
    let filter = std::env::var("YTPLAY_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let config = args.client_config();

    let command = args
        .command
        .unwrap_or_else(|| Command::Watch(cli::WatchOpts::default()));

    let watching = matches!(command, Command::Watch(_));
    init_logging(if watching { "info" } else { "warn" });

    let exit_code = match command {
        Command::Watch(opts) => {
            cmd_watch::cmd_watch(config, !opts.no_progress).await?;
            0
        }
        Command::State => cmd_control::cmd_state(config).await?,
        Command::Tables => cmd_tables::cmd_tables(config).await?,
        Command::Rows(opts) => cmd_tables::cmd_rows(config, &opts).await?,
        Command::Next => control(config, ControlCommand::Next).await?,
        Command::Prev => control(config, ControlCommand::Prev).await?,
        Command::Pause => control(config, ControlCommand::Pause).await?,
        Command::Stop => control(config, ControlCommand::Stop).await?,
        Command::PlayIndex { index } => control(config, ControlCommand::PlayIndex(index)).await?,
        Command::Seek(opts) => {
            let Some(target) = opts.target() else {
                anyhow::bail!("seek needs --pos or --delta");
            };
            control(config, ControlCommand::Seek(target)).await?
        }
        Command::Vote { direction } => cmd_control::cmd_action(config, Action::Vote(direction)).await?,
        Command::Play(opts) => cmd_control::cmd_action(config, Action::Play(opts)).await?,
        Command::Learn(opts) => cmd_control::cmd_action(config, Action::Learn(opts)).await?,
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

async fn control(config: ytplay_sync::ClientConfig, command: ControlCommand) -> anyhow::Result<i32> {
    cmd_control::cmd_action(config, Action::Control(command)).await
}
