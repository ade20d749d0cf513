use anyhow::Result;
use clap::Parser;
use recap::{
    app,
    cli::{
        handle_list_command, handle_show_command, handle_upload_command, handle_watch_command,
        Cli, CliCommand,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("recap {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(CliCommand::Upload(args)) => handle_upload_command(args).await,
        Some(CliCommand::Watch(args)) => handle_watch_command(args).await,
        Some(CliCommand::List(args)) => handle_list_command(args).await,
        Some(CliCommand::Show(args)) => handle_show_command(args).await,
        Some(CliCommand::Serve) | None => app::run_service().await,
    }
}
