use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recap")]
#[command(about = "Meeting transcription and summarization pipeline", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the recap service (default when no command is given)
    Serve,
    /// Upload a meeting recording and create a meeting
    Upload(UploadCliArgs),
    /// Poll a meeting and drive it through the pipeline
    Watch(WatchCliArgs),
    /// List meetings
    List(ListCliArgs),
    /// Show a meeting with its transcript, summary, and action items
    Show(ShowCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct UploadCliArgs {
    /// Audio file to upload
    pub file: PathBuf,
    /// Meeting title (defaults to the file name)
    #[arg(short, long)]
    pub title: Option<String>,
    /// Watch the meeting through the pipeline after uploading
    #[arg(short, long)]
    pub watch: bool,
    /// Override the service base URL
    #[arg(long)]
    pub server: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct WatchCliArgs {
    /// Meeting ID to watch
    pub id: i64,
    /// Override the service base URL
    #[arg(long)]
    pub server: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ListCliArgs {
    /// Maximum number of meetings to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
    /// Override the service base URL
    #[arg(long)]
    pub server: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ShowCliArgs {
    /// Meeting ID to show
    pub id: i64,
    /// Override the service base URL
    #[arg(long)]
    pub server: Option<String>,
}
