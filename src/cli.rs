use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quizbot_core::PromptMode;

#[derive(Debug, Parser)]
#[command(
    name = "quizbot",
    version,
    about = "Generate quiz questions from text, .txt or .pdf documents"
)]
pub struct Cli {
    /// Configuration file (falls back to $QUIZBOT_CONFIG, then config/default.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Generate questions once and print them
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Source text to generate questions from
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub text: Option<String>,

    /// A .txt or .pdf document to generate questions from
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Number of questions in templated mode
    #[arg(long)]
    pub count: Option<usize>,

    /// combined or templated
    #[arg(long)]
    pub mode: Option<PromptMode>,
}
