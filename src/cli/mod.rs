pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "kehilla")]
#[command(about = "Kehilla CLI - bulk import, export and yahrzeit schedules against the donor database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Validate, simulate or commit a donor/donation/pledge spreadsheet")]
    Import {
        #[command(subcommand)]
        cmd: commands::import::ImportCommands,
    },

    #[command(about = "Export an entity listing as CSV")]
    Export(commands::export::ExportArgs),

    #[command(about = "Upcoming yahrzeits and due reminders")]
    Yahrzeit {
        #[command(subcommand)]
        cmd: commands::yahrzeit::YahrzeitCommands,
    },

    #[command(about = "Convert a civil date to the Hebrew calendar")]
    Hebrew(commands::hebrew::HebrewArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Import { cmd } => commands::import::handle(cmd, output_format).await,
        Commands::Export(args) => commands::export::handle(args, output_format).await,
        Commands::Yahrzeit { cmd } => commands::yahrzeit::handle(cmd, output_format).await,
        Commands::Hebrew(args) => commands::hebrew::handle(args, output_format),
    }
}
