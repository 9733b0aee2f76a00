mod args;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use informe_core::report::REPORT_FILENAME;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use args::{GeneratorArgs, PrepareArgs, PromptArgs, SourceArgs};

#[derive(Parser)]
#[command(
    name = "informe",
    version,
    about = "Turn spreadsheets, documents and web pages into generated analysis reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a file or web page into a table and show the display subset
    Ingest {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        prepare: PrepareArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the display subset to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Show the type and value range of every column
    Profile {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Split the rows into quartiles of a numeric column
    Segment {
        #[command(flatten)]
        source: SourceArgs,

        /// Numeric column to segment by
        #[arg(short = 'c', long = "column", value_name = "NAME")]
        column: String,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Print the prompt that would be sent to the generator
    Prompt {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        prepare: PrepareArgs,

        #[command(flatten)]
        prompt: PromptArgs,
    },
    /// Generate an analysis report
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        prepare: PrepareArgs,

        #[command(flatten)]
        prompt: PromptArgs,

        #[command(flatten)]
        generator: GeneratorArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Save the report as a Word document
        #[arg(
            short = 'O',
            long = "out",
            value_name = "FILE",
            num_args = 0..=1,
            default_missing_value = REPORT_FILENAME
        )]
        out: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest {
            source,
            prepare,
            output,
            out,
        } => commands::ingest::run(&source, &prepare, &output, out),
        Commands::Profile { source, output } => commands::profile::run(&source, &output),
        Commands::Segment {
            source,
            column,
            output,
        } => commands::segment::run(&source, &column, &output),
        Commands::Prompt {
            source,
            prepare,
            prompt,
        } => commands::prompt::run(&source, &prepare, &prompt),
        Commands::Report {
            source,
            prepare,
            prompt,
            generator,
            output,
            out,
        } => commands::report::run(&source, &prepare, &prompt, &generator, &output, out),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
