//! CLI tool for patching persistence.xml properties in deployment artifacts.

mod commands;
mod exit_codes;
mod output;
mod progress;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Rewrites persistence.xml properties inside jar, war and ear archives
#[derive(Parser)]
#[command(name = "persistence-patcher")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output and informational logging
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a classified copy of the project artifact with patched descriptors
    Release {
        /// The project artifact
        #[arg(long)]
        artifact: PathBuf,

        /// Packaging of the artifact (jar, war or ear)
        #[arg(long)]
        packaging: String,

        /// Build output directory
        #[arg(long, default_value = "target")]
        build_dir: PathBuf,

        /// Base name of the build outputs
        #[arg(long)]
        final_name: String,

        /// Classifier of the patched artifact
        #[arg(long, short = 'c')]
        classifier: String,

        /// Property file with the overrides
        #[arg(long, short = 'p', env = "PERSISTENCE_PROPERTIES")]
        properties: PathBuf,

        /// Keep the unpacked output next to the artifact
        #[arg(long)]
        keep_exploded: bool,
    },

    /// Write a patched copy of one dependency into <build-dir>/persistence-update
    Update {
        /// The dependency to patch, as <groupId>:<artifactId>
        #[arg(long)]
        update_artifact: String,

        /// Resolved dependencies, as <groupId>:<artifactId>:<version>:<type>=<path>
        #[arg(long = "dependency", short = 'd', required = true)]
        dependencies: Vec<String>,

        /// Build output directory
        #[arg(long, default_value = "target")]
        build_dir: PathBuf,

        /// Property file with the overrides
        #[arg(long, short = 'p', env = "PERSISTENCE_PROPERTIES")]
        properties: PathBuf,

        /// Output file name (defaults to <artifactId>-<version>.<type>)
        #[arg(long)]
        filename: Option<String>,

        /// Rename a previous output to <name>-backup instead of deleting it
        #[arg(long)]
        keep_backup: bool,

        /// Keep the unpacked output next to the artifact
        #[arg(long)]
        keep_exploded: bool,
    },

    /// Print the schema version declared by a persistence.xml
    Detect {
        /// Descriptor file
        descriptor: PathBuf,
    },

    /// List the descriptors inside a jar, war or ear
    Scan {
        /// Archive to inspect
        archive: PathBuf,

        /// Packaging (defaults to the file extension)
        #[arg(long)]
        packaging: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Warn,
        (false, 0) => log::LevelFilter::Info,
        (false, 1) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("PERSISTENCE_LOG")
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let exit_code = match cli.command {
        Commands::Release {
            artifact,
            packaging,
            build_dir,
            final_name,
            classifier,
            properties,
            keep_exploded,
        } => commands::release(&commands::ReleaseConfig {
            artifact: &artifact,
            packaging: &packaging,
            build_dir: &build_dir,
            final_name: &final_name,
            classifier: &classifier,
            properties: &properties,
            keep_exploded,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::Update {
            update_artifact,
            dependencies,
            build_dir,
            properties,
            filename,
            keep_backup,
            keep_exploded,
        } => commands::update(&commands::UpdateConfig {
            coordinate: &update_artifact,
            dependencies: &dependencies,
            build_dir: &build_dir,
            properties: &properties,
            file_name: filename,
            keep_backup,
            keep_exploded,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::Detect { descriptor } => commands::detect(&descriptor, cli.format),

        Commands::Scan { archive, packaging } => {
            commands::scan(&archive, packaging.as_deref(), cli.format)
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
