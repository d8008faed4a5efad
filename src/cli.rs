use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use strata::config::{AppSettings, get_settings_path, load_settings};
use strata::io::{load_csv, write_partitions};
use strata::pipeline::{DatasetProfile, Pipeline};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Prepare tabular datasets into stratified train/tune/test partitions"
)]
pub struct Cli {
    /// Path to a JSON settings file. Defaults to the platform config directory.
    #[arg(long, global = true, env = "STRATA_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a dataset profile over a CSV file and write the partitions
    Run {
        /// Built-in profile name (institution, placement) or path to a JSON profile
        #[arg(short, long)]
        profile: String,

        /// Raw CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory. Defaults to the configured output directory.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Split seed. Defaults to the configured seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Print the run report as JSON instead of a summary line
        #[arg(long)]
        json: bool,
    },
    /// Inspect dataset profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Inspect settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Print a profile as JSON
    Show {
        /// Built-in profile name or path to a JSON profile
        name: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the effective settings as JSON
    Show,
    /// Print the default settings file location
    Path,
}

/// Settings resolved before logging starts, so the log directory is known.
pub fn resolve_settings(cli: &Cli) -> Result<AppSettings> {
    load_settings(cli.settings.as_deref()).context("Failed to load settings")
}

pub fn run_command(command: Commands, settings: &AppSettings) -> Result<()> {
    match command {
        Commands::Run {
            profile,
            input,
            output_dir,
            seed,
            json,
        } => handle_run(&profile, &input, output_dir, seed, json, settings),
        Commands::Profile {
            action: ProfileAction::Show { name },
        } => {
            let profile = DatasetProfile::resolve(&name)?;
            println!("{}", profile.to_json()?);
            Ok(())
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                println!("{}", serde_json::to_string_pretty(settings)?);
                Ok(())
            }
            SettingsAction::Path => {
                match get_settings_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No platform config directory available"),
                }
                Ok(())
            }
        },
    }
}

fn handle_run(
    profile: &str,
    input: &Path,
    output_dir: Option<PathBuf>,
    seed: Option<u64>,
    json: bool,
    settings: &AppSettings,
) -> Result<()> {
    let profile = DatasetProfile::resolve(profile)
        .with_context(|| format!("Unknown profile '{profile}'"))?;

    let mut split = settings.split_config();
    if let Some(seed) = seed {
        split = split.with_seed(seed);
    }

    let raw = load_csv(input)?;
    let output = Pipeline::new(profile).with_split(split).run(&raw)?;

    let output_dir = output_dir.unwrap_or_else(|| settings.output_dir.clone());
    let stem = output.report.dataset.clone();
    let written = write_partitions(&output.partitions, &output_dir, &stem)?;

    if json {
        println!("{}", output.report.to_json()?);
    } else {
        println!("{}", output.report.summary());
        for path in &written {
            println!("  wrote {}", path.display());
        }
    }

    Ok(())
}
