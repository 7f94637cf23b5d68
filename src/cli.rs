/*
 * This file is part of asusfan.
 *
 * Copyright (C) 2026 asusfan contributors
 *
 * asusfan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * asusfan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with asusfan. If not, see <https://www.gnu.org/licenses/>.
 */

//! Command Line Interface
//!
//! Offline inspection of the curve store and preferences. Nothing here talks to the
//! fan hardware.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use af_core::{
    evaluate, interpolate, load_preferences, presets, save_preferences, sort_points,
    validate_curve_points, CurvePoint, CurveStore, Profile,
};

#[derive(Parser)]
#[command(name = "asusfan")]
#[command(version)]
#[command(about = "asusfan - fan curves and telemetry for ASUS laptops")]
#[command(long_about = "asusfan - fan curves and telemetry for ASUS laptops

Inspect and prepare fan curves without touching the hardware.

EXAMPLES:
    asusfan presets                                   List built-in presets
    asusfan curves seed --profile quiet               Copy presets into the store
    asusfan curves list --profile balanced            List stored curves
    asusfan curves show balanced --profile balanced   Show a curve's points
    asusfan curves eval balanced 72.5                 Fan speed at 72.5°C
    asusfan curves validate ./my-curve.json           Check a points file
    asusfan prefs set-window 120                      Average over 2 minutes

ENVIRONMENT VARIABLES:
    ASUSFAN_LOG=debug      Log level filter (default: warn)
    XDG_CONFIG_HOME        Base of the config directory

FILES:
    ~/.config/asusfan/preferences.json                 Preferences
    ~/.config/asusfan/curves/<profile>/<name>.json     Stored curves")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Use this curve store instead of the configured one
    #[arg(long, global = true, value_name = "DIR")]
    pub curves_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List built-in presets and their points
    Presets,

    /// Fan curve store
    #[command(subcommand, about = "List, show, seed, validate and evaluate fan curves")]
    Curves(CurveCommands),

    /// Preferences
    #[command(subcommand, about = "Show and update preferences")]
    Prefs(PrefsCommands),
}

#[derive(Subcommand)]
pub enum CurveCommands {
    /// List stored curves of a profile
    List {
        #[arg(long, short, default_value = "balanced")]
        profile: Profile,
    },

    /// Show one stored curve
    Show {
        name: String,
        #[arg(long, short, default_value = "balanced")]
        profile: Profile,
    },

    /// Copy the presets into a profile (first use only)
    Seed {
        #[arg(long, short, default_value = "balanced")]
        profile: Profile,
    },

    /// Validate a JSON file holding a points array or a full curve
    Validate { path: PathBuf },

    /// Fan speed a stored curve gives at a temperature
    Eval {
        name: String,
        #[arg(allow_negative_numbers = true)]
        temperature: f32,
        #[arg(long, short, default_value = "balanced")]
        profile: Profile,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Print preferences as JSON
    Show,

    /// Print the preferences file path
    Path,

    /// Set the metrics averaging window in seconds (0-300)
    SetWindow { seconds: u32 },
}

pub fn run_cli(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Presets => cmd_presets(),
        Commands::Curves(sub) => cmd_curves(sub, &open_store(cli.curves_dir.as_deref())?),
        Commands::Prefs(sub) => cmd_prefs(sub),
    }
}

fn open_store(override_dir: Option<&Path>) -> Result<CurveStore> {
    let root = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => load_preferences()
            .context("Failed to load preferences")?
            .curves_root()?,
    };
    debug!("Using curve store at {:?}", root);
    Ok(CurveStore::new(root))
}

fn print_points(points: &[CurvePoint]) {
    for point in points {
        println!("  {:.0}°C -> {}%", point.temperature, point.speed);
    }
}

// ============================================================================
// Presets Command
// ============================================================================

fn cmd_presets() -> Result<()> {
    for (preset, curve) in presets(Profile::Balanced)? {
        println!("{} - {}", preset, preset.description());
        print_points(curve.points());
        println!();
    }
    Ok(())
}

// ============================================================================
// Curves Commands
// ============================================================================

fn cmd_curves(cmd: &CurveCommands, store: &CurveStore) -> Result<()> {
    match cmd {
        CurveCommands::List { profile } => {
            let records = store.load_all(*profile)?;
            println!("Fan Curves for {} ({}):", profile, records.len());
            for record in records {
                println!(
                    "  {}{} ({} points)",
                    record.name(),
                    if record.is_preset { " [preset]" } else { "" },
                    record.curve.points().len()
                );
            }
        }
        CurveCommands::Show { name, profile } => {
            let record = store.load(*profile, name)?;
            println!("Curve: {} ({})", record.name(), record.profile());
            println!("Points:");
            print_points(record.curve.points());
            for warning in record.curve.warnings() {
                println!("Warning: {}", warning);
            }
        }
        CurveCommands::Seed { profile } => {
            let written = store.seed_presets(*profile)?;
            if written.is_empty() {
                println!("Presets already seeded for {}", profile);
            } else {
                println!("Seeded {} presets for {}: {}", written.len(), profile, written.join(", "));
            }
        }
        CurveCommands::Validate { path } => {
            let points = sort_points(read_points_file(path)?);
            let warnings = validate_curve_points(&points)
                .with_context(|| format!("{} is not a valid curve", path.display()))?;
            println!("{}: valid ({} points)", path.display(), points.len());
            for warning in warnings {
                println!("Warning: {}", warning);
            }
        }
        CurveCommands::Eval { name, temperature, profile } => {
            let curve = store.load(*profile, name)?.curve;
            println!(
                "{:.1}°C -> {}% ({:.2})",
                temperature,
                evaluate(&curve, *temperature),
                interpolate(&curve, *temperature)
            );
        }
    }
    Ok(())
}

/// Points from a file holding either `[{temperature, speed}, ...]` or a full curve
fn read_points_file(path: &Path) -> Result<Vec<CurvePoint>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let points = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => match map.remove("points") {
            Some(points) => points,
            None => bail!("{} has no \"points\" field", path.display()),
        },
        _ => bail!("{} must hold a points array or a curve object", path.display()),
    };

    Ok(serde_json::from_value(points)?)
}

// ============================================================================
// Prefs Commands
// ============================================================================

fn cmd_prefs(cmd: &PrefsCommands) -> Result<()> {
    match cmd {
        PrefsCommands::Show => {
            let prefs = load_preferences()?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
        PrefsCommands::Path => {
            println!("{}", af_core::get_preferences_path()?.display());
        }
        PrefsCommands::SetWindow { seconds } => {
            let mut prefs = load_preferences()?;
            prefs.averaging_window_seconds = *seconds;
            save_preferences(&prefs)?;
            println!("Set averaging_window_seconds = {}", seconds);
        }
    }
    Ok(())
}
