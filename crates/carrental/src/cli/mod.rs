//! Command-line interface for carrental.
//!
//! This module provides the CLI structure for the `rentctl` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CarCommand, ClientCommand, ConfigCommand, OutputArgs, OutputFormat, RentalCommand,
    RentalStatusArg, StatusCommand,
};

/// rentctl - Manage cars, clients and rentals
///
/// Registers cars and clients, opens rentals, and bills them on return
/// from elapsed time and kilometres driven.
#[derive(Debug, Parser)]
#[command(name = "rentctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database if needed and report readiness
    Init,

    /// Manage cars
    #[command(subcommand)]
    Car(CarCommand),

    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),

    /// Open, close and inspect rentals
    #[command(subcommand)]
    Rental(RentalCommand),

    /// Show storage status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
