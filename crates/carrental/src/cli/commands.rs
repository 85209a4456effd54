//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use rust_decimal::Decimal;

/// Car registry commands.
#[derive(Debug, Subcommand)]
pub enum CarCommand {
    /// Register a new car
    Add {
        /// Model name
        model: String,

        /// Price per hour of rental
        #[arg(long)]
        hourly_rate: Decimal,

        /// Price per kilometre driven
        #[arg(long)]
        per_km_rate: Decimal,

        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List all cars
    List(OutputArgs),

    /// Show one car
    Show {
        /// Car identifier
        id: i64,

        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Client registry commands.
#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// Register a new client
    Register {
        /// Client name
        name: String,

        /// Contact email (must be unique)
        email: String,

        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List all clients
    List(OutputArgs),

    /// Show one client
    Show {
        /// Client identifier
        id: i64,

        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Rental lifecycle commands.
#[derive(Debug, Subcommand)]
pub enum RentalCommand {
    /// Open a rental starting now
    Start {
        /// Renting client
        #[arg(long)]
        client: i64,

        /// Rented car
        #[arg(long)]
        car: i64,

        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Close a rental and bill it
    End {
        /// Rental identifier
        id: i64,

        /// Kilometres driven during the rental
        #[arg(long, allow_negative_numbers = true)]
        km: Decimal,

        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show one rental
    Show {
        /// Rental identifier
        id: i64,

        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List rentals
    List {
        /// Only show rentals in this state
        #[arg(short, long, value_enum)]
        status: Option<RentalStatusArg>,

        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output selection shared by commands that print records.
#[derive(Debug, Clone, Copy, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Rental state argument for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RentalStatusArg {
    /// Rentals still out
    Open,
    /// Rentals returned and billed
    Closed,
}

impl From<RentalStatusArg> for crate::rental::RentalStatus {
    fn from(arg: RentalStatusArg) -> Self {
        match arg {
            RentalStatusArg::Open => Self::Open,
            RentalStatusArg::Closed => Self::Closed,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}
