use crate::core::BloodGroup;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "donor-directory")]
#[command(about = "Query blood donors and manage donor profiles")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "donor-directory.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show a user's profile
    Show {
        #[arg(long)]
        user: String,
    },

    /// List donors, grouped by blood group unless one is given
    Donors {
        /// Requesting user, excluded from the results
        #[arg(long)]
        user: String,

        #[arg(long, value_parser = parse_blood_group)]
        blood_group: Option<BloodGroup>,
    },

    /// Edit profile fields and optionally replace the profile picture
    Update {
        #[arg(long)]
        user: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Image file to upload as the new profile picture
        #[arg(long)]
        picture: Option<PathBuf>,
    },

    /// Send a donation request mail to a donor
    Contact {
        #[arg(long)]
        user: String,

        #[arg(long)]
        donor: String,

        #[arg(long)]
        note: Option<String>,
    },
}

fn parse_blood_group(value: &str) -> Result<BloodGroup, String> {
    value.parse::<BloodGroup>().map_err(|e| e.to_string())
}
