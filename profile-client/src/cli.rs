use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "profile-client")]
#[command(about = "Manage your profile picture from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the signed-in profile
    Me,
    /// Upload a new profile picture
    Upload {
        /// Image file to upload
        path: PathBuf,
    },
    /// Save the session cookie value copied from the browser
    Session {
        /// Value of the `id` cookie
        session_id: String,
    },
    /// Remove the saved session
    Logout,
    /// Print config path and create default file if missing
    ConfigPath,
}
