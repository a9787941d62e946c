use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tanklog")]
#[command(about = "Track fuel expenses from receipt photos")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name for backend configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the authenticated session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Upload a receipt image for OCR extraction
    Upload {
        /// Path to the receipt image (jpeg/png)
        image: PathBuf,
        /// Station name when the receipt does not show one
        #[arg(long, value_name = "NAME")]
        station_name: Option<String>,
        /// Purchase location
        #[arg(long, value_name = "PLACE")]
        location: Option<String>,
        /// Purchase date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        purchase_date: Option<String>,
    },
    /// List fuel records
    List {
        /// Page number to fetch
        #[arg(short, long, default_value = "0")]
        page: u32,
        /// Records per page
        #[arg(short, long, default_value = "20")]
        size: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single fuel record
    Show {
        /// Record ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a fuel record
    Delete {
        /// Record ID
        id: i64,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Login with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Register a new account
    Register {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        /// Display name
        #[arg(long, value_name = "NAME")]
        user_name: String,
    },
    /// Show auth status for the profile
    Status,
    /// Exchange the stored refresh token for a new access token
    Refresh,
    /// Logout and clear the stored session
    Logout,
    /// Request a password-reset OTP by email
    ForgotPassword {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
    /// Verify a password-reset OTP
    VerifyOtp {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// One-time password from the reset email
        #[arg(long, value_name = "CODE")]
        otp: String,
    },
    /// Reset the account password with a verified OTP
    ResetPassword {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// One-time password from the reset email
        #[arg(long, value_name = "CODE")]
        otp: String,
        /// New account password
        #[arg(long, value_name = "PASSWORD")]
        new_password: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Backend API base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile config
    Show {
        /// Profile name to show
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
