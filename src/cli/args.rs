//! Top-level argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    account::AccountCommands, catalog::CatalogCommands, completions::CompletionsArgs,
    farm::FarmCommands, grower::GrowerCommands, init::InitArgs, invite::InviteCommands,
    links::LinkCommands, notify::NotifyCommands, outbox::OutboxCommands,
};

#[derive(Debug, Parser)]
#[command(name = "agrilink")]
#[command(author, version, about = "Agrilink - invitations, farm permissions and catalogs for ag operations")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options available on every command
#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Account id the command runs as
    #[arg(long = "as", value_name = "ACCOUNT_ID", env = "AGRILINK_ACTOR", global = true)]
    pub actor: Option<i64>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Auto, global = true)]
    pub format: OutputFormat,

    /// Database file (overrides configuration)
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table on a terminal, JSON when piped
    #[default]
    Auto,
    Table,
    Json,
    Csv,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an Agrilink workspace in the current directory
    Init(InitArgs),

    /// Accounts, registration and auto-accept preferences
    #[command(subcommand)]
    Account(AccountCommands),

    /// Workers (pilots) of an applicator
    #[command(subcommand)]
    Worker(LinkCommands),

    /// Applicator users (team members) of an applicator
    #[command(subcommand)]
    AppUser(LinkCommands),

    /// Growers an applicator works with
    #[command(subcommand)]
    Grower(GrowerCommands),

    /// Invitation links
    #[command(subcommand)]
    Invite(InviteCommands),

    /// Farms and farm permissions
    #[command(subcommand)]
    Farm(FarmCommands),

    /// In-app notifications
    #[command(subcommand)]
    Notify(NotifyCommands),

    /// Outgoing mail queue
    #[command(subcommand)]
    Outbox(OutboxCommands),

    /// Equipment, chemicals, products and reference data
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
