//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod filters;
pub mod helpers;
pub mod output;
pub mod table;

use miette::Result;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
pub use filters::{OutboxFilter, Response, SearchArgs};
pub use helpers::Session;

impl Commands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        use crate::core::invite::LinkKind;

        match self {
            Commands::Init(args) => args.run(global),
            Commands::Account(cmd) => cmd.run(global),
            Commands::Worker(cmd) => cmd.run(LinkKind::Worker, global),
            Commands::AppUser(cmd) => cmd.run(LinkKind::ApplicatorUser, global),
            Commands::Grower(cmd) => cmd.run(global),
            Commands::Invite(cmd) => cmd.run(global),
            Commands::Farm(cmd) => cmd.run(global),
            Commands::Notify(cmd) => cmd.run(global),
            Commands::Outbox(cmd) => cmd.run(global),
            Commands::Catalog(cmd) => cmd.run(global),
            Commands::Completions(args) => args.run(),
        }
    }
}
