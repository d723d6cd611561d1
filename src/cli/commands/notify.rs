//! `agrilink notify` - in-app notifications

use clap::{Args, Subcommand};
use miette::{bail, Result};

use crate::cli::output::{print_done, print_page};
use crate::cli::{GlobalOpts, Session};
use crate::core::filter::SearchOptions;

#[derive(Debug, Subcommand)]
pub enum NotifyCommands {
    /// List your notifications, newest first
    List(NotifyListArgs),

    /// Mark a notification (or all of them) as read
    Read(ReadArgs),
}

#[derive(Debug, Args)]
pub struct NotifyListArgs {
    /// Only unread notifications
    #[arg(long, short = 'u')]
    pub unread: bool,

    #[arg(long, short = 'p')]
    pub page: Option<i64>,

    #[arg(long, short = 'n')]
    pub limit: Option<i64>,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Notification id
    pub id: Option<i64>,

    /// Mark every notification as read
    #[arg(long, conflicts_with = "id")]
    pub all: bool,
}

impl NotifyCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        let actor = session.actor()?;

        match self {
            NotifyCommands::List(args) => {
                let options = SearchOptions {
                    page: args.page,
                    limit: args.limit,
                    ..Default::default()
                };
                let page = session
                    .services
                    .list_notifications(&actor, args.unread, &options)?;
                print_page(&page, session.format)
            }
            NotifyCommands::Read(args) => {
                if args.id.is_none() && !args.all {
                    bail!("Give a notification id or --all");
                }
                let changed = session.services.mark_notifications_read(&actor, args.id)?;
                print_done(
                    &format!("Marked {} notification(s) as read", changed),
                    session.format,
                )
            }
        }
    }
}
