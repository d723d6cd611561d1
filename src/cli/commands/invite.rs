//! `agrilink invite` - invitation links mailed to counterparts

use clap::{Args, Subcommand};
use miette::Result;

use crate::cli::output::print_record;
use crate::cli::{GlobalOpts, Session};

#[derive(Debug, Subcommand)]
pub enum InviteCommands {
    /// Accept an invite with the token from its email
    Accept(AcceptArgs),
}

#[derive(Debug, Args)]
pub struct AcceptArgs {
    /// Token from the accept link
    #[arg(long)]
    pub token: String,
}

impl InviteCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        match self {
            InviteCommands::Accept(args) => {
                let session = Session::open(global)?;
                let accepted = session.services.accept_invite_token(&args.token)?;
                let message = format!(
                    "You now work with {} as a {}",
                    accepted.account.display_name(),
                    accepted.link.kind.noun()
                );
                print_record(&accepted, Some(&message), session.format)
            }
        }
    }
}
