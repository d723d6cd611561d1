//! `agrilink grower` - applicator ↔ grower relationships

use clap::{Args, Subcommand};
use miette::Result;

use crate::cli::commands::links::{EmailArgs, RemoveArgs, RespondArgs};
use crate::cli::helpers::confirm;
use crate::cli::output::{print_done, print_page, print_record};
use crate::cli::{GlobalOpts, SearchArgs, Session};
use crate::core::invite::LinkKind;

#[derive(Debug, Subcommand)]
pub enum GrowerCommands {
    /// Invite a grower account
    Invite(GrowerInviteArgs),

    /// Accept or reject an applicator's invite (as the grower)
    Respond(RespondArgs),

    /// Growers you work with
    List(SearchArgs),

    /// Invites waiting for your answer (as the grower)
    Pending(SearchArgs),

    /// Applicators you work with or were invited by (as the grower)
    Applicators(SearchArgs),

    /// Look up a grower by email
    Search(EmailArgs),

    /// Stop working with a grower
    Remove(RemoveArgs),
}

#[derive(Debug, Args)]
pub struct GrowerInviteArgs {
    /// Grower account id
    pub id: i64,
}

impl GrowerCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        let actor = session.actor()?;
        let svc = &session.services;

        match self {
            GrowerCommands::Invite(args) => {
                let sent = svc.send_invite_to_grower(&actor, args.id)?;
                let message = format!("Invite to {} is {}", sent.account.email, sent.link.invite_status);
                print_record(&sent, Some(&message), session.format)
            }
            GrowerCommands::Respond(args) => {
                let answered =
                    svc.respond_to_grower_invite(&actor, args.applicator_id, args.response.status())?;
                let message = format!("Invite from {} {}", answered.account.display_name(), answered.link.invite_status);
                print_record(&answered, Some(&message), session.format)
            }
            GrowerCommands::List(search) => {
                print_page(&svc.list_growers(&actor, &search.options())?, session.format)
            }
            GrowerCommands::Pending(search) => {
                let page = svc.pending_invites(&actor, LinkKind::Grower, &search.options())?;
                print_page(&page, session.format)
            }
            GrowerCommands::Applicators(search) => {
                let page = svc.list_applicators_for(&actor, LinkKind::Grower, &search.options())?;
                print_page(&page, session.format)
            }
            GrowerCommands::Search(args) => {
                let found = svc.search_by_email(&actor, LinkKind::Grower, &args.email)?;
                print_record(&found, None, session.format)
            }
            GrowerCommands::Remove(args) => {
                if !confirm(&format!("Stop working with grower {}?", args.id), args.yes)? {
                    println!("Aborted.");
                    return Ok(());
                }
                svc.remove_link(&actor, LinkKind::Grower, args.id)?;
                print_done(&format!("Removed grower {}", args.id), session.format)
            }
        }
    }
}
