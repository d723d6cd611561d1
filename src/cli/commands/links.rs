//! `agrilink worker` / `agrilink app-user` - applicator team relationships

use clap::{Args, Subcommand};
use miette::{bail, Result};

use crate::cli::helpers::confirm;
use crate::cli::output::{print_done, print_page, print_record};
use crate::cli::{GlobalOpts, Response, SearchArgs, Session};
use crate::core::invite::{LinkKind, Terms};
use crate::services::{InviteOffer, NewCounterpart};

#[derive(Debug, Subcommand)]
pub enum LinkCommands {
    /// Create the account and send it an invite
    Create(CreateArgs),

    /// List your links with optional search
    List(SearchArgs),

    /// Invite (or re-invite) an existing account
    Invite(InviteArgs),

    /// Accept or reject an applicator's invite
    Respond(RespondArgs),

    /// Look up an account by email before inviting it
    Search(EmailArgs),

    /// Invites waiting for your answer
    Pending(SearchArgs),

    /// Applicators you work with or were invited by
    Applicators(SearchArgs),

    /// Show one link
    Show(IdArgs),

    /// Remove a link (the account is kept)
    Remove(RemoveArgs),
}

/// Terms and identifiers sent with an invite
#[derive(Debug, Clone, Default, Args)]
pub struct OfferArgs {
    /// Percentage fee offered (workers)
    #[arg(long)]
    pub percentage_fee: Option<f64>,

    /// Dollars per acre offered (workers)
    #[arg(long)]
    pub dollar_per_acre: Option<f64>,

    /// Permissions granted (applicator users), comma-separated
    #[arg(long, value_delimiter = ',')]
    pub permissions: Vec<String>,

    /// Your business identifier for this person
    #[arg(long)]
    pub code: Option<String>,
}

impl OfferArgs {
    fn offer(&self, kind: LinkKind) -> Result<InviteOffer> {
        let has_terms = self.percentage_fee.is_some() || self.dollar_per_acre.is_some();
        if has_terms && kind != LinkKind::Worker {
            bail!("Pricing terms can only be offered to workers");
        }
        if !self.permissions.is_empty() && kind != LinkKind::ApplicatorUser {
            bail!("Permissions can only be granted to applicator users");
        }
        Ok(InviteOffer {
            terms: Terms {
                percentage_fee: self.percentage_fee,
                dollar_per_acre: self.dollar_per_acre,
            },
            code: self.code.clone(),
            permissions: self.permissions.clone(),
        })
    }
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub business_name: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[command(flatten)]
    pub offer: OfferArgs,
}

#[derive(Debug, Args)]
pub struct InviteArgs {
    /// Account id to invite
    pub id: i64,

    #[command(flatten)]
    pub offer: OfferArgs,
}

#[derive(Debug, Args)]
pub struct RespondArgs {
    /// Applicator that sent the invite
    pub applicator_id: i64,

    #[arg(value_enum)]
    pub response: Response,
}

#[derive(Debug, Args)]
pub struct EmailArgs {
    pub email: String,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    /// Account id of the worker or applicator user
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    pub id: i64,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl LinkCommands {
    pub fn run(&self, kind: LinkKind, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        let actor = session.actor()?;
        let svc = &session.services;

        match self {
            LinkCommands::Create(args) => {
                let input = NewCounterpart {
                    email: args.email.clone(),
                    first_name: args.first_name.clone(),
                    last_name: args.last_name.clone(),
                    business_name: args.business_name.clone(),
                    phone: args.phone.clone(),
                    address: args.address.clone(),
                    offer: args.offer.offer(kind)?,
                };
                let created = match kind {
                    LinkKind::Worker => svc.create_worker(&actor, input)?,
                    _ => svc.create_applicator_user(&actor, input)?,
                };
                let message = format!("Created {} {} and sent an invite", kind.noun(), created.account.email);
                print_record(&created, Some(&message), session.format)
            }
            LinkCommands::List(search) => {
                let page = svc.list_links(&actor, kind, &search.options())?;
                print_page(&page, session.format)
            }
            LinkCommands::Invite(args) => {
                let offer = args.offer.offer(kind)?;
                let sent = match kind {
                    LinkKind::Worker => {
                        svc.send_invite_to_worker(&actor, args.id, offer.terms, offer.code)?
                    }
                    _ => svc.send_invite_to_applicator_user(
                        &actor,
                        args.id,
                        offer.permissions,
                        offer.code,
                    )?,
                };
                let message = format!("Invite to {} is {}", sent.account.email, sent.link.invite_status);
                print_record(&sent, Some(&message), session.format)
            }
            LinkCommands::Respond(args) => {
                let answered = svc.update_invite_status(
                    &actor,
                    kind,
                    args.applicator_id,
                    args.response.status(),
                )?;
                let message = format!("Invite from {} {}", answered.account.display_name(), answered.link.invite_status);
                print_record(&answered, Some(&message), session.format)
            }
            LinkCommands::Search(args) => {
                let found = svc.search_by_email(&actor, kind, &args.email)?;
                print_record(&found, None, session.format)
            }
            LinkCommands::Pending(search) => {
                let page = svc.pending_invites(&actor, kind, &search.options())?;
                print_page(&page, session.format)
            }
            LinkCommands::Applicators(search) => {
                let page = svc.list_applicators_for(&actor, kind, &search.options())?;
                print_page(&page, session.format)
            }
            LinkCommands::Show(args) => {
                let linked = svc.get_link(&actor, kind, args.id)?;
                print_record(&linked, None, session.format)
            }
            LinkCommands::Remove(args) => {
                let prompt = format!("Remove {} {}?", kind.noun(), args.id);
                if !confirm(&prompt, args.yes)? {
                    println!("Aborted.");
                    return Ok(());
                }
                svc.remove_link(&actor, kind, args.id)?;
                print_done(&format!("Removed {} {}", kind.noun(), args.id), session.format)
            }
        }
    }
}
