//! `agrilink account` - registration, lookup and preferences

use clap::{Args, Subcommand};
use console::style;
use miette::Result;

use crate::cli::helpers::confirm;
use crate::cli::output::{effective_format, print_done, print_page, print_record};
use crate::cli::{GlobalOpts, OutputFormat, SearchArgs, Session};
use crate::core::actor::Role;
use crate::core::invite::AutoAcceptPreferences;
use crate::store::NewAccount;

#[derive(Debug, Subcommand)]
pub enum AccountCommands {
    /// Register an account
    Create(CreateAccountArgs),

    /// Show an account (your own unless you are an administrator)
    Show(ShowAccountArgs),

    /// List accounts (administrators)
    List(SearchArgs),

    /// Set your auto-accept preferences
    Preferences(PreferencesArgs),

    /// Delete an account and everything linked to it (administrators)
    Delete(DeleteAccountArgs),

    /// Show who `--as` resolves to
    Whoami,
}

#[derive(Debug, Args)]
pub struct CreateAccountArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// GROWER, APPLICATOR, APPLICATOR_USER, WORKER, SUPER_ADMIN or SUPER_ADMIN_USER
    #[arg(long)]
    pub role: Role,

    #[arg(long)]
    pub business_name: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub address: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowAccountArgs {
    /// Account id (defaults to the caller)
    pub id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct PreferencesArgs {
    /// Turn auto-accept on
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Turn auto-accept off
    #[arg(long)]
    pub disable: bool,

    /// Lowest percentage fee to accept automatically
    #[arg(long)]
    pub min_percentage_fee: Option<f64>,

    /// Lowest dollars per acre to accept automatically
    #[arg(long)]
    pub min_dollar_per_acre: Option<f64>,
}

#[derive(Debug, Args)]
pub struct DeleteAccountArgs {
    pub id: i64,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl AccountCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        let svc = &session.services;

        match self {
            AccountCommands::Create(args) => {
                let caller = session.optional_actor()?;
                let account = svc.register_account(
                    caller.as_ref(),
                    NewAccount {
                        email: args.email.clone(),
                        first_name: args.first_name.clone(),
                        last_name: args.last_name.clone(),
                        business_name: args.business_name.clone(),
                        phone: args.phone.clone(),
                        address: args.address.clone(),
                        role: args.role,
                    },
                )?;
                let message = format!("Registered {} as account {}", account.email, account.id);
                print_record(&account, Some(&message), session.format)
            }
            AccountCommands::Show(args) => {
                let actor = session.actor()?;
                let account = svc.get_account(&actor, args.id.unwrap_or(actor.acting_user_id))?;
                print_record(&account, None, session.format)
            }
            AccountCommands::List(search) => {
                let actor = session.actor()?;
                print_page(&svc.list_accounts(&actor, &search.options())?, session.format)
            }
            AccountCommands::Preferences(args) => {
                let actor = session.actor()?;
                let current = svc.get_account(&actor, actor.acting_user_id)?.preferences();
                let prefs = AutoAcceptPreferences {
                    enabled: if args.enable {
                        true
                    } else if args.disable {
                        false
                    } else {
                        current.enabled
                    },
                    min_percentage_fee: args.min_percentage_fee.or(current.min_percentage_fee),
                    min_dollar_per_acre: args.min_dollar_per_acre.or(current.min_dollar_per_acre),
                };
                let account = svc.update_preferences(&actor, prefs)?;
                print_record(&account, Some("Preferences saved"), session.format)
            }
            AccountCommands::Delete(args) => {
                let actor = session.actor()?;
                let prompt = format!("Delete account {} and all of its links?", args.id);
                if !confirm(&prompt, args.yes)? {
                    println!("Aborted.");
                    return Ok(());
                }
                svc.delete_account(&actor, args.id)?;
                print_done(&format!("Deleted account {}", args.id), session.format)
            }
            AccountCommands::Whoami => {
                let actor = session.actor()?;
                match effective_format(session.format) {
                    OutputFormat::Json => {
                        let json = serde_json::to_string_pretty(&actor)
                            .map_err(|e| miette::miette!("{}", e))?;
                        println!("{}", json);
                    }
                    _ => {
                        println!("Account:  {}", style(actor.acting_user_id).cyan());
                        println!("Acts as:  {} ({})", style(actor.id).cyan(), actor.role);
                        if actor.is_delegated {
                            println!("{}", style("Acting on behalf of the applicator above").dim());
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
