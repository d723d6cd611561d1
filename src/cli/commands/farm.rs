//! `agrilink farm` - farms and the permissions granted on them

use clap::{Args, Subcommand};
use miette::Result;

use crate::cli::helpers::confirm;
use crate::cli::output::{print_done, print_page, print_record, print_rows};
use crate::cli::{GlobalOpts, SearchArgs, Session};
use crate::store::NewFarm;

#[derive(Debug, Subcommand)]
pub enum FarmCommands {
    /// Create a farm (growers)
    Create(CreateFarmArgs),

    /// Farms you own, or that were shared with you
    List(SearchArgs),

    /// Show one farm
    Show(FarmIdArgs),

    /// Delete a farm and its permissions
    Delete(DeleteFarmArgs),

    /// Manage applicator access to a farm
    #[command(subcommand)]
    Permission(PermissionCommands),
}

#[derive(Debug, Args)]
pub struct CreateFarmArgs {
    #[arg(long)]
    pub name: String,

    /// State id (see `agrilink catalog states`)
    #[arg(long)]
    pub state_id: Option<i64>,

    #[arg(long)]
    pub county: Option<String>,

    #[arg(long)]
    pub township: Option<String>,
}

#[derive(Debug, Args)]
pub struct FarmIdArgs {
    pub farm_id: i64,
}

#[derive(Debug, Args)]
pub struct DeleteFarmArgs {
    pub farm_id: i64,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Subcommand)]
pub enum PermissionCommands {
    /// Grant an applicator access
    Grant(GrantArgs),

    /// Change an existing grant
    Update(UpdatePermissionArgs),

    /// Revoke a grant
    Revoke(RevokeArgs),

    /// List grants on a farm
    List(FarmIdArgs),
}

#[derive(Debug, Args)]
pub struct GrantArgs {
    pub farm_id: i64,

    /// Applicator account id
    #[arg(long)]
    pub applicator: i64,

    /// Allow viewing (default when neither flag is given)
    #[arg(long)]
    pub view: bool,

    /// Allow editing
    #[arg(long)]
    pub edit: bool,
}

#[derive(Debug, Args)]
pub struct UpdatePermissionArgs {
    pub permission_id: i64,

    #[arg(long)]
    pub view: bool,

    #[arg(long)]
    pub edit: bool,
}

#[derive(Debug, Args)]
pub struct RevokeArgs {
    pub permission_id: i64,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl FarmCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        let actor = session.actor()?;
        let svc = &session.services;

        match self {
            FarmCommands::Create(args) => {
                let farm = svc.create_farm(
                    &actor,
                    NewFarm {
                        name: args.name.clone(),
                        state_id: args.state_id,
                        county: args.county.clone(),
                        township: args.township.clone(),
                    },
                )?;
                let message = format!("Created farm {}", farm.id);
                print_record(&farm, Some(&message), session.format)
            }
            FarmCommands::List(search) => {
                print_page(&svc.list_farms(&actor, &search.options())?, session.format)
            }
            FarmCommands::Show(args) => {
                print_record(&svc.get_farm(&actor, args.farm_id)?, None, session.format)
            }
            FarmCommands::Delete(args) => {
                let prompt = format!("Delete farm {} and every permission on it?", args.farm_id);
                if !confirm(&prompt, args.yes)? {
                    println!("Aborted.");
                    return Ok(());
                }
                svc.delete_farm(&actor, args.farm_id)?;
                print_done(&format!("Deleted farm {}", args.farm_id), session.format)
            }
            FarmCommands::Permission(cmd) => match cmd {
                PermissionCommands::Grant(args) => {
                    let can_view = args.view || !args.edit;
                    let granted = svc.assign_farm_permission(
                        &actor,
                        args.farm_id,
                        args.applicator,
                        can_view,
                        args.edit,
                    )?;
                    let message = format!(
                        "Granted {} access to farm {}",
                        granted.applicator_name, granted.farm_id
                    );
                    print_record(&granted, Some(&message), session.format)
                }
                PermissionCommands::Update(args) => {
                    let updated =
                        svc.update_farm_permission(&actor, args.permission_id, args.view, args.edit)?;
                    print_record(&updated, Some("Permission updated"), session.format)
                }
                PermissionCommands::Revoke(args) => {
                    let prompt = format!("Revoke permission {}?", args.permission_id);
                    if !confirm(&prompt, args.yes)? {
                        println!("Aborted.");
                        return Ok(());
                    }
                    svc.delete_farm_permission(&actor, args.permission_id)?;
                    print_done(
                        &format!("Revoked permission {}", args.permission_id),
                        session.format,
                    )
                }
                PermissionCommands::List(args) => {
                    let grants = svc.list_farm_permissions(&actor, args.farm_id)?;
                    print_rows(&grants, session.format)
                }
            },
        }
    }
}
