//! `agrilink outbox` - deliver and inspect queued mail

use std::time::Duration;

use chrono::Utc;
use clap::{Args, Subcommand};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::output::{effective_format, print_page};
use crate::cli::{GlobalOpts, OutboxFilter, OutputFormat, Session};
use crate::core::actor::EffectiveActor;
use crate::core::filter::SearchOptions;
use crate::core::pagination::Paged;
use crate::mail::{mailer_for, OutboxDispatcher};
use crate::services::require_admin;

#[derive(Debug, Subcommand)]
pub enum OutboxCommands {
    /// Send pending mail through the configured transport
    Deliver(DeliverArgs),

    /// List queued and delivered mail (administrators)
    List(OutboxListArgs),
}

#[derive(Debug, Args)]
pub struct DeliverArgs {
    /// Most messages to send in this run
    #[arg(long, default_value_t = 50)]
    pub batch: i64,

    /// Put FAILED messages back in the queue first
    #[arg(long)]
    pub retry_failed: bool,

    /// Override mail.max_attempts
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Override mail.retry_delay_ms
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Args)]
pub struct OutboxListArgs {
    #[arg(long, value_enum, default_value_t = OutboxFilter::All)]
    pub status: OutboxFilter,

    #[arg(long, short = 'p')]
    pub page: Option<i64>,

    #[arg(long, short = 'n')]
    pub limit: Option<i64>,
}

fn require_operator(actor: &EffectiveActor) -> Result<()> {
    Ok(require_admin(actor, "inspect the outbox")?)
}

impl OutboxCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        let svc = &session.services;

        match self {
            OutboxCommands::Deliver(args) => {
                let store = svc.store();
                if args.retry_failed {
                    let requeued = store.requeue_failed_outbox(Utc::now()).into_diagnostic()?;
                    tracing::info!(requeued, "failed mail requeued");
                }

                let config = svc.config();
                let mailer = mailer_for(config);
                let dispatcher = OutboxDispatcher::new(store, mailer.as_ref(), config).with_retry(
                    args.max_attempts.unwrap_or(config.mail.max_attempts),
                    Duration::from_millis(args.retry_delay_ms.unwrap_or(config.mail.retry_delay_ms)),
                );
                let report = dispatcher.dispatch(args.batch).into_diagnostic()?;

                match effective_format(session.format) {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?)
                    }
                    _ => println!(
                        "{} {} sent, {} failed",
                        style("✓").green(),
                        style(report.sent).cyan(),
                        if report.failed > 0 {
                            style(report.failed).red()
                        } else {
                            style(report.failed).dim()
                        }
                    ),
                }
                Ok(())
            }
            OutboxCommands::List(args) => {
                let actor = session.actor()?;
                require_operator(&actor)?;
                let pagination = svc.pagination(&SearchOptions {
                    page: args.page,
                    limit: args.limit,
                    ..Default::default()
                });
                let (rows, total) = svc
                    .store()
                    .list_outbox(args.status.status(), pagination)
                    .into_diagnostic()?;
                print_page(&Paged::new(rows, pagination, total), session.format)
            }
        }
    }
}
