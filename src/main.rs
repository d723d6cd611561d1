use clap::Parser;
use miette::Result;
use tracing_subscriber::{fmt, EnvFilter};

use agrilink::cli::helpers::load_config;
use agrilink::cli::output::effective_format;
use agrilink::cli::{Cli, OutputFormat};
use agrilink::core::config::Config;
use agrilink::core::error::ApiError;

fn init_logging(verbose: u8, config: Option<&Config>) {
    let level = config.map_or("warn", |c| c.log_level.as_str());
    let filter = match verbose {
        0 => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    // A broken config only fails the commands that open a session; `init --force` repairs it
    let config = load_config(&cli.global).ok();
    init_logging(cli.global.verbose, config.as_ref());

    if config
        .as_ref()
        .is_some_and(|c| c.is_production() && c.uses_default_secret())
    {
        tracing::warn!("invite tokens are signed with the development secret; set AGRILINK_INVITE_SECRET");
    }

    let result = cli.command.run(&cli.global);
    if let Err(report) = &result {
        if effective_format(cli.global.format) == OutputFormat::Json {
            if let Some(err) = report.downcast_ref::<ApiError>() {
                let body = err.to_body(config.as_ref().is_some_and(|c| !c.is_production()));
                match serde_json::to_string_pretty(&body) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("{}", err),
                }
                std::process::exit(1);
            }
        }
    }
    result
}
