use std::io;
use std::process::ExitCode;

use chrono::{Local, NaiveDateTime};
use clap::Parser;
use tracing::{error, info};

use weather_scheduler::cli::{Cli, Command, Prompter};
use weather_scheduler::email::{build_message, send_tls_message};
use weather_scheduler::error::USAGE_EXIT_CODE;
use weather_scheduler::{
    FileTemplateStore, Result, ScheduleRequest, Scheduler, SchedulerConfig, SchedulerError,
    WundergroundClient, logging,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version requests are not failures
            let code = if err.use_stderr() { USAGE_EXIT_CODE } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };
    // One clock reading per run; every date in the run derives from it
    let now = Local::now().naive_local();

    match run(cli, now).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Run failed");
            eprintln!("{}", err.user_message());
            ExitCode::from(err.exit_code())
        }
    }
}

fn load_config(cli: &Cli) -> Result<SchedulerConfig> {
    SchedulerConfig::load_from_path(cli.config.clone()).map_err(|e| {
        e.downcast::<SchedulerError>()
            .unwrap_or_else(|e| SchedulerError::config(format!("{e:#}")))
    })
}

async fn run(cli: Cli, now: NaiveDateTime) -> Result<()> {
    let mut config = load_config(&cli)?;
    logging::init(&config.logging, cli.verbose);

    match cli.command {
        None => {
            let request = {
                let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
                prompter.schedule_request(&config)?
            };
            schedule(&config, &request, now).await
        }
        Some(Command::Schedule(args)) => {
            args.apply_overrides(&mut config);
            config.validate()?;
            let request = args.to_request(&config)?;
            schedule(&config, &request, now).await
        }
        Some(Command::Email(args)) => {
            let (draft, settings) = {
                let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
                args.resolve(&config.email, &mut prompter)?
            };
            let message = build_message(&draft)?;
            tokio::task::spawn_blocking(move || send_tls_message(&settings, &message))
                .await
                .map_err(|e| SchedulerError::SmtpSend {
                    message: e.to_string(),
                })?
        }
    }
}

async fn schedule(
    config: &SchedulerConfig,
    request: &ScheduleRequest,
    now: NaiveDateTime,
) -> Result<()> {
    let mut client = WundergroundClient::new(&config.weather)?;
    if let Some(directory) = &config.weather.dump_directory {
        client = client.with_dump_directory(directory.clone(), now.date());
    }

    let scheduler = Scheduler::new(client, FileTemplateStore::new(config.templates.directory.clone()))
        .with_builder(config.context.builder());

    let text = scheduler.schedule(request, now).await?;
    info!(bytes = text.len(), "Rendered template");
    println!("{text}");
    Ok(())
}
