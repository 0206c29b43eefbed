//! Command-line interface parsing and interactive prompting
//!
//! Without a subcommand the binary prompts for every scheduling value on
//! stdin. `schedule` and `email` take their values from flags, falling back to
//! the configuration file.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{EmailConfig, SchedulerConfig};
use crate::context::{Context, MappingVariant};
use crate::email::{EmailDraft, SmtpSettings};
use crate::kv::parse_kv_string;
use crate::scheduler::ScheduleRequest;
use crate::weekday::parse_wall_time;
use crate::{Result, SchedulerError};

const CONTEXT: &str = "Additional comma separated key=value pairs to use as context";
const DAY: &str = "The day of the week to use weather data for:\n\
                   monday|tuesday|wednesday|thursday|friday|saturday|sunday";
const KEY: &str = "The weather underground key to use when making the API requests";
const LOCATION: &str = "The location to query for the weather forecast";
const TIME: &str = "The time of the event in \"HH:MM AM|PM\" format";

const FROM: &str = "The email address to send the email from";
const RECIPIENTS: &str = "The comma separated email addresses to send the email to";
const SUBJECT: &str = "The subject of the email message";
const TEXT: &str = "The main text of the email message, or a path to a file";
const PASSWORD: &str = "The password on the SMTP server";

/// Request weather forecast data and render an event template
#[derive(Parser, Debug)]
#[command(name = "weather-scheduler")]
#[command(about = "Request weather forecast data from the Internet and render an event template")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the template for a day with the forecast for that day
    Schedule(ScheduleArgs),
    /// Send a message with an optional image over STARTTLS SMTP
    Email(EmailArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScheduleArgs {
    /// Additional comma separated key=value pairs to use as context
    #[arg(short, long)]
    pub context: Option<String>,

    /// The day of the week to use weather data for
    #[arg(short, long)]
    pub day: Option<String>,

    /// The weather underground API key
    #[arg(short, long)]
    pub key: Option<String>,

    /// The location to query for the weather forecast
    #[arg(short, long)]
    pub location: Option<String>,

    /// The time of the event in "HH:MM AM|PM" format
    #[arg(short, long)]
    pub time: Option<String>,

    /// Directory holding one template file per weekday
    #[arg(long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    /// Add distance-at-pace projections to the context
    #[arg(long)]
    pub pace: bool,

    /// Forecast field preset
    #[arg(long, value_enum)]
    pub variant: Option<MappingVariant>,
}

impl ScheduleArgs {
    /// Fold the template and context flags into `config`
    pub fn apply_overrides(&self, config: &mut SchedulerConfig) {
        if let Some(directory) = &self.template_dir {
            config.templates.directory = directory.clone();
        }
        if self.pace {
            config.context.pace_projection = true;
        }
        if let Some(variant) = self.variant {
            config.context.variant = variant;
        }
    }

    /// Build the scheduling request, taking unset values from `config`
    pub fn to_request(&self, config: &SchedulerConfig) -> Result<ScheduleRequest> {
        let key = self
            .key
            .clone()
            .or_else(|| config.weather.api_key.clone())
            .ok_or_else(|| {
                SchedulerError::config("No weather API key, pass --key or set weather.api_key")
            })?;

        // An absent context flag skips parsing entirely
        let context = match &self.context {
            Some(text) => Context::from(parse_kv_string(text)?),
            None => Context::new(),
        };

        Ok(ScheduleRequest {
            context,
            day: self.day.clone().unwrap_or_else(|| config.defaults.day.clone()),
            key,
            location: self
                .location
                .clone()
                .unwrap_or_else(|| config.defaults.location.clone()),
            time: parse_wall_time(self.time.as_deref().unwrap_or(&config.defaults.time))?,
        })
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct EmailArgs {
    /// The email address to send the email from
    #[arg(short, long)]
    pub from_address: Option<String>,

    /// The comma separated email addresses to send the email to
    #[arg(short, long)]
    pub recipients: Option<String>,

    /// The subject of the email message
    #[arg(long)]
    pub subject: Option<String>,

    /// Path to an image to attach
    #[arg(short, long)]
    pub image: Option<String>,

    /// The SMTP server to connect with
    #[arg(short, long)]
    pub server: Option<String>,

    /// The port to use when connecting to the SMTP server
    #[arg(short, long)]
    pub port: Option<u16>,

    /// The username to authenticate with, defaults to the from address
    #[arg(short, long)]
    pub username: Option<String>,

    /// The main text of the message, or a path to a file holding it
    #[arg(long)]
    pub text: Option<String>,
}

impl EmailArgs {
    /// Fill every missing value from `config` or by prompting
    pub fn resolve<R: BufRead, W: Write>(
        &self,
        config: &EmailConfig,
        prompter: &mut Prompter<R, W>,
    ) -> Result<(EmailDraft, SmtpSettings)> {
        let from = prompter.value_or_ask(self.from_address.as_deref(), FROM)?;
        let draft = EmailDraft {
            recipients: prompter.value_or_ask(self.recipients.as_deref(), RECIPIENTS)?,
            subject: prompter.value_or_ask(self.subject.as_deref(), SUBJECT)?,
            text: prompter.value_or_ask(self.text.as_deref(), TEXT)?,
            image: self.image.clone(),
            from,
        };

        let username = self
            .username
            .clone()
            .or_else(|| config.username.clone())
            .unwrap_or_else(|| draft.from.clone());
        let password = match &config.password {
            Some(password) => password.clone(),
            None => prompter.ask(PASSWORD, None)?,
        };

        let settings = SmtpSettings {
            server: self.server.clone().unwrap_or_else(|| config.server.clone()),
            port: self.port.unwrap_or(config.port),
            username: Some(username),
            password: Some(password),
        };
        Ok((draft, settings))
    }
}

/// Line-based prompts over any reader and writer
///
/// End of input is reported as [`SchedulerError::Cancelled`].
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Show `message` (and `default` in brackets), read one line.
    /// An empty answer yields the default, or an empty string without one.
    pub fn ask(&mut self, message: &str, default: Option<&str>) -> Result<String> {
        match default.filter(|d| !d.is_empty()) {
            Some(default) => write!(self.output, "{message} [{default}]: ")?,
            None => write!(self.output, "{message}: ")?,
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SchedulerError::Cancelled);
        }
        let answer = line.trim_end_matches(['\r', '\n']);
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer.to_string())
        }
    }

    fn value_or_ask(&mut self, value: Option<&str>, message: &str) -> Result<String> {
        match value {
            Some(value) => Ok(value.to_string()),
            None => self.ask(message, None),
        }
    }

    /// Prompt for every scheduling value, offering the configured defaults
    pub fn schedule_request(&mut self, config: &SchedulerConfig) -> Result<ScheduleRequest> {
        let context = self.ask(CONTEXT, None)?;
        let day = self.ask(DAY, Some(&config.defaults.day))?;
        let key = self.ask(KEY, config.weather.api_key.as_deref())?;
        let location = self.ask(LOCATION, Some(&config.defaults.location))?;
        let time = self.ask(TIME, Some(&config.defaults.time))?;

        Ok(ScheduleRequest {
            context: Context::from(parse_kv_string(&context)?),
            day,
            key,
            location,
            time: parse_wall_time(&time)?,
        })
    }
}
