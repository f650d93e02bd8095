// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use hostwatch_runner::{
    aggregator::{AggregatorBuilder, TraceSink},
    config::{HostwatchConfig, HostwatchProfile},
    errors::WriteReportError,
    ingress::EventStream,
    reporter::{DisplayReporterBuilder, JunitWriter, StatusLevel, StructuredReporter},
    server_location::ServerLocation,
};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
};
use swrite::{SWrite, swrite, swriteln};
use tracing::{debug, info};

/// Correlates telemetry from a browser-hosted test runtime into a test report.
///
/// The test host reports test lifecycle events and dismissed dialogs as JSON lines. hostwatch
/// pairs begins with completions, attributes assertion dialogs to the test that raised them, and
/// produces a console summary, structured JSON and JUnit XML.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct HostwatchApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    #[clap(subcommand)]
    command: Command,
}

impl HostwatchApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        match self.command {
            Command::Replay(opts) => opts.exec(&self.config_opts, output),
            Command::ShowConfig => {
                let (workspace_root, config) = self.config_opts.make_config()?;
                let profile = self.config_opts.profile(&config)?;
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(describe_profile(&workspace_root, &profile).as_bytes())
                    .map_err(|err| ExpectedError::from(WriteReportError::Io(err)))?;
                Ok(0)
            }
            Command::FindPort { start } => {
                let start = match start {
                    Some(start) => start,
                    None => {
                        let (_, config) = self.config_opts.make_config()?;
                        self.config_opts.profile(&config)?.port()
                    }
                };
                let location = ServerLocation::new(start);
                let url = location.test_page_url()?;
                info!("test page will be served at {url}");
                println!("{}", location.port()?);
                Ok(0)
            }
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a recorded event stream and report on it.
    ///
    /// Events are read as JSON lines, one event per line. The exit code reflects the outcome of
    /// the run: failures (including assertion dialogs and host timeouts) exit with 100, an empty
    /// run with 4, and a run in which some test never completed with 106.
    Replay(ReplayOpts),

    /// Show the resolved configuration for a profile.
    ShowConfig,

    /// Find a free port for the harness server.
    FindPort {
        /// The first port to try [default: the profile's port].
        #[arg(long, value_name = "PORT")]
        start: Option<u16>,
    },
}

/// Configuration options for hostwatch.
#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
struct ConfigOpts {
    /// Workspace root [default: current directory].
    #[arg(long, global = true, value_name = "DIR")]
    workspace_root: Option<Utf8PathBuf>,

    /// Config file [default: workspace-root/.config/hostwatch.toml].
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// The hostwatch profile to use.
    #[arg(long, short = 'P', env = "HOSTWATCH_PROFILE", global = true)]
    profile: Option<String>,
}

impl ConfigOpts {
    fn make_config(&self) -> Result<(Utf8PathBuf, HostwatchConfig)> {
        let workspace_root = match &self.workspace_root {
            Some(root) => root.clone(),
            None => current_dir()?,
        };
        let config =
            HostwatchConfig::from_sources(workspace_root.clone(), self.config_file.as_deref())?;
        Ok((workspace_root, config))
    }

    fn profile<'cfg>(&self, config: &'cfg HostwatchConfig) -> Result<HostwatchProfile<'cfg>> {
        let name = self
            .profile
            .as_deref()
            .unwrap_or(HostwatchConfig::DEFAULT_PROFILE);
        Ok(config.profile(name)?)
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().map_err(|err| ExpectedError::CurrentDirFailed { err })?;
    Utf8PathBuf::from_path_buf(dir).map_err(|path| ExpectedError::CurrentDirInvalidUtf8 { path })
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// Human-readable status lines and a summary on stderr.
    #[default]
    Human,
    /// One JSON object per result on stdout.
    Json,
}

#[derive(Debug, Args)]
struct ReplayOpts {
    /// The event stream to replay, or `-` for standard input.
    #[arg(value_name = "EVENTS")]
    events: Utf8PathBuf,

    /// Results to display as they're reported [default: from profile]
    #[arg(long, value_name = "LEVEL")]
    status_level: Option<StatusLevel>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t)]
    message_format: MessageFormat,

    /// Do not write a JUnit report, even if the profile configures one
    #[arg(long)]
    no_junit: bool,
}

impl ReplayOpts {
    fn exec(self, config_opts: &ConfigOpts, output: OutputContext) -> Result<i32> {
        let (_, config) = config_opts.make_config()?;
        let profile = config_opts.profile(&config)?;

        let mut display = DisplayReporterBuilder::default();
        display
            .set_status_level(self.status_level.unwrap_or_else(|| profile.status_level()))
            .set_final_status_level(profile.final_status_level())
            .set_colorize(output.color.should_colorize(supports_color::Stream::Stderr));

        let mut builder = AggregatorBuilder::new();
        match self.message_format {
            MessageFormat::Human => {
                builder.add_subscriber(display.build(io::stderr()));
            }
            MessageFormat::Json => {
                builder.add_subscriber(StructuredReporter::new(io::stdout()));
            }
        }
        if output.verbose {
            builder.set_trace_sink(LogTraceSink);
        }
        let aggregator = builder.build();

        let (source_name, reader) = open_events(&self.events)?;
        for event in EventStream::new(reader) {
            let event =
                event.map_err(|err| ExpectedError::event_decode_failed(source_name.clone(), err))?;
            aggregator.handle(event);
        }

        let report = aggregator.report();
        let unmatched = aggregator.unmatched();
        if self.message_format == MessageFormat::Human {
            display
                .build(io::stderr())
                .write_summary(&report, &unmatched)?;
        }

        if self.no_junit {
            debug!("JUnit output disabled by --no-junit");
        } else if let Some(junit) = profile.junit() {
            let writer = JunitWriter::from_config(&junit);
            writer.write(&report)?;
            info!("wrote JUnit report to {}", writer.path());
        }

        let stats = report.stats();
        if stats.failure_count() > 0 {
            Err(ExpectedError::TestRunFailed)
        } else if !unmatched.is_empty() {
            // A completion without a begin never reaches the report, so it can't count as passed.
            Err(ExpectedError::IncompleteRun {
                unmatched: unmatched.begins.len() + unmatched.completions.len(),
            })
        } else if stats.total() == 0 {
            Err(ExpectedError::NoTestsRun)
        } else {
            Ok(0)
        }
    }
}

fn open_events(path: &Utf8Path) -> Result<(String, Box<dyn BufRead>)> {
    if path == "-" {
        return Ok(("<stdin>".to_owned(), Box::new(io::stdin().lock())));
    }
    let file = File::open(path)
        .map_err(|err| ExpectedError::event_stream_open_failed(path.to_owned(), err))?;
    Ok((path.to_string(), Box::new(BufReader::new(file))))
}

/// Forwards host trace output to the log.
#[derive(Debug)]
struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn on_trace(&self, message: &str) {
        info!(target: crate::output::NO_HEADING, "[host] {message}");
    }
}

fn describe_profile(workspace_root: &Utf8Path, profile: &HostwatchProfile<'_>) -> String {
    let mut out = String::new();
    swriteln!(out, "workspace root: {workspace_root}");
    swriteln!(out, "profile: {}", profile.name());
    swriteln!(out, "  store-dir: {}", profile.store_dir());
    swriteln!(out, "  status-level: {}", profile.status_level());
    swriteln!(out, "  final-status-level: {}", profile.final_status_level());
    swriteln!(
        out,
        "  dialog-poll-interval: {:?}",
        profile.dialog_poll_interval()
    );
    swriteln!(out, "  port: {}", profile.port());
    match profile.junit() {
        Some(junit) => {
            swrite!(out, "  junit: {}", junit.path());
            swriteln!(out, " (report name: {})", junit.report_name());
        }
        None => swriteln!(out, "  junit: disabled"),
    }
    out
}
