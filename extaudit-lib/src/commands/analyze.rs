//! The analysis workflow: decode, enrich, report.

use super::common::{ColorMode, LogLevel, init_logging};
use super::config::{Config, validate_endpoint};
use super::{Host, ProgressReporter};
use crate::Result;
use crate::inventory::decode;
use crate::marketplace::{Client, Enricher, EnrichmentContext, EnrichmentReport, LookupTracker, Progress};
use crate::reports::{AnalysisResult, generate_console, generate_html, generate_json};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use clap::Args;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use ohno::IntoAppError;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "commands";

/// Arguments of an analysis run
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Path to the per-user extension listing (default is `input.yaml`)
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: Option<Utf8PathBuf>,

    /// Render reports from an existing analysis result instead of querying the marketplace
    #[arg(long, value_name = "PATH", conflicts_with_all = ["input", "output", "delay", "endpoint"])]
    pub from_json: Option<Utf8PathBuf>,

    /// Path of the JSON analysis result (default is `extension-analysis.json`)
    #[arg(long, short = 'o', value_name = "PATH", help_heading = "Report Output")]
    pub output: Option<Utf8PathBuf>,

    /// Also render the analysis as an HTML report
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub html: Option<Utf8PathBuf>,

    /// Don't print the summary to the terminal
    #[arg(long, short = 'q', help_heading = "Report Output")]
    pub quiet: bool,

    /// Path to configuration file (default is `extaudit.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Pause between marketplace lookups, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay: Option<u64>,

    /// Marketplace query endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

/// Effective settings after merging the command line over the configuration file.
#[derive(Debug)]
struct Settings {
    input: Utf8PathBuf,
    output: Utf8PathBuf,
    endpoint: String,
    request_delay: Duration,
    request_timeout: Duration,
}

impl Settings {
    fn resolve(args: &AnalyzeArgs, config: Config) -> Result<Self> {
        let endpoint = match &args.endpoint {
            Some(endpoint) => {
                validate_endpoint(endpoint)?;
                endpoint.clone()
            }
            None => config.endpoint,
        };

        Ok(Self {
            input: args.input.clone().unwrap_or(config.input),
            output: args.output.clone().unwrap_or(config.output),
            endpoint,
            request_delay: args.delay.map_or(config.request_delay, Duration::from_millis),
            request_timeout: config.request_timeout,
        })
    }
}

/// Run a complete analysis
///
/// Reads the listing, looks up every distinct extension, and writes the JSON result plus
/// any requested reports. With `--from-json`, the reports are produced from an earlier
/// result and the marketplace is not contacted. A fatal error leaves no output files
/// behind.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, an input cannot be read, or an
/// output file cannot be written. Failed marketplace lookups are not errors.
pub async fn analyze<H: Host>(host: &mut H, args: &AnalyzeArgs) -> Result<()> {
    init_logging(args.log_level);

    if let Some(path) = &args.from_json {
        return render_existing(host, args, path);
    }

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let settings = Settings::resolve(args, config)?;

    let text = fs::read_to_string(&settings.input).into_app_err_with(|| format!("reading input file '{}'", settings.input))?;
    let inventory = decode(&text);

    log::info!(
        target: LOG_TARGET,
        "Decoded {} user(s) with {} extension(s) from '{}'",
        inventory.users.len(),
        inventory.entry_count(),
        settings.input
    );

    let client = Client::new(&settings.endpoint, settings.request_timeout)?;

    let progress_delay = if args.log_level == LogLevel::None {
        Duration::from_millis(300)
    } else {
        Duration::from_hours(365 * 24)
    };
    let progress: Arc<dyn Progress> = Arc::new(ProgressReporter::new(progress_delay, args.color.for_stderr()));
    progress.set_phase("Querying");
    let tracker = LookupTracker::new(&progress);

    let cancel = Arc::new(AtomicBool::new(false));
    let ctrl_c = cancel_on_ctrl_c(Arc::clone(&cancel));

    let observer = tracker.clone();
    let enricher = Enricher::new(client, settings.request_delay)
        .with_observer(move |index, total, raw_name| observer.begin_lookup(index, total, raw_name))
        .with_cancel_flag(cancel);

    let (context, report) = enricher.enrich(EnrichmentContext::new(), &inventory.dir_names).await;

    ctrl_c.abort();
    tracker.done();

    log::info!(
        target: LOG_TARGET,
        "Issued {} lookup(s): {} found, {} not found, {} failed",
        report.lookups,
        report.found,
        report.not_found,
        report.failed
    );

    let result = AnalysisResult::new(context.into_extensions(), inventory.users);

    let mut json = String::new();
    generate_json(&result, &mut json)?;

    let mut outputs = vec![OutputFile {
        path: &settings.output,
        what: "analysis result",
        contents: json,
    }];
    if let Some(path) = &args.html {
        outputs.push(html_output(&result, path)?);
    }

    write_outputs(&outputs)?;

    report_problems(host, &result, &report);

    if !args.quiet {
        print_summary(host, &result, args.color)?;
        let _ = writeln!(host.output(), "Results saved to '{}'", settings.output);
    }

    Ok(())
}

/// Produce reports from a previously exported analysis result, without any lookups.
fn render_existing<H: Host>(host: &mut H, args: &AnalyzeArgs, path: &Utf8Path) -> Result<()> {
    let text = fs::read_to_string(path).into_app_err_with(|| format!("reading analysis result '{path}'"))?;
    let result = AnalysisResult::from_json(&text)?;

    log::info!(
        target: LOG_TARGET,
        "Loaded {} user(s) and {} extension(s) from '{path}'",
        result.total_users(),
        result.unique_extensions()
    );

    if let Some(html_path) = &args.html {
        write_outputs(&[html_output(&result, html_path)?])?;
    }

    report_problems(host, &result, &EnrichmentReport::default());

    if !args.quiet {
        print_summary(host, &result, args.color)?;
    }

    Ok(())
}

fn print_summary<H: Host>(host: &mut H, result: &AnalysisResult, color: ColorMode) -> Result<()> {
    let mut console = String::new();
    generate_console(result, color.for_stdout(), &mut console)?;
    let _ = writeln!(host.output(), "{console}");
    Ok(())
}

/// A rendered report waiting to be written.
#[derive(Debug)]
struct OutputFile<'a> {
    path: &'a Utf8Path,
    what: &'static str,
    contents: String,
}

fn html_output<'a>(result: &AnalysisResult, path: &'a Utf8Path) -> Result<OutputFile<'a>> {
    let mut contents = String::new();
    generate_html(result, Local::now(), &mut contents)?;
    Ok(OutputFile {
        path,
        what: "HTML report",
        contents,
    })
}

/// Write every output, or none of them.
///
/// Each file is first written next to its destination under a temporary name. The
/// temporaries are renamed into place only once all of them were written; on failure
/// the ones already staged are removed.
fn write_outputs(outputs: &[OutputFile<'_>]) -> Result<()> {
    let mut staged: Vec<(Utf8PathBuf, &OutputFile<'_>)> = Vec::with_capacity(outputs.len());

    for output in outputs {
        let tmp = staging_path(output.path);
        if let Err(e) = fs::write(&tmp, &output.contents) {
            discard(&staged);
            return Err::<(), _>(e).into_app_err_with(|| format!("writing {} to '{}'", output.what, output.path));
        }
        staged.push((tmp, output));
    }

    for (index, (tmp, output)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, output.path) {
            discard(&staged[index..]);
            return Err::<(), _>(e).into_app_err_with(|| format!("writing {} to '{}'", output.what, output.path));
        }
    }

    Ok(())
}

fn staging_path(path: &Utf8Path) -> Utf8PathBuf {
    let name = path.file_name().unwrap_or("output");
    path.with_file_name(format!(".{name}.tmp.{}", std::process::id()))
}

fn discard(staged: &[(Utf8PathBuf, &OutputFile<'_>)]) {
    for (tmp, _) in staged {
        if let Err(e) = fs::remove_file(tmp) {
            log::warn!(target: LOG_TARGET, "Could not remove temporary file '{tmp}': {e}");
        }
    }
}

/// List failed lookups and note a cancelled run on the host's error stream.
fn report_problems<H: Host>(host: &mut H, result: &AnalysisResult, report: &EnrichmentReport) {
    let failures: Vec<_> = result.extensions.iter().filter(|(_, m)| m.is_lookup_error()).collect();
    if !failures.is_empty() {
        let _ = writeln!(host.error(), "Unable to look up {} extension(s)", failures.len());
        for (identifier, metadata) in failures {
            let _ = writeln!(host.error(), "  {identifier}: {}", metadata.description);
        }
    }

    if report.cancelled {
        let _ = writeln!(
            host.error(),
            "Interrupted after {} lookup(s); the results are incomplete",
            report.lookups
        );
    }
}

/// Set `flag` when the process receives Ctrl-C.
fn cancel_on_ctrl_c(flag: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!(target: LOG_TARGET, "Interrupted, finishing after the current lookup");
            flag.store(true, Ordering::Release);
        }
    })
}
