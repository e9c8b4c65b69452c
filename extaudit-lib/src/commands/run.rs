//! Command dispatch logic for extaudit

use super::{AnalyzeArgs, analyze};
use crate::{Host, Result};
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "extaudit", author, version, long_about = None)]
#[command(about = "Inventory the editor extensions installed across users and report their usage")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(flatten)]
    analyze: AnalyzeArgs,
}

/// Parse command-line arguments and run the analysis
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the analysis fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);
    analyze(host, &cli.analyze).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::{ColorMode, LogLevel};
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["extaudit"]).unwrap();
        assert!(cli.analyze.input.is_none());
        assert!(cli.analyze.output.is_none());
        assert!(cli.analyze.html.is_none());
        assert!(!cli.analyze.quiet);
        assert_eq!(cli.analyze.color, ColorMode::Auto);
        assert_eq!(cli.analyze.log_level, LogLevel::None);
    }

    #[test]
    fn test_all_arguments() {
        let cli = Cli::try_parse_from([
            "extaudit",
            "--input",
            "users.txt",
            "-o",
            "out.json",
            "--html",
            "report.html",
            "--config",
            "custom.toml",
            "--delay",
            "250",
            "--endpoint",
            "http://localhost:8080/query",
            "--color",
            "never",
            "--log-level",
            "debug",
            "--quiet",
        ])
        .unwrap();

        let args = cli.analyze;
        assert_eq!(args.input.as_deref().map(|p| p.as_str()), Some("users.txt"));
        assert_eq!(args.output.as_deref().map(|p| p.as_str()), Some("out.json"));
        assert_eq!(args.html.as_deref().map(|p| p.as_str()), Some("report.html"));
        assert_eq!(args.config.as_deref().map(|p| p.as_str()), Some("custom.toml"));
        assert_eq!(args.delay, Some(250));
        assert_eq!(args.endpoint.as_deref(), Some("http://localhost:8080/query"));
        assert_eq!(args.color, ColorMode::Never);
        assert_eq!(args.log_level, LogLevel::Debug);
        assert!(args.quiet);
    }

    #[test]
    fn test_rejects_bad_delay() {
        let _ = Cli::try_parse_from(["extaudit", "--delay", "fast"]).unwrap_err();
    }
}
