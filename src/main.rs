// SPDX-License-Identifier: MPL-2.0
use std::ffi::OsString;
use std::path::PathBuf;

use diagnostics_journal::config::{self, Config};
use diagnostics_journal::domain::diagnostics::MaxLogSize;
use diagnostics_journal::journal_log;
use diagnostics_journal::logging::{DiagnosticsLogger, LoggerOptions};
use diagnostics_journal::report::{
    default_export_directory, DirectoryTreeReporter, ErrorPatternProvider, GeneralInfoReporter,
    IdentityRedactionFilter, InsightResult, InsightsReporter, LogsReporter, PathRedactionFilter,
    ReportCompiler, Section, SystemMetadataReporter,
};
use diagnostics_journal::{Error, Result};
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = "\
diagnostics-journal

USAGE:
  diagnostics-journal [OPTIONS]

OPTIONS:
  --log-dir <DIR>      Directory holding the diagnostic log
  --max-size <BYTES>   Maximum size of the log file
  --output <DIR>       Directory the report is written to
  --message <TEXT>     Message to log before compiling (repeatable)
  -h, --help           Print this help
";

struct Args {
    log_dir: Option<PathBuf>,
    max_size: Option<u64>,
    output: Option<PathBuf>,
    messages: Vec<String>,
}

fn parse_args() -> std::result::Result<Option<Args>, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let parsed = Args {
        log_dir: args.opt_value_from_os_str("--log-dir", |s| {
            Ok::<_, std::convert::Infallible>(PathBuf::from(s))
        })?,
        max_size: args.opt_value_from_str("--max-size")?,
        output: args.opt_value_from_os_str("--output", |s| {
            Ok::<_, std::convert::Infallible>(PathBuf::from(s))
        })?,
        messages: args.values_from_str("--message")?,
    };

    let remaining: Vec<OsString> = args.finish();
    if !remaining.is_empty() {
        eprintln!("Ignoring unexpected arguments: {remaining:?}");
    }
    Ok(Some(parsed))
}

/// Sends tracing output to a copy of the original stderr, so the journal's
/// own diagnostics are not captured back into the log.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    #[cfg(unix)]
    {
        use std::os::fd::AsFd;
        if let Ok(fd) = std::io::stderr().as_fd().try_clone_to_owned() {
            let writer = std::sync::Mutex::new(std::fs::File::from(fd));
            builder.with_writer(writer).init();
            return;
        }
    }

    builder.with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(args) = parse_args().map_err(|err| Error::Config(err.to_string()))? else {
        print!("{HELP}");
        return Ok(());
    };

    init_tracing();

    let mut config: Config = config::load()?;
    if let Some(dir) = args.log_dir {
        config.log_directory = Some(dir);
    }
    if let Some(bytes) = args.max_size {
        config.max_log_size_bytes = Some(MaxLogSize::new(bytes).value());
    }

    let mut logger = DiagnosticsLogger::new(
        LoggerOptions::from_config(&config).with_app_version(APP_VERSION),
    );
    logger.setup()?;
    for message in &args.messages {
        journal_log!(logger, "{message}");
    }
    logger.flush()?;

    let insights_provider = ErrorPatternProvider::new()
        .with_rule(
            "Disk full",
            r"(?i)no space left on device",
            InsightResult::Error("The device ran out of storage while writing".into()),
        )
        .and_then(|provider| {
            provider.with_rule(
                "Permission problems",
                r"(?i)permission denied",
                InsightResult::Warn("Some files could not be accessed".into()),
            )
        })
        .map_err(|err| Error::Config(err.to_string()))?;

    let compiler = ReportCompiler::new()
        .with_app_name(APP_NAME)
        .with_filename(config.report_filename())
        .with_insight_timeout(config.insight_timeout())
        .with_insights_provider(insights_provider)
        .with_filter(IdentityRedactionFilter::new()?)
        .with_filter(PathRedactionFilter::new());

    let sections = vec![
        Section::reporter(GeneralInfoReporter::default()),
        Section::reporter(SystemMetadataReporter::new(APP_NAME, APP_VERSION)),
        Section::insights(InsightsReporter::new()),
        Section::reporter(LogsReporter::new(logger.handle())),
        Section::reporter(DirectoryTreeReporter::new([config.log_directory()])),
    ];
    let report = compiler.compile(sections).await;

    let output = args.output.unwrap_or_else(default_export_directory);
    std::fs::create_dir_all(&output)?;
    let path = report.save_to(&output)?;
    tracing::info!(path = %path.display(), bytes = report.data.len(), "Report written");

    logger.shutdown();
    println!("{}", path.display());
    Ok(())
}
