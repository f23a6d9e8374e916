use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

const DEFAULT_LOG_FILTER: &str = "warn,parley=info";
const DEFAULT_LOG_FILE_PATH: &str = "logs/parley.log";

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogOutput {
    Stderr,
    File,
    Both,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogSettings {
    format: LogFormat,
    output: LogOutput,
    file_path: PathBuf,
}

impl LogSettings {
    fn from_env() -> Self {
        Self::from_vars(
            env::var("LOG_FORMAT").ok().as_deref(),
            env::var("LOG_OUTPUT").ok().as_deref(),
            env::var("LOG_FILE_PATH").ok().as_deref(),
        )
    }

    fn from_vars(format: Option<&str>, output: Option<&str>, file_path: Option<&str>) -> Self {
        let format = match format.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let output = match output.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
            Some("file") => LogOutput::File,
            Some("both") => LogOutput::Both,
            _ => LogOutput::Stderr,
        };
        let file_path = file_path
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_PATH));

        Self {
            format,
            output,
            file_path,
        }
    }
}

fn env_filter_from_env() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

// Synchronous rolling writer; the appender locks internally, and a CLI that
// exits right after its last event must not leave lines in a buffer.
fn build_file_writer(path: &Path) -> std::io::Result<RollingFileAppender> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| std::ffi::OsStr::new("parley.log"));

    fs::create_dir_all(dir)?;
    Ok(tracing_appender::rolling::daily(dir, file_name))
}

fn init_with_writer(format: LogFormat, writer: BoxMakeWriter) -> InitResult {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter_from_env())
        .with_writer(writer);
    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}

fn init_from_settings(settings: &LogSettings) -> InitResult {
    match settings.output {
        LogOutput::Stderr => {
            init_with_writer(settings.format, BoxMakeWriter::new(std::io::stderr))
        }
        LogOutput::File | LogOutput::Both => match build_file_writer(&settings.file_path) {
            Ok(file_writer) => {
                let writer = if settings.output == LogOutput::Both {
                    BoxMakeWriter::new(std::io::stderr.and(file_writer))
                } else {
                    BoxMakeWriter::new(file_writer)
                };
                init_with_writer(settings.format, writer)
            }
            Err(err) => {
                eprintln!(
                    "parley: failed to open log file '{}': {}; logging to stderr instead",
                    settings.file_path.display(),
                    err
                );
                init_with_writer(settings.format, BoxMakeWriter::new(std::io::stderr))
            }
        },
    }
}

pub fn init() {
    let _ = init_from_settings(&LogSettings::from_env());
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{DEFAULT_LOG_FILE_PATH, LogFormat, LogOutput, LogSettings};

    #[test]
    fn settings_default_to_pretty_stderr() {
        let settings = LogSettings::from_vars(None, None, None);
        assert_eq!(settings.format, LogFormat::Pretty);
        assert_eq!(settings.output, LogOutput::Stderr);
        assert_eq!(settings.file_path, PathBuf::from(DEFAULT_LOG_FILE_PATH));
    }

    #[test]
    fn settings_accept_json_format() {
        let settings = LogSettings::from_vars(Some(" JSON "), None, None);
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn settings_fall_back_for_unknown_format() {
        let settings = LogSettings::from_vars(Some("xml"), None, None);
        assert_eq!(settings.format, LogFormat::Pretty);
    }

    #[test]
    fn settings_accept_file_and_both_outputs() {
        assert_eq!(
            LogSettings::from_vars(None, Some("file"), None).output,
            LogOutput::File
        );
        assert_eq!(
            LogSettings::from_vars(None, Some(" BOTH "), None).output,
            LogOutput::Both
        );
        assert_eq!(
            LogSettings::from_vars(None, Some("syslog"), None).output,
            LogOutput::Stderr
        );
    }

    #[test]
    fn settings_preserve_explicit_file_path() {
        let settings = LogSettings::from_vars(None, None, Some("custom/parley.log"));
        assert_eq!(settings.file_path, PathBuf::from("custom/parley.log"));
    }

    #[test]
    fn settings_use_default_path_for_blank_value() {
        let settings = LogSettings::from_vars(None, None, Some("  "));
        assert_eq!(settings.file_path, PathBuf::from(DEFAULT_LOG_FILE_PATH));
    }
}
