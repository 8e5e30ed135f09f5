use std::{collections::BTreeMap, fs, path::PathBuf};

use fern::colors::{Color, ColoredLevelConfig};
use serde::Deserialize;

use crate::util::{
    common::get_utc_time_str_now,
    error::{MrError, MrResult},
};

pub const CONSOLE_LOGGER_LABEL: &str = "console";
const FALLBACK_FILE_STEM: &str = "mongo_rdd";
const FILE_DATE_SUFFIX: &str = "%Y-%m-%d.log";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// One named entry of the `logger` node.
///
/// ```yaml
/// logger:
///   default:
///     level: info
///     dir: /var/log/mongo_rdd
///     targets:
///       mongodb: warn
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Logger {
    #[serde(skip)]
    pub label: String,
    #[serde(default)]
    pub level: LogLevel,
    /// Daily files `<dir>/<app>_<date>.log`. Absent means console only.
    pub dir: Option<PathBuf>,
    /// Per-target overrides of `level`, keyed by module path prefix.
    #[serde(default)]
    pub targets: BTreeMap<String, LogLevel>,
}

/// File-safe form of an application name.
fn file_stem(app_name: &str) -> String {
    let stem = app_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>();
    if stem.is_empty() { FALLBACK_FILE_STEM.to_owned() } else { stem }
}

impl Logger {
    pub fn console(level: LogLevel) -> Self {
        Logger {
            label: CONSOLE_LOGGER_LABEL.to_owned(),
            level,
            ..Default::default()
        }
    }

    pub fn file_prefix(&self, app_name: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{}_", file_stem(app_name))))
    }

    /// Builds the dispatch for `app_name` without installing it. Creates the log dir if needed.
    pub fn dispatch(&self, app_name: &str, to_console: bool) -> MrResult<fern::Dispatch> {
        let colors = ColoredLevelConfig::new()
            .trace(Color::Blue)
            .debug(Color::Magenta)
            .info(Color::BrightGreen)
            .warn(Color::BrightYellow)
            .error(Color::Red);
        let app = app_name.to_owned();
        let mut dispatch = fern::Dispatch::new()
            .level(self.level.into())
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "[{} {} {} {}] {}",
                    get_utc_time_str_now(),
                    colors.color(record.level()),
                    app,
                    record.target(),
                    message
                ))
            });
        for (target, level) in &self.targets {
            dispatch = dispatch.level_for(target.clone(), (*level).into());
        }
        match (&self.dir, self.file_prefix(app_name)) {
            (Some(dir), Some(prefix)) => {
                fs::create_dir_all(dir)?;
                if to_console {
                    dispatch = dispatch.chain(std::io::stdout());
                }
                Ok(dispatch.chain(fern::DateBased::new(prefix, FILE_DATE_SUFFIX).utc_time()))
            }
            _ => Ok(dispatch.chain(std::io::stdout())),
        }
    }

    /// Installs this logger as the global `log` backend. Only the first call per process succeeds.
    pub fn start(&self, app_name: &str, to_console: bool) -> MrResult<()> {
        self.dispatch(app_name, to_console)?.apply().map_err(|e| {
            MrError::ComponentError(
                "Logger",
                format!("Failed to start logger `{}` for `{}`: {}", &self.label, app_name, e),
            )
        })
    }
}
