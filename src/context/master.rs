use std::{fmt, str::FromStr};

use crate::util::error::{MrError, MrResult};

/// An in-process master: `local`, `local[N]` or `local[*]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Master {
    url: String,
    threads: usize,
}

impl Master {
    pub fn parse(url: &str) -> MrResult<Master> {
        let trimmed = url.trim();
        let threads = if trimmed == "local" {
            1
        } else if let Some(inner) = trimmed.strip_prefix("local[").and_then(|x| x.strip_suffix(']')) {
            match inner.trim() {
                "*" => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
                n => match n.parse::<usize>() {
                    Ok(threads) if threads > 0 => threads,
                    _ => {
                        return Err(MrError::ConfigError(
                            "Invalid master URL",
                            format!("Thread count in `{}` must be a positive integer or `*`", url),
                        ));
                    }
                },
            }
        } else {
            return Err(MrError::ConfigError(
                "Invalid master URL",
                format!(
                    "Could not parse master URL `{}`, expected one of `local`, `local[N]`, `local[*]`",
                    url
                ),
            ));
        };
        Ok(Master {
            url: trimmed.to_owned(),
            threads,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl FromStr for Master {
    type Err = MrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Master::parse(s)
    }
}

impl fmt::Display for Master {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
