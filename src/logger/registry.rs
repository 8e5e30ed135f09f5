use std::collections::HashMap;

use crate::{
    config::common::{ConfigPack, Configurable},
    util::error::{MrError, MrResult},
};

use super::common::{LogLevel, Logger};

pub const DEFAULT_LOGGER_NAME: &str = "default";

#[derive(Debug, Default)]
pub struct LoggerRegistry {
    registry: HashMap<String, Logger>,
}

impl LoggerRegistry {
    pub fn new() -> LoggerRegistry {
        LoggerRegistry {
            registry: HashMap::new(),
        }
    }

    pub fn from(config_pack: &mut ConfigPack) -> MrResult<LoggerRegistry> {
        let mut reg = LoggerRegistry::new();
        reg.extract_parse_config(config_pack)?;
        Ok(reg)
    }

    pub fn get_logger(&self, name: &str) -> Option<&Logger> {
        self.registry.get(name)
    }

    /// A requested name must be configured. Without one, `default` is used if present,
    /// otherwise an info-level console logger.
    pub fn resolve(&self, name: Option<&str>) -> MrResult<Logger> {
        match name {
            Some(name) => self.registry.get(name).cloned().ok_or_else(|| {
                let mut known = self.registry.keys().collect::<Vec<_>>();
                known.sort();
                MrError::ComponentError(
                    "No Logger Found",
                    format!("No logger `{}` found, logger must be one of the following: {:?}", name, known),
                )
            }),
            None => Ok(self
                .registry
                .get(DEFAULT_LOGGER_NAME)
                .cloned()
                .unwrap_or_else(|| Logger::console(LogLevel::Info))),
        }
    }

    /// Resolves and installs the logger, tagging every line with `app_name`.
    pub fn start(&self, name: Option<&str>, app_name: &str, to_console: bool) -> MrResult<()> {
        self.resolve(name)?.start(app_name, to_console)
    }
}

impl Configurable for LoggerRegistry {
    fn get_node_name() -> &'static str {
        "logger"
    }

    fn extract_parse_config(&mut self, config_pack: &mut ConfigPack) -> MrResult<()> {
        let configs = config_pack.remove(LoggerRegistry::get_node_name()).unwrap_or_default();
        for (config_name, node) in configs {
            let mut logger = serde_yaml_ng::from_value::<Logger>(node)
                .map_err(|e| MrError::ConfigError("config.logger", format!("Logger {}: {}", config_name, e)))?;
            logger.label = config_name.clone();
            self.registry.insert(config_name, logger);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::PathBuf};

    use crate::{
        config::common::pack_configurables,
        logger::common::{CONSOLE_LOGGER_LABEL, LogLevel},
        util::common::yaml_from_str,
    };

    use super::LoggerRegistry;

    fn registry(yaml: &str) -> LoggerRegistry {
        let mut config_pack = HashMap::new();
        pack_configurables(&mut config_pack, yaml_from_str(yaml).unwrap()).unwrap();
        let reg = LoggerRegistry::from(&mut config_pack).unwrap();
        assert!(config_pack.is_empty());
        reg
    }

    #[test]
    fn valid_logger_registry() {
        let reg = registry(
            "
logger:
    default:
        level: warn
    file:
        level: debug
        dir: /tmp/mongo_rdd
        targets:
            mongodb: error
",
        );
        let default = reg.get_logger("default").unwrap();
        assert_eq!(default.label, "default");
        assert_eq!(default.level, LogLevel::Warn);
        assert_eq!(default.file_prefix("testApp"), None);
        let file = reg.get_logger("file").unwrap();
        assert_eq!(file.file_prefix("testApp").unwrap(), PathBuf::from("/tmp/mongo_rdd/testApp_"));
        assert_eq!(file.targets.get("mongodb"), Some(&LogLevel::Error));
    }

    #[test]
    fn valid_resolve_prefers_configured_default() {
        let reg = registry("logger:\n    default:\n        level: debug\n    quiet:\n        level: off\n");
        let resolved = reg.resolve(None).unwrap();
        assert_eq!(resolved.label, "default");
        assert_eq!(resolved.level, LogLevel::Debug);
        assert_eq!(reg.resolve(Some("quiet")).unwrap().level, LogLevel::Off);
    }

    #[test]
    fn valid_resolve_console_fallback() {
        let resolved = LoggerRegistry::new().resolve(None).unwrap();
        assert_eq!(resolved.label, CONSOLE_LOGGER_LABEL);
        assert_eq!(resolved.level, LogLevel::Info);
        assert_eq!(resolved.dir, None);
    }

    #[test]
    fn invalid_unknown_logger() {
        let reg = registry("logger:\n    default:\n        level: info\n");
        let err = reg.resolve(Some("missing")).unwrap_err();
        assert!(err.to_string().contains("missing"));
        assert!(LoggerRegistry::new().start(Some("missing"), "testApp", false).is_err());
    }

    #[test]
    fn invalid_logger_level() {
        let mut config_pack = HashMap::new();
        pack_configurables(
            &mut config_pack,
            yaml_from_str("logger:\n    default:\n        level: loud\n").unwrap(),
        )
        .unwrap();
        assert!(LoggerRegistry::from(&mut config_pack).is_err());
    }
}
