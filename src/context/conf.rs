use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::{
    config::common::{ConfigPack, Configurable, parse_node_fields},
    util::{
        common::YamlValue,
        error::{MrError, MrResult},
    },
};

pub const MASTER_KEY: &str = "engine.master";
pub const APP_NAME_KEY: &str = "engine.app.name";
pub const ENGINE_HOME_KEY: &str = "engine.home";
pub const JARS_KEY: &str = "engine.jars";
pub const DEFAULT_PARALLELISM_KEY: &str = "engine.default.parallelism";

/// Key/value configuration of an engine context. Setters chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConf {
    settings: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct EngineConfNode {
    master: Option<String>,
    app_name: Option<String>,
    engine_home: Option<String>,
    jars: Option<Vec<String>>,
    default_parallelism: Option<usize>,
    settings: Option<HashMap<String, YamlValue>>,
}

impl EngineConf {
    pub fn new() -> Self {
        EngineConf::default()
    }

    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.settings.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(|x| x.as_str())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.settings.remove(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_master(&mut self, master: &str) -> &mut Self {
        self.set(MASTER_KEY, master)
    }

    pub fn set_app_name(&mut self, app_name: &str) -> &mut Self {
        self.set(APP_NAME_KEY, app_name)
    }

    pub fn set_engine_home(&mut self, engine_home: &str) -> &mut Self {
        self.set(ENGINE_HOME_KEY, engine_home)
    }

    pub fn set_jars<S: AsRef<str>>(&mut self, jars: &[S]) -> &mut Self {
        let joined = jars
            .iter()
            .map(|x| x.as_ref().trim())
            .filter(|x| !x.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.set(JARS_KEY, &joined)
    }

    pub fn set_default_parallelism(&mut self, parallelism: usize) -> &mut Self {
        self.set(DEFAULT_PARALLELISM_KEY, &parallelism.to_string())
    }

    pub fn master(&self) -> Option<&str> {
        self.get(MASTER_KEY)
    }

    pub fn app_name(&self) -> Option<&str> {
        self.get(APP_NAME_KEY)
    }

    pub fn engine_home(&self) -> Option<&str> {
        self.get(ENGINE_HOME_KEY)
    }

    pub fn jars(&self) -> Vec<String> {
        self.get(JARS_KEY)
            .map(|x| {
                x.split(',')
                    .map(|jar| jar.trim())
                    .filter(|jar| !jar.is_empty())
                    .map(|jar| jar.to_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `None` when unset, an error when set to anything but a positive integer.
    pub fn default_parallelism(&self) -> MrResult<Option<usize>> {
        match self.get(DEFAULT_PARALLELISM_KEY) {
            None => Ok(None),
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(Some(n)),
                _ => Err(MrError::ConfigError(
                    "Invalid default parallelism",
                    format!("`{}` must be a positive integer, received `{}`", DEFAULT_PARALLELISM_KEY, raw),
                )),
            },
        }
    }

    pub fn from(config_pack: &mut ConfigPack) -> MrResult<EngineConf> {
        let mut conf = EngineConf::new();
        conf.extract_parse_config(config_pack)?;
        Ok(conf)
    }
}

fn setting_to_string(key: &str, value: &YamlValue) -> MrResult<String> {
    match value {
        YamlValue::String(s) => Ok(s.to_owned()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        other => Err(MrError::ConfigError(
            "Invalid engine setting",
            format!("Setting `{}` must be a scalar, received: {:?}", key, other),
        )),
    }
}

impl Configurable for EngineConf {
    fn get_node_name() -> &'static str {
        "engine"
    }

    fn extract_parse_config(&mut self, config_pack: &mut ConfigPack) -> MrResult<()> {
        let fields = config_pack.remove(EngineConf::get_node_name()).unwrap_or_default();
        if fields.is_empty() {
            return Ok(());
        }
        let node: EngineConfNode = parse_node_fields(fields)?;
        for (key, value) in node.settings.unwrap_or_default() {
            let value = setting_to_string(&key, &value)?;
            self.set(&key, &value);
        }
        if let Some(master) = &node.master {
            self.set_master(master);
        }
        if let Some(app_name) = &node.app_name {
            self.set_app_name(app_name);
        }
        if let Some(engine_home) = &node.engine_home {
            self.set_engine_home(engine_home);
        }
        if let Some(jars) = &node.jars {
            self.set_jars(jars.as_slice());
        }
        if let Some(parallelism) = node.default_parallelism {
            self.set_default_parallelism(parallelism);
        }
        Ok(())
    }
}
