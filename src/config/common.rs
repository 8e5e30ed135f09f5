use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;

use crate::util::{
    common::YamlValue,
    error::{MrError, MrResult},
};

pub type ConfigPack = HashMap<String, HashMap<String, YamlValue>>;

pub trait Configurable {
    fn get_node_name() -> &'static str;
    fn extract_parse_config(&mut self, config_pack: &mut ConfigPack) -> MrResult<()>;
}

pub trait YamlRead {
    fn to_str_map(&self) -> MrResult<HashMap<String, YamlValue>>;
}

impl YamlRead for YamlValue {
    fn to_str_map(&self) -> MrResult<HashMap<String, YamlValue>> {
        let mapping = match self {
            YamlValue::Mapping(map) => map,
            value => {
                return Err(MrError::ConfigError(
                    "Not a mapping",
                    format!("Expected a mapping inside node block, received: {:?}", value),
                ));
            }
        };
        let mut out = HashMap::new();
        for (key, value) in mapping {
            match key.as_str() {
                Some(k) => {
                    out.insert(k.to_owned(), value.clone());
                }
                None => {
                    return Err(MrError::ConfigError(
                        "Invalid key",
                        format!("Config keys must be strings, received: {:?}", key),
                    ));
                }
            }
        }
        Ok(out)
    }
}

pub fn read_configs(dir: &str, file_exts: &[&str]) -> MrResult<Vec<PathBuf>> {
    let paths = std::fs::read_dir(dir)?
        .filter_map(|res| res.ok())
        .map(|dir_entry| dir_entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| file_exts.contains(&ext))
        })
        .collect();

    Ok(paths)
}

pub fn pack_configs_from_files<P: AsRef<Path>>(paths: &[P]) -> MrResult<ConfigPack> {
    let mut config_pack: ConfigPack = HashMap::new();

    for path in paths {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let yaml_root: YamlValue = serde_yaml_ng::from_reader(reader)?;
        pack_configurables(&mut config_pack, yaml_root)?;
    }

    Ok(config_pack)
}

pub fn pack_configurables(config_pack: &mut ConfigPack, yaml_root: YamlValue) -> MrResult<()> {
    let top_level_map = yaml_root.to_str_map()?;
    for (configurable_name, value) in top_level_map {
        let node_fields = value.to_str_map()?;
        match config_pack.entry(configurable_name) {
            std::collections::hash_map::Entry::Occupied(mut oe) => {
                oe.get_mut().extend(node_fields);
            }
            std::collections::hash_map::Entry::Vacant(ve) => {
                ve.insert(node_fields);
            }
        };
    }
    Ok(())
}

/// Rebuilds the fields of a packed node into a single mapping and deserializes it.
pub fn parse_node_fields<T: DeserializeOwned>(fields: HashMap<String, YamlValue>) -> MrResult<T> {
    let mapping = fields
        .into_iter()
        .map(|(k, v)| (YamlValue::String(k), v))
        .collect::<serde_yaml_ng::Mapping>();
    Ok(serde_yaml_ng::from_value::<T>(YamlValue::Mapping(mapping))?)
}
