use bson::Document;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::common::{ConfigPack, Configurable, parse_node_fields},
    util::error::{MrError, MrResult},
};

use super::uri::MongoConnectionUri;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MongoClientConfig {
    pub uri: String,
    pub batch_size: Option<u32>,
}

#[derive(Clone)]
pub struct MongoClient {
    pub sync_client: mongodb::sync::Client,
    pub uri: MongoConnectionUri,
    pub batch_size: Option<u32>,
}

pub trait HasMongoClient {
    fn get_mongo_client(&self) -> Option<MongoClient>;
    fn get_mongo_syncdb(&self, dbname: Option<&str>) -> Option<mongodb::sync::Database>;
}

impl MongoClientConfig {
    pub fn new(uri: &str, batch_size: Option<u32>) -> MongoClientConfig {
        MongoClientConfig {
            uri: uri.to_owned(),
            batch_size,
        }
    }

    pub fn from(config_pack: &mut ConfigPack) -> MrResult<MongoClientConfig> {
        let mut config = MongoClientConfig::default();
        config.extract_parse_config(config_pack)?;
        Ok(config)
    }

    pub fn parse_uri(&self) -> MrResult<MongoConnectionUri> {
        MongoConnectionUri::parse(&self.uri)
    }
}

impl Configurable for MongoClientConfig {
    fn get_node_name() -> &'static str {
        "mongo"
    }

    fn extract_parse_config(&mut self, config_pack: &mut ConfigPack) -> MrResult<()> {
        let fields = match config_pack.remove(MongoClientConfig::get_node_name()) {
            Some(x) => x,
            None => {
                return Err(MrError::ConfigError(
                    "Config not found: mongo",
                    "Please check for a top level node `mongo` with a `uri`".to_owned(),
                ));
            }
        };
        let config: MongoClientConfig = parse_node_fields(fields)?;
        if config.batch_size == Some(0) {
            return Err(MrError::ConfigError(
                "Invalid batch_size",
                "`mongo.batch_size` must be positive when set".to_owned(),
            ));
        }
        *self = config;
        Ok(())
    }
}

impl MongoClient {
    /// Builds the driver client. No server round trip happens until the first read.
    pub fn new(uri: &MongoConnectionUri, batch_size: Option<u32>) -> MrResult<MongoClient> {
        debug!("creating mongo client for {}", uri);
        Ok(MongoClient {
            sync_client: mongodb::sync::Client::with_uri_str(uri.driver_uri())?,
            uri: uri.clone(),
            batch_size,
        })
    }

    pub fn from_config(config: &MongoClientConfig) -> MrResult<MongoClient> {
        MongoClient::new(&config.parse_uri()?, config.batch_size)
    }

    pub fn database(&self, dbname: Option<&str>) -> mongodb::sync::Database {
        self.sync_client.database(dbname.unwrap_or(self.uri.database()))
    }

    /// The collection named by the connection URI.
    pub fn collection(&self) -> mongodb::sync::Collection<Document> {
        self.database(None).collection::<Document>(self.uri.collection())
    }
}

impl HasMongoClient for MongoClient {
    fn get_mongo_client(&self) -> Option<MongoClient> {
        Some(self.clone())
    }

    fn get_mongo_syncdb(&self, dbname: Option<&str>) -> Option<mongodb::sync::Database> {
        Some(self.database(dbname))
    }
}
