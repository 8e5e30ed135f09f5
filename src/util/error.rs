use polars::error::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MrError {
    #[error("ERROR [COMPONENT >> {0}]: {1}")]
    ComponentError(&'static str, String),
    #[error("ERROR [CONFIG >> {0}]: {1}")]
    ConfigError(&'static str, String),
    #[error("ERROR [CONTEXT >> {0}]: {1}")]
    ContextError(&'static str, String),
    #[error("ERROR [INVALID ARGUMENT >> {0}]: {1}")]
    InvalidArgument(&'static str, String),
    #[error("ERROR [TASK >> {0}]: {1}")]
    TaskError(&'static str, String),
    #[error("ERROR [MongoDB]: {0}")]
    MongoError(String),
    #[error("ERROR [BSON]: {0}")]
    BsonError(String),
    #[error("ERROR [JSON]: {0}")]
    JsonError(String),
    #[error("ERROR [TABLE]: {0}")]
    TableError(PolarsError),
    #[error("ERROR [_raw_]: {0}")]
    RawError(std::io::Error),
}

impl From<mongodb::error::Error> for MrError {
    fn from(value: mongodb::error::Error) -> Self {
        Self::MongoError(value.to_string())
    }
}

impl From<bson::de::Error> for MrError {
    fn from(value: bson::de::Error) -> Self {
        Self::BsonError(value.to_string())
    }
}

impl From<bson::extjson::de::Error> for MrError {
    fn from(value: bson::extjson::de::Error) -> Self {
        Self::BsonError(value.to_string())
    }
}

impl From<serde_json::Error> for MrError {
    fn from(value: serde_json::Error) -> Self {
        Self::JsonError(value.to_string())
    }
}

impl From<serde_yaml_ng::Error> for MrError {
    fn from(value: serde_yaml_ng::Error) -> Self {
        Self::ConfigError("YML Parsing Error", value.to_string())
    }
}

impl From<PolarsError> for MrError {
    fn from(value: PolarsError) -> Self {
        Self::TableError(value)
    }
}

impl From<std::io::Error> for MrError {
    fn from(value: std::io::Error) -> Self {
        Self::RawError(value)
    }
}

pub type MrResult<T, E = MrError> = std::result::Result<T, E>;
