use bson::{Bson, Document};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};

use super::error::{MrError, MrResult};

pub type YamlValue = serde_yaml_ng::Value;

pub fn yaml_from_str(s: &str) -> MrResult<YamlValue> {
    Ok(serde_yaml_ng::from_str::<YamlValue>(s)?)
}

pub fn rng_str(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn get_utc_time_str_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, false)
}

pub fn json_str_to_doc(json_str: &str) -> MrResult<Document> {
    let json_val: serde_json::Value = serde_json::from_str(json_str)?;
    json_to_doc(json_val, json_str)
}

/// Parses a JSON array of stage objects, e.g. `[{"$project": {"a": 1}}]`.
pub fn json_str_to_pipeline(json_str: &str) -> MrResult<Vec<Document>> {
    let json_val: serde_json::Value = serde_json::from_str(json_str)?;
    match json_val {
        serde_json::Value::Array(stages) => stages
            .into_iter()
            .map(|stage| json_to_doc(stage, json_str))
            .collect(),
        _ => Err(MrError::BsonError(format!(
            "Pipeline must be a json array of stages: {}",
            json_str
        ))),
    }
}

fn json_to_doc(json_val: serde_json::Value, json_str: &str) -> MrResult<Document> {
    let trans_bson: Bson = json_val.try_into()?;
    match trans_bson.as_document() {
        Some(x) => Ok(x.to_owned()),
        None => Err(MrError::BsonError(format!("Json returned no bson document: {}", json_str))),
    }
}
