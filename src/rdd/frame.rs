use bson::{Bson, Document};
use log::debug;
use polars::{
    frame::DataFrame,
    io::SerReader,
    prelude::{IntoLazy, JsonReader, LazyFrame},
};

use crate::util::error::MrResult;

use super::common::Rdd;

impl Rdd<Document> {
    /// Collects every partition into one polars frame through relaxed extended JSON.
    pub fn to_frame(&self) -> MrResult<DataFrame> {
        if self.count() == 0 {
            return Ok(DataFrame::empty());
        }
        let inner = self
            .partitions()
            .iter()
            .flat_map(|p| p.rows().iter())
            .map(|d| Bson::Document(d.clone()).into_relaxed_extjson().to_string())
            .collect::<Vec<String>>()
            .join(", ");
        let json_to_parse = format!("[{}]", inner);
        debug!("rdd {}: building frame from {} documents", self.id(), self.count());
        let reader = JsonReader::new(std::io::Cursor::new(json_to_parse.into_bytes()));
        Ok(reader.finish()?)
    }

    pub fn to_lazy_frame(&self) -> MrResult<LazyFrame> {
        Ok(self.to_frame()?.lazy())
    }
}
