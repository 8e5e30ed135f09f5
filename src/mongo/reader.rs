use bson::{Document, doc};
use log::{debug, info};

use crate::util::error::MrResult;

use super::client::MongoClient;

/// What to pull from the bound collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadSource {
    Collection,
    Query(Document),
    Pipeline(Vec<Document>),
}

impl ReadSource {
    pub fn describe(&self) -> String {
        match self {
            ReadSource::Collection => "all documents".to_owned(),
            ReadSource::Query(q) => format!("query {}", q),
            ReadSource::Pipeline(p) => format!("pipeline of {} stages", p.len()),
        }
    }
}

pub trait DocumentReader: Send + Sync {
    fn read(&self, source: &ReadSource) -> MrResult<Vec<Document>>;

    /// The driver handle behind this reader, if any.
    fn client(&self) -> Option<&MongoClient> {
        None
    }
}

pub struct MongoReader {
    client: MongoClient,
}

impl MongoReader {
    pub fn new(client: MongoClient) -> Self {
        MongoReader { client }
    }
}

impl DocumentReader for MongoReader {
    fn read(&self, source: &ReadSource) -> MrResult<Vec<Document>> {
        let collection = self.client.collection();
        debug!("reading {} from {}", source.describe(), self.client.uri.namespace());
        let cursor = match source {
            ReadSource::Collection | ReadSource::Query(_) => {
                let filter = match source {
                    ReadSource::Query(q) => q.clone(),
                    _ => doc! {},
                };
                let mut find = collection.find(filter);
                if let Some(n) = self.client.batch_size {
                    find = find.batch_size(n);
                }
                find.run()?
            }
            ReadSource::Pipeline(stages) => {
                let mut aggregate = collection.aggregate(stages.clone());
                if let Some(n) = self.client.batch_size {
                    aggregate = aggregate.batch_size(n);
                }
                aggregate.run()?
            }
        };
        let documents = cursor.collect::<Result<Vec<Document>, _>>()?;
        info!(
            "read {} documents from {} ({})",
            documents.len(),
            self.client.uri.namespace(),
            source.describe()
        );
        Ok(documents)
    }

    fn client(&self) -> Option<&MongoClient> {
        Some(&self.client)
    }
}
