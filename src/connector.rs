use std::sync::Arc;

use bson::Document;
use log::{debug, info};
use serde::de::DeserializeOwned;

use crate::{
    config::common::ConfigPack,
    context::{conf::EngineConf, engine::EngineContext},
    mongo::{
        client::{HasMongoClient, MongoClient, MongoClientConfig},
        reader::{DocumentReader, MongoReader, ReadSource},
        uri::{IntoConnectionUri, MongoConnectionUri},
    },
    rdd::common::Rdd,
    util::error::{MrError, MrResult},
};

/// An engine context bound to one MongoDB collection.
///
/// Every constructor resolves to an [`EngineContext`] plus a connection URI
/// naming `database.collection`. The `parallelize*` family reads that
/// collection and distributes the rows as an [`Rdd`].
pub struct MongoEngineContext {
    sc: Arc<EngineContext>,
    uri: MongoConnectionUri,
    reader: Box<dyn DocumentReader>,
}

impl MongoEngineContext {
    pub fn from_conf<U: IntoConnectionUri>(conf: EngineConf, uri: U) -> MrResult<Self> {
        let uri = uri.into_connection_uri()?;
        MongoEngineContext::from_context(Arc::new(EngineContext::new(conf)?), uri)
    }

    pub fn from_context<U: IntoConnectionUri>(sc: Arc<EngineContext>, uri: U) -> MrResult<Self> {
        let uri = uri.into_connection_uri()?;
        let client = MongoClient::new(&uri, None)?;
        MongoEngineContext::bind(sc, uri, Box::new(MongoReader::new(client)))
    }

    pub fn with_master<U: IntoConnectionUri>(master: &str, app_name: &str, uri: U) -> MrResult<Self> {
        MongoEngineContext::with_master_conf(master, app_name, EngineConf::new(), uri)
    }

    /// `master` and `app_name` take precedence over the same keys in `conf`.
    pub fn with_master_conf<U: IntoConnectionUri>(
        master: &str,
        app_name: &str,
        mut conf: EngineConf,
        uri: U,
    ) -> MrResult<Self> {
        conf.set_master(master).set_app_name(app_name);
        MongoEngineContext::from_conf(conf, uri)
    }

    pub fn with_engine_home_jar<U: IntoConnectionUri>(
        master: &str,
        app_name: &str,
        engine_home: &str,
        jar_file: &str,
        uri: U,
    ) -> MrResult<Self> {
        MongoEngineContext::with_engine_home_jars(master, app_name, engine_home, &[jar_file], uri)
    }

    pub fn with_engine_home_jars<U: IntoConnectionUri, S: AsRef<str>>(
        master: &str,
        app_name: &str,
        engine_home: &str,
        jars: &[S],
        uri: U,
    ) -> MrResult<Self> {
        let mut conf = EngineConf::new();
        conf.set_master(master)
            .set_app_name(app_name)
            .set_engine_home(engine_home)
            .set_jars(jars);
        MongoEngineContext::from_conf(conf, uri)
    }

    /// Binds a custom reader instead of the mongo driver.
    pub fn with_reader<U: IntoConnectionUri>(
        sc: Arc<EngineContext>,
        uri: U,
        reader: Box<dyn DocumentReader>,
    ) -> MrResult<Self> {
        MongoEngineContext::bind(sc, uri.into_connection_uri()?, reader)
    }

    /// Builds from the `engine` and `mongo` config nodes, consuming both.
    pub fn from_config_pack(config_pack: &mut ConfigPack) -> MrResult<Self> {
        let conf = EngineConf::from(config_pack)?;
        let mongo_config = MongoClientConfig::from(config_pack)?;
        MongoEngineContext::from_configs(conf, &mongo_config)
    }

    /// Like [`MongoEngineContext::from_config_pack`] once the nodes are already parsed.
    pub fn from_configs(conf: EngineConf, mongo_config: &MongoClientConfig) -> MrResult<Self> {
        let sc = Arc::new(EngineContext::new(conf)?);
        let client = MongoClient::from_config(mongo_config)?;
        let uri = client.uri.clone();
        MongoEngineContext::bind(sc, uri, Box::new(MongoReader::new(client)))
    }

    fn bind(sc: Arc<EngineContext>, uri: MongoConnectionUri, reader: Box<dyn DocumentReader>) -> MrResult<Self> {
        info!("Bound engine context `{}` to {}", sc.app_name(), &uri);
        Ok(MongoEngineContext { sc, uri, reader })
    }

    /// Swaps the document source, keeping the engine context and URI.
    pub fn replace_reader(mut self, reader: Box<dyn DocumentReader>) -> Self {
        debug!("Replacing reader for {}", self.uri.namespace());
        self.reader = reader;
        self
    }

    pub fn sc(&self) -> &Arc<EngineContext> {
        &self.sc
    }

    pub fn uri(&self) -> &MongoConnectionUri {
        &self.uri
    }

    pub fn stop(&self) {
        self.sc.stop();
    }

    pub fn parallelize<T: DeserializeOwned>(&self) -> MrResult<Rdd<T>> {
        self.parallelize_source(None, ReadSource::Collection)
    }

    pub fn parallelize_with_partitions<T: DeserializeOwned>(&self, partitions: usize) -> MrResult<Rdd<T>> {
        self.parallelize_source(Some(partitions), ReadSource::Collection)
    }

    pub fn parallelize_with_query<T: DeserializeOwned>(&self, query: Document) -> MrResult<Rdd<T>> {
        self.parallelize_source(None, ReadSource::Query(query))
    }

    pub fn parallelize_with_partitions_and_query<T: DeserializeOwned>(
        &self,
        partitions: usize,
        query: Document,
    ) -> MrResult<Rdd<T>> {
        self.parallelize_source(Some(partitions), ReadSource::Query(query))
    }

    pub fn parallelize_with_pipeline<T: DeserializeOwned>(&self, pipeline: Vec<Document>) -> MrResult<Rdd<T>> {
        self.parallelize_source(None, ReadSource::Pipeline(pipeline))
    }

    pub fn parallelize_with_partitions_and_pipeline<T: DeserializeOwned>(
        &self,
        partitions: usize,
        pipeline: Vec<Document>,
    ) -> MrResult<Rdd<T>> {
        self.parallelize_source(Some(partitions), ReadSource::Pipeline(pipeline))
    }

    /// Reads `source` and splits it over `partitions`, or the default parallelism when `None`.
    ///
    /// The partition count and context state are checked before the reader is touched.
    pub fn parallelize_source<T: DeserializeOwned>(
        &self,
        partitions: Option<usize>,
        source: ReadSource,
    ) -> MrResult<Rdd<T>> {
        let slices = match partitions {
            Some(0) => {
                return Err(MrError::InvalidArgument(
                    "partitions",
                    format!(
                        "Number of partitions must be positive, received 0 for {}",
                        self.uri.namespace()
                    ),
                ));
            }
            Some(n) => n,
            None => self.sc.default_parallelism(),
        };
        self.sc.ensure_active()?;
        let documents = self.reader.read(&source)?;
        debug!(
            "deserializing {} documents from {} into rows",
            documents.len(),
            self.uri.namespace()
        );
        let rows = documents
            .into_iter()
            .map(bson::from_document::<T>)
            .collect::<Result<Vec<T>, _>>()?;
        self.sc.parallelize(rows, slices)
    }
}

impl HasMongoClient for MongoEngineContext {
    fn get_mongo_client(&self) -> Option<MongoClient> {
        self.reader.client().cloned()
    }

    fn get_mongo_syncdb(&self, dbname: Option<&str>) -> Option<mongodb::sync::Database> {
        self.reader.client().map(|c| c.database(dbname))
    }
}
