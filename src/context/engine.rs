use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};

use crate::{
    rdd::{
        common::{Rdd, RddScope},
        slice::slice_rows,
    },
    util::error::{MrError, MrResult},
};

use super::{conf::EngineConf, master::Master};

/// In-process execution context. Hands out RDDs until stopped.
#[derive(Debug)]
pub struct EngineContext {
    conf: EngineConf,
    master: Master,
    app_name: String,
    app_id: String,
    start_time: DateTime<Utc>,
    default_parallelism: usize,
    rdd_scope: RddScope,
    stopped: AtomicBool,
}

impl EngineContext {
    pub fn new(conf: EngineConf) -> MrResult<EngineContext> {
        let master = match conf.master() {
            Some(x) => Master::parse(x)?,
            None => {
                return Err(MrError::ConfigError(
                    "Master not set",
                    "A master URL must be set in the engine configuration".to_owned(),
                ));
            }
        };
        let app_name = match conf.app_name() {
            Some(x) if !x.trim().is_empty() => x.to_owned(),
            _ => {
                return Err(MrError::ConfigError(
                    "Application name not set",
                    "An application name must be set in the engine configuration".to_owned(),
                ));
            }
        };
        let default_parallelism = conf.default_parallelism()?.unwrap_or(master.threads());
        let start_time = Utc::now();
        let app_id = format!("local-{}", start_time.timestamp_millis());
        info!(
            "Started engine context `{}` ({}) on master `{}` with default parallelism {}",
            &app_name, &app_id, &master, default_parallelism
        );
        for (key, value) in conf.entries() {
            debug!("{} = {}", key, value);
        }
        let rdd_scope = RddScope::new(master.threads());
        Ok(EngineContext {
            conf,
            master,
            app_name,
            app_id,
            start_time,
            default_parallelism,
            rdd_scope,
            stopped: AtomicBool::new(false),
        })
    }

    pub fn from_parts(master: &str, app_name: &str) -> MrResult<EngineContext> {
        let mut conf = EngineConf::new();
        conf.set_master(master).set_app_name(app_name);
        EngineContext::new(conf)
    }

    pub fn conf(&self) -> &EngineConf {
        &self.conf
    }

    pub fn master(&self) -> &Master {
        &self.master
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn uptime(&self) -> TimeDelta {
        Utc::now() - self.start_time
    }

    pub fn default_parallelism(&self) -> usize {
        self.default_parallelism
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn ensure_active(&self) -> MrResult<()> {
        if self.is_stopped() {
            return Err(MrError::ContextError(
                "Engine context stopped",
                format!("Cannot schedule work on stopped context `{}` ({})", &self.app_name, &self.app_id),
            ));
        }
        Ok(())
    }

    /// Distributes local rows over exactly `slices` contiguous partitions.
    pub fn parallelize<T>(&self, rows: Vec<T>, slices: usize) -> MrResult<Rdd<T>> {
        if slices == 0 {
            return Err(MrError::InvalidArgument(
                "partitions",
                "Number of partitions must be positive, received 0".to_owned(),
            ));
        }
        self.ensure_active()?;
        debug!("slicing {} rows into {} partitions", rows.len(), slices);
        Ok(Rdd::new(self.rdd_scope.clone(), slice_rows(rows, slices)))
    }

    /// Stops the context. Stopping twice is a no-op.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            info!(
                "Stopped engine context `{}` ({}) after {}ms",
                &self.app_name,
                &self.app_id,
                self.uptime().num_milliseconds()
            );
        }
    }
}
