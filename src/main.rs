use bson::Document;
use log::{error, info};
use mongo_rdd::{
    config::common::{pack_configs_from_files, read_configs},
    connector::MongoEngineContext,
    context::conf::EngineConf,
    logger::registry::LoggerRegistry,
    mongo::{client::MongoClientConfig, reader::ReadSource},
    util::{
        args::ParallelizeArgs,
        common::{json_str_to_doc, json_str_to_pipeline},
        error::{MrError, MrResult},
    },
};

fn read_source(args: &ParallelizeArgs) -> MrResult<ReadSource> {
    match (&args.query, &args.pipeline) {
        (Some(_), Some(_)) => Err(MrError::ConfigError(
            "Conflicting arguments",
            "Pass either --query or --pipeline, not both".to_owned(),
        )),
        (Some(q), None) => Ok(ReadSource::Query(json_str_to_doc(q)?)),
        (None, Some(p)) => Ok(ReadSource::Pipeline(json_str_to_pipeline(p)?)),
        (None, None) => Ok(ReadSource::Collection),
    }
}

fn run(args: &ParallelizeArgs) -> MrResult<()> {
    let config_files = read_configs(&args.config_dir, &["yml", "yaml"])?;
    let mut pack = pack_configs_from_files(&config_files)?;
    let logger_reg = LoggerRegistry::from(&mut pack)?;
    let conf = EngineConf::from(&mut pack)?;
    let mongo_config = MongoClientConfig::from(&mut pack)?;
    let app_name = conf.app_name().unwrap_or(env!("CARGO_PKG_NAME")).to_owned();
    logger_reg.start(args.logger.as_deref(), &app_name, args.print_to_console)?;

    let source = read_source(args)?;
    let msc = MongoEngineContext::from_configs(conf, &mongo_config)?;
    let rdd = msc.parallelize_source::<Document>(args.partitions, source)?;
    info!(
        "{}: {} documents over {} partitions",
        msc.uri().namespace(),
        rdd.count(),
        rdd.num_partitions()
    );
    for partition in rdd.partitions() {
        info!("partition {}: {} documents", partition.index(), partition.len());
    }
    if args.print_to_console {
        println!("{:?}", rdd.to_frame()?);
    }
    msc.stop();
    Ok(())
}

fn main() {
    let args: ParallelizeArgs = argh::from_env();
    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
