use argh::FromArgs;

#[derive(FromArgs)]
#[argh(description = "parallelize a mongodb collection into a partitioned rdd")]
pub struct ParallelizeArgs {
    #[argh(option, short = 'c', description = "directory for input configs")]
    pub config_dir: String,

    #[argh(option, short = 'q', description = "json query document restricting the read")]
    pub query: Option<String>,

    #[argh(option, short = 'p', description = "json array of aggregation stages")]
    pub pipeline: Option<String>,

    #[argh(option, short = 'n', description = "number of partitions to split into")]
    pub partitions: Option<usize>,

    #[argh(option, short = 'l', description = "name of configured logger to start")]
    pub logger: Option<String>,

    #[argh(switch, short = 'o', description = "print output to console")]
    pub print_to_console: bool,
}
