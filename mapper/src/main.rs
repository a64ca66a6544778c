use anyhow::{Context, Result};
use log::{info, warn};
use mapper::{config::Config, load_records, MapperInit, Sample};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use std::{env, path::PathBuf};
use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
/// Map dataset records into augmented samples and report a summary.
struct Args {
    #[structopt(long, default_value = "mapper.json5")]
    /// configuration file
    pub config_file: PathBuf,
    #[structopt(long)]
    /// JSON file with an array of dataset records
    pub records: PathBuf,
    #[structopt(long)]
    /// map in inference mode
    pub eval: bool,
    #[structopt(long)]
    /// base seed for reproducible augmentation
    pub seed: Option<u64>,
}

fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let Args {
        config_file,
        records,
        eval,
        seed,
    } = Args::from_args();

    let config = Config::open(&config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))?;
    let mapper = MapperInit::from_config(&config, !eval)?.build()?;
    let records = load_records(&records)?;
    info!("loaded {} records", records.len());

    let results: Vec<Result<Sample>> = records
        .par_iter()
        .enumerate()
        .map(|(index, record)| match seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
                mapper.map_with_rng(record, &mut rng)
            }
            None => mapper.map(record),
        })
        .collect();

    let mut num_failed = 0;
    let mut num_instances = 0;
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(sample) => {
                let [h, w] = sample.image_size().hw();
                let count = sample.instances.as_ref().map_or(0, |instances| instances.len());
                num_instances += count;
                info!(
                    "#{}: {}x{} image, {} instances, ann_type {:?}, not_full_labeled {}",
                    index, h, w, count, sample.ann_type, sample.not_full_labeled
                );
            }
            Err(err) => {
                num_failed += 1;
                warn!("#{}: {:#}", index, err);
            }
        }
    }

    info!(
        "mapped {} records, {} failed, {} instances in total",
        records.len(),
        num_failed,
        num_instances
    );

    Ok(())
}
