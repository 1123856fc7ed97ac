use std::{
    fs::File,
    io::{BufRead, BufReader},
};

use anyhow::Context;
use env_logger::Env;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use crate::core::VisageOsc;

mod core;

fn main() -> anyhow::Result<()> {
    let logger = env_logger::Builder::from_env(Env::default().default_filter_or("info")).build();
    let level = logger.filter();
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger)
        .try_init()
        .context("installing logger")?;
    log::set_max_level(level);

    let input: Box<dyn BufRead + Send> = match std::env::args().nth(1) {
        Some(path) => Box::new(BufReader::new(
            File::open(&path).with_context(|| format!("opening {}", path))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    VisageOsc::new(multi)?.run(input)
}
