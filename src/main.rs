use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};

use gcode_replay::config::Config;
use gcode_replay::profile;
use gcode_replay::sim::Processor;
use gcode_replay::stream::LineIterator;

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_args_and_env()?;

    let machine = profile::resolve(config.profile.as_deref(), &config.profile_dirs)?;
    log::info!("Replaying {:?} against profile '{}'", config.file, machine.name);

    let file = File::open(&config.file)
        .with_context(|| format!("failed to open program {:?}", config.file))?;

    let mut processor = Processor::new(machine);
    for line in LineIterator::new(BufReader::new(file)) {
        processor.run_line(&line);
    }

    let summary = processor.summary();
    let json = if config.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{}", json);

    Ok(())
}
