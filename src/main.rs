#![deny(clippy::all)]
#![warn(clippy::pedantic)]

use anyhow::anyhow;
use log::info;

use transaction_forest::{Strategy, replay};

const STRATEGY_ENV_VAR: &str = "TRANSACTION_FOREST_STRATEGY";

// The command line wins over the environment; neither set means the default.
fn strategy_from(arg: Option<String>) -> anyhow::Result<Strategy> {
    let configured = arg.or_else(|| std::env::var(STRATEGY_ENV_VAR).ok());
    match configured {
        Some(value) => Ok(value.parse()?),
        None => Ok(Strategy::default()),
    }
}

fn main() -> anyhow::Result<()> {
    // Since the executable name is always the first argument, we must skip to
    // the second one (which is the first "real" user-specified arg) to get the file name.
    let mut args = std::env::args().skip(1);
    let input_file_path = args
        .next()
        .ok_or_else(|| anyhow!("No input file path specified"))?;
    let strategy = strategy_from(args.next())?;

    let mut reader = replay::reader_builder().from_path(&input_file_path)?;
    info!("Reading requests from {input_file_path} using the {strategy} service");

    let service = strategy.build();
    let rows = {
        let stdout = std::io::stdout();
        let stdio = stdout.lock();
        let mut writer = csv::Writer::from_writer(stdio);
        replay::replay(service.as_ref(), &mut reader, &mut writer)?
    };

    info!("Replayed {rows} request(s)");
    Ok(())
}
