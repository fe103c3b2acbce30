use std::path::PathBuf;

use tracing::info;

use orienteering::common::logging;
use orienteering::{Field, FieldConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config = FieldConfig::load(parse_config_path(&args)?)?;

    let mut field = Field::new(&config)?;
    field.run_until(config.duration_ms);
    if config.replay {
        field.replay();
    }
    info!(now_ms = field.now_ms(), "field stopped");

    for node in field.report() {
        println!("{node}");
    }
    Ok(())
}

fn parse_config_path(args: &[String]) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return match args.next() {
                Some(path) => Ok(PathBuf::from(path)),
                None => Err("--config was provided without a path".into()),
            };
        }
    }
    Err("missing required --config <path> argument".into())
}
