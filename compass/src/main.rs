use std::path::PathBuf;

use tracing::info;

use common::hal::simulator::{spawn_console, SimClock, SimEther, SimHardware};
use common::{logging, NodeConfig, NodeController};
use compass::Compass;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config = NodeConfig::load(parse_config_path(&args)?)?;
    let role = Compass::from_config(&config)?;
    info!(id = %role.id(), course = %role.course(), "compass (simulator)");

    let ether = SimEther::new();
    let mut hardware = SimHardware::new(&ether, SimClock::realtime());
    spawn_console(hardware.controls());

    let mut node = NodeController::new(role);
    node.start(&mut hardware, &config.radio)?;
    node.run(&mut hardware)
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
