//! Field simulation: a whole game on one simulated ether.
//!
//! Every node gets its own virtual clock. The runner always ticks the node
//! whose clock is furthest behind, so frames are delivered in time order and
//! a run is fully deterministic. Zones stand in for radio range: a node only
//! hears nodes in the same zone, and compasses walk between zones along a
//! timed route.
//!
//! ```toml
//! duration_ms = 30000
//!
//! [[flag]]
//! id = "A"
//! courses = ["1", "2"]
//! zone = 1
//!
//! [[compass]]
//! id = "BLUE"
//! course = "1"
//! route = [{ at_ms = 0, zone = 1 }, { at_ms = 10000, zone = 2 }]
//! ```

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::Path;

use embedded_hal::blocking::delay::DelayMs;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use common::hal::simulator::{SimClock, SimControls, SimEther, SimHardware};
use common::node::ERROR_BACKOFF_MS;
use common::{
    ConfigError, Course, EncounterLedger, EncounterRecord, HalError, NodeConfig, NodeController,
    NodeId, ProducerKind, RadioSettings, Role, Timing,
};
use compass::{Compass, CompassMode};
use flag::Flag;

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("cannot read field file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid field file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("node {id}: {source}")]
    Node { id: String, source: ConfigError },
    #[error("node id {0} is used more than once")]
    DuplicateId(String),
    #[error("field has no nodes")]
    Empty,
    #[error("radio failed to start: {0}")]
    Hal(#[from] HalError),
}

fn default_duration() -> u64 {
    60_000
}

fn default_true() -> bool {
    true
}

/// A whole game: shared radio and timing settings plus every node.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// Simulated time to run before the report
    #[serde(default = "default_duration")]
    pub duration_ms: u64,
    /// Replay every compass ledger on its display at the end
    #[serde(default)]
    pub replay: bool,
    #[serde(default)]
    pub radio: RadioSettings,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default, rename = "flag")]
    pub flags: Vec<FlagSite>,
    #[serde(default, rename = "compass")]
    pub compasses: Vec<CompassWalker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlagSite {
    pub id: NodeId,
    pub courses: Vec<Course>,
    #[serde(default)]
    pub zone: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompassWalker {
    pub id: NodeId,
    pub course: Course,
    /// Start in `Scan` rather than `Navigate`
    #[serde(default = "default_true")]
    pub scanning: bool,
    #[serde(default)]
    pub route: Vec<Waypoint>,
}

/// Move to `zone` once the node's clock reaches `at_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Waypoint {
    pub at_ms: u64,
    pub zone: u32,
}

impl FieldConfig {
    pub fn from_toml(text: &str) -> Result<Self, FieldError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FieldError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    fn node_config(&self, id: &NodeId, courses: &[Course]) -> Result<NodeConfig, FieldError> {
        let mut config = NodeConfig::new(id.clone(), courses).map_err(|source| FieldError::Node {
            id: id.to_string(),
            source,
        })?;
        config.radio = self.radio;
        config.timing = self.timing;
        config.validate().map_err(|source| FieldError::Node {
            id: id.to_string(),
            source,
        })?;
        Ok(config)
    }
}

/// One simulated node and its board.
struct Station<R: Role> {
    node: NodeController<R>,
    hw: SimHardware,
    controls: SimControls,
    route: VecDeque<Waypoint>,
}

impl<R: Role> Station<R> {
    fn new(
        role: R,
        ether: &SimEther,
        radio: &RadioSettings,
        mut route: Vec<Waypoint>,
    ) -> Result<Self, HalError> {
        let mut hw = SimHardware::new(ether, SimClock::virtual_time());
        let controls = hw.controls();
        let mut node = NodeController::new(role);
        node.start(&mut hw, radio)?;
        route.sort_by_key(|waypoint| waypoint.at_ms);
        Ok(Self {
            node,
            hw,
            controls,
            route: route.into(),
        })
    }

    fn now_ms(&self) -> u64 {
        self.hw.now_ms()
    }

    fn step(&mut self) {
        let now = self.now_ms();
        while let Some(waypoint) = self.route.front().copied() {
            if waypoint.at_ms > now {
                break;
            }
            debug!(at_ms = now, zone = waypoint.zone, "moved");
            self.controls.move_to(waypoint.zone);
            self.route.pop_front();
        }

        if let Err(error) = self.node.tick(&mut self.hw) {
            warn!(%error, "tick failed");
            self.hw.delay_ms(ERROR_BACKOFF_MS);
        }
        // a tick with zero pauses would stall the scheduler
        if self.now_ms() == now {
            self.hw.delay_ms(1);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Flag(usize),
    Compass(usize),
}

/// Ledger of one node at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub kind: ProducerKind,
    pub id: NodeId,
    pub encounters: Vec<EncounterRecord>,
}

impl fmt::Display for NodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ProducerKind::Flag => "flag",
            ProducerKind::Compass => "compass",
        };
        write!(f, "{kind} {}:", self.id)?;
        if self.encounters.is_empty() {
            return write!(f, " -");
        }
        for record in &self.encounters {
            write!(f, " {}/{}", record.course, record.peer)?;
        }
        Ok(())
    }
}

pub struct Field {
    flags: Vec<Station<Flag>>,
    compasses: Vec<Station<Compass>>,
    steps: u64,
}

impl Field {
    pub fn new(config: &FieldConfig) -> Result<Self, FieldError> {
        if config.flags.is_empty() && config.compasses.is_empty() {
            return Err(FieldError::Empty);
        }
        let mut seen = HashSet::new();
        let ids = config
            .flags
            .iter()
            .map(|site| &site.id)
            .chain(config.compasses.iter().map(|walker| &walker.id));
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(FieldError::DuplicateId(id.to_string()));
            }
        }

        let ether = SimEther::new();

        let mut flags = Vec::with_capacity(config.flags.len());
        for site in &config.flags {
            let node_config = config.node_config(&site.id, &site.courses)?;
            let role = Flag::from_config(&node_config).map_err(|source| FieldError::Node {
                id: site.id.to_string(),
                source,
            })?;
            let station = Station::new(role, &ether, &config.radio, Vec::new())?;
            station.controls.move_to(site.zone);
            flags.push(station);
        }

        let mut compasses = Vec::with_capacity(config.compasses.len());
        for walker in &config.compasses {
            let node_config = config.node_config(&walker.id, &[walker.course])?;
            let role = Compass::from_config(&node_config).map_err(|source| FieldError::Node {
                id: walker.id.to_string(),
                source,
            })?;
            let station = Station::new(role, &ether, &config.radio, walker.route.clone())?;
            if walker.scanning {
                station.controls.press_a();
            }
            compasses.push(station);
        }

        info!(
            flags = flags.len(),
            compasses = compasses.len(),
            "field ready"
        );
        Ok(Self {
            flags,
            compasses,
            steps: 0,
        })
    }

    fn next_slot(&self) -> Option<(Slot, u64)> {
        let flags = self
            .flags
            .iter()
            .enumerate()
            .map(|(i, station)| (Slot::Flag(i), station.now_ms()));
        let compasses = self
            .compasses
            .iter()
            .enumerate()
            .map(|(i, station)| (Slot::Compass(i), station.now_ms()));
        // ties go to the earlier station, flags first
        flags.chain(compasses).min_by_key(|(_, now)| *now)
    }

    fn step(&mut self, slot: Slot) {
        self.steps += 1;
        match slot {
            Slot::Flag(i) => self.flags[i].step(),
            Slot::Compass(i) => self.compasses[i].step(),
        }
    }

    /// Tick nodes until every clock has reached `until_ms`.
    pub fn run_until(&mut self, until_ms: u64) {
        while let Some((slot, now)) = self.next_slot() {
            if now >= until_ms {
                break;
            }
            self.step(slot);
        }
        debug!(until_ms, steps = self.steps, "run finished");
    }

    /// Press B on every compass and run until each has shown its whole
    /// ledger and gone back to navigating.
    pub fn replay(&mut self) {
        let started: Vec<u64> = self
            .compasses
            .iter()
            .map(|station| {
                station.controls.press_b();
                station.node.ticks()
            })
            .collect();

        let done = |compasses: &[Station<Compass>]| {
            compasses.iter().zip(&started).all(|(station, &ticks)| {
                station.node.ticks() > ticks && *station.node.mode() == CompassMode::Navigate
            })
        };
        while !done(&self.compasses) {
            match self.next_slot() {
                Some((slot, _)) => self.step(slot),
                None => break,
            }
        }
    }

    /// Smallest node clock.
    pub fn now_ms(&self) -> u64 {
        self.next_slot().map_or(0, |(_, now)| now)
    }

    pub fn flag_ledger(&self, id: &str) -> Option<&EncounterLedger> {
        self.flags
            .iter()
            .find(|station| station.node.role().id().as_str() == id)
            .map(|station| station.node.ledger())
    }

    pub fn compass_ledger(&self, id: &str) -> Option<&EncounterLedger> {
        self.compasses
            .iter()
            .find(|station| station.node.role().id().as_str() == id)
            .map(|station| station.node.ledger())
    }

    pub fn flag_controls(&self, id: &str) -> Option<SimControls> {
        self.flags
            .iter()
            .find(|station| station.node.role().id().as_str() == id)
            .map(|station| station.controls.clone())
    }

    pub fn compass_controls(&self, id: &str) -> Option<SimControls> {
        self.compasses
            .iter()
            .find(|station| station.node.role().id().as_str() == id)
            .map(|station| station.controls.clone())
    }

    pub fn compass_mode(&self, id: &str) -> Option<CompassMode> {
        self.compasses
            .iter()
            .find(|station| station.node.role().id().as_str() == id)
            .map(|station| *station.node.mode())
    }

    /// Every ledger, flags first, in configuration order.
    pub fn report(&self) -> Vec<NodeReport> {
        let flags = self.flags.iter().map(|station| NodeReport {
            kind: ProducerKind::Flag,
            id: station.node.role().id().clone(),
            encounters: station.node.ledger().iter_in_order().cloned().collect(),
        });
        let compasses = self.compasses.iter().map(|station| NodeReport {
            kind: ProducerKind::Compass,
            id: station.node.role().id().clone(),
            encounters: station.node.ledger().iter_in_order().cloned().collect(),
        });
        flags.chain(compasses).collect()
    }
}
