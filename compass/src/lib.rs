//! Compass role: the device a player carries around a course.
//!
//! - `Navigate` shows a needle toward Magnetic North and keeps the radio quiet.
//! - `Scan` listens for flags on the compass's course, logs each one and
//!   acknowledges it the first time it is seen.
//! - `Replay` shows the logged flags in the order they were reached, then
//!   returns to `Navigate` on its own.
//!
//! Button A switches between `Navigate` and `Scan`; button B starts a replay
//! from any mode.

#![cfg_attr(not(feature = "simulator"), no_std)]

use tracing::{debug, info, trace};

use common::config::{NodeConfig, Timing};
use common::error::{ConfigError, HalError};
use common::hal::{Display, Glyph, Hardware, Input, Radio};
use common::heading::quantize;
use common::ledger::EncounterLedger;
use common::node::Role;
use common::protocol::{decode, encode, Course, Message, NodeId};

/// Compass modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassMode {
    /// Needle display, radio silent
    Navigate,
    /// Listening for flags
    Scan,
    /// Showing the ledger; `next` is the position of the next entry to show
    Replay { next: usize },
}

/// Compass role logic, bound to one course for its whole life.
#[derive(Debug, Clone)]
pub struct Compass {
    id: NodeId,
    course: Course,
    bucket_count: u16,
    timing: Timing,
}

impl Compass {
    pub fn new(id: NodeId, course: Course) -> Self {
        Self {
            id,
            course,
            bucket_count: common::heading::DEFAULT_BUCKET_COUNT,
            timing: Timing::default(),
        }
    }

    /// Build from provisioning; a compass needs exactly one course.
    pub fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let course = match config.courses.as_slice() {
            [course] => *course,
            courses => return Err(ConfigError::CompassCourses(courses.len())),
        };
        Ok(Self {
            id: config.id.clone(),
            course,
            bucket_count: config.bucket_count,
            timing: config.timing,
        })
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn course(&self) -> Course {
        self.course
    }

    fn navigate<H: Hardware>(&self, hw: &mut H) -> Result<(), HalError> {
        let heading = hw.read_heading()?;
        let bucket = quantize(heading, self.bucket_count);
        hw.display().show(Glyph::Needle(bucket));
        hw.delay_ms(self.timing.navigate_pause_ms);
        Ok(())
    }

    fn scan<H: Hardware>(&self, ledger: &mut EncounterLedger, hw: &mut H) -> Result<(), HalError> {
        if let Some(frame) = hw.radio().try_receive()? {
            match decode(&frame) {
                Some(Message::Announce { course, id }) if course == self.course => {
                    hw.display().show(Glyph::Identity(&id));
                    if ledger.record_if_new(course, id.clone()) {
                        info!(flag = %id, %course, "checkpoint reached");
                        let ack = encode(&Message::ack(self.course, self.id.clone()));
                        hw.radio().send(&ack)?;
                    }
                }
                Some(other) => {
                    trace!(
                        kind = ?other.producer_kind(),
                        course = %other.course(),
                        "ignored message"
                    );
                }
                None => trace!(len = frame.len(), "ignored noise"),
            }
        }
        // keeps the radio duty cycle low
        hw.delay_ms(self.timing.scan_pause_ms);
        Ok(())
    }

    fn replay<H: Hardware>(
        &self,
        next: usize,
        ledger: &EncounterLedger,
        hw: &mut H,
    ) -> CompassMode {
        match ledger.iter_in_order().nth(next) {
            Some(record) => {
                hw.display().show(Glyph::Identity(&record.peer));
                hw.delay_ms(self.timing.dwell_ms);
                CompassMode::Replay { next: next + 1 }
            }
            None => {
                hw.display().clear();
                hw.delay_ms(self.timing.replay_pause_ms);
                debug!(shown = next, "replay done");
                CompassMode::Navigate
            }
        }
    }
}

impl Role for Compass {
    type Mode = CompassMode;

    fn initial_mode(&self) -> CompassMode {
        CompassMode::Navigate
    }

    fn on_input(&self, mode: &CompassMode, input: Input) -> Option<CompassMode> {
        if input.b {
            return Some(CompassMode::Replay { next: 0 });
        }
        if input.a {
            return match mode {
                CompassMode::Navigate => Some(CompassMode::Scan),
                CompassMode::Scan => Some(CompassMode::Navigate),
                CompassMode::Replay { .. } => None,
            };
        }
        None
    }

    fn tick<H: Hardware>(
        &mut self,
        mode: &CompassMode,
        ledger: &mut EncounterLedger,
        hw: &mut H,
    ) -> Result<Option<CompassMode>, HalError> {
        match *mode {
            CompassMode::Navigate => self.navigate(hw).map(|()| None),
            CompassMode::Scan => self.scan(ledger, hw).map(|()| None),
            CompassMode::Replay { next } => Ok(Some(self.replay(next, ledger, hw))),
        }
    }
}
