//! Flag role: a stationary checkpoint.
//!
//! In `Broadcast` a flag shows its identity and announces itself on each of
//! its courses in turn, logging the compasses that acknowledge. `Review` lets
//! the operator pick one course with button B and list its visitors with
//! button A; once the list has scrolled past the flag goes back to
//! broadcasting.

#![cfg_attr(not(feature = "simulator"), no_std)]

use tracing::{debug, info, trace};

use common::config::{NodeConfig, Timing};
use common::error::{ConfigError, HalError};
use common::hal::{Display, Glyph, Hardware, Input, Radio};
use common::ledger::EncounterLedger;
use common::node::Role;
use common::protocol::{decode, encode, Course, Message, NodeId, MAX_COURSES};

/// Flag modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagMode {
    /// Announcing; `next_course` indexes the course announced on this tick
    Broadcast { next_course: usize },
    /// Reviewing visitors of `courses[selected]`. While `presenting` holds a
    /// ledger position the visitor list is scrolling and input is ignored.
    Review {
        selected: usize,
        presenting: Option<usize>,
    },
}

#[derive(Debug, Clone)]
pub struct Flag {
    id: NodeId,
    courses: heapless::Vec<Course, MAX_COURSES>,
    timing: Timing,
}

impl Flag {
    /// Flag with default timing.
    pub fn new(id: NodeId, courses: &[Course]) -> Result<Self, ConfigError> {
        Self::from_config(&NodeConfig::new(id, courses)?)
    }

    pub fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id: config.id.clone(),
            courses: config.courses.clone(),
            timing: config.timing,
        })
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    fn course_at(&self, index: usize) -> Course {
        // validated non-empty
        self.courses[index % self.courses.len()]
    }

    fn broadcast<H: Hardware>(
        &self,
        next_course: usize,
        ledger: &mut EncounterLedger,
        hw: &mut H,
    ) -> Result<FlagMode, HalError> {
        hw.display().show(Glyph::Identity(&self.id));

        let course = self.course_at(next_course);
        let announce = encode(&Message::announce(course, self.id.clone()));
        hw.radio().send(&announce)?;

        if let Some(frame) = hw.radio().try_receive()? {
            match decode(&frame) {
                Some(Message::Ack { course, id }) if self.courses.contains(&course) => {
                    if ledger.record_if_new(course, id.clone()) {
                        info!(compass = %id, %course, "visitor logged");
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

        hw.delay_ms(self.timing.broadcast_pause_ms);
        Ok(FlagMode::Broadcast {
            next_course: (next_course + 1) % self.courses.len(),
        })
    }

    fn present<H: Hardware>(
        &self,
        selected: usize,
        cursor: usize,
        ledger: &EncounterLedger,
        hw: &mut H,
    ) -> FlagMode {
        let course = self.course_at(selected);
        let next = ledger
            .iter_in_order()
            .enumerate()
            .skip(cursor)
            .find(|(_, record)| record.course == course);

        match next {
            Some((position, record)) => {
                hw.display().scroll(record.peer.as_str());
                hw.delay_ms(self.timing.dwell_ms);
                FlagMode::Review {
                    selected,
                    presenting: Some(position + 1),
                }
            }
            None => {
                hw.display().clear();
                debug!(%course, "review done");
                FlagMode::Broadcast { next_course: 0 }
            }
        }
    }
}

impl Role for Flag {
    type Mode = FlagMode;

    fn initial_mode(&self) -> FlagMode {
        FlagMode::Broadcast { next_course: 0 }
    }

    fn on_input(&self, mode: &FlagMode, input: Input) -> Option<FlagMode> {
        match *mode {
            FlagMode::Broadcast { .. } if input.a => Some(FlagMode::Review {
                selected: 0,
                presenting: None,
            }),
            FlagMode::Broadcast { .. } => None,
            FlagMode::Review {
                selected,
                presenting: None,
            } => {
                let selected = if input.b {
                    (selected + 1) % self.courses.len()
                } else {
                    selected
                };
                let presenting = if input.a { Some(0) } else { None };
                Some(FlagMode::Review {
                    selected,
                    presenting,
                })
                .filter(|next| next != mode)
            }
            FlagMode::Review { .. } => None,
        }
    }

    fn tick<H: Hardware>(
        &mut self,
        mode: &FlagMode,
        ledger: &mut EncounterLedger,
        hw: &mut H,
    ) -> Result<Option<FlagMode>, HalError> {
        let next = match *mode {
            FlagMode::Broadcast { next_course } => self.broadcast(next_course, ledger, hw)?,
            FlagMode::Review {
                selected,
                presenting: None,
            } => {
                hw.display().show(Glyph::Course(self.course_at(selected)));
                hw.delay_ms(self.timing.review_pause_ms);
                return Ok(None);
            }
            FlagMode::Review {
                selected,
                presenting: Some(cursor),
            } => self.present(selected, cursor, ledger, hw),
        };
        Ok(Some(next))
    }
}
