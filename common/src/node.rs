//! Node controller: the per-tick loop shared by every node role.
//!
//! The controller owns the node's mode and its encounter ledger. Each tick it
//! polls the buttons once, lets the role turn the input into a mode change,
//! then runs exactly one tick of role behaviour. Mode and ledger are only
//! touched from inside `tick`, which keeps the ledger single-writer.

use core::fmt::Debug;
use core::mem;

use tracing::{debug, info, warn};

use crate::config::RadioSettings;
use crate::error::HalError;
use crate::hal::{Display, Hardware, Input, Radio};
use crate::ledger::EncounterLedger;

/// Pause after a failed tick before trying again.
pub const ERROR_BACKOFF_MS: u32 = 500;

/// Behaviour of one kind of node.
pub trait Role {
    /// Role-specific modes, including any sub-state such as cursors.
    type Mode: Clone + PartialEq + Debug;

    fn initial_mode(&self) -> Self::Mode;

    /// Mode change requested by this tick's input, if any.
    fn on_input(&self, mode: &Self::Mode, input: Input) -> Option<Self::Mode>;

    /// Run one tick in `mode`. Returns the next mode when the role moves on
    /// by itself.
    fn tick<H: Hardware>(
        &mut self,
        mode: &Self::Mode,
        ledger: &mut EncounterLedger,
        hw: &mut H,
    ) -> Result<Option<Self::Mode>, HalError>;
}

/// Owns mode and ledger, and drives a [`Role`] one tick at a time.
pub struct NodeController<R: Role> {
    role: R,
    mode: R::Mode,
    ledger: EncounterLedger,
    ticks: u64,
}

impl<R: Role> NodeController<R> {
    pub fn new(role: R) -> Self {
        let mode = role.initial_mode();
        Self {
            role,
            mode,
            ledger: EncounterLedger::new(),
            ticks: 0,
        }
    }

    /// Bring up the radio. Call once before the first tick.
    pub fn start<H: Hardware>(
        &mut self,
        hw: &mut H,
        radio: &RadioSettings,
    ) -> Result<(), HalError> {
        hw.radio().configure(radio)?;
        hw.display().clear();
        info!(
            mode = ?self.mode,
            channel = radio.channel,
            group = radio.group,
            power = radio.power,
            "node started"
        );
        Ok(())
    }

    /// One pass of the loop: input, then role behaviour.
    pub fn tick<H: Hardware>(&mut self, hw: &mut H) -> Result<(), HalError> {
        self.ticks += 1;

        let input = hw.poll_input()?;
        if !input.is_idle() {
            if let Some(next) = self.role.on_input(&self.mode, input) {
                self.switch(next, hw);
            }
        }

        if let Some(next) = self.role.tick(&self.mode, &mut self.ledger, hw)? {
            if next != self.mode {
                if mem::discriminant(&next) != mem::discriminant(&self.mode) {
                    debug!(from = ?self.mode, to = ?next, "mode finished");
                }
                self.mode = next;
            }
        }
        Ok(())
    }

    /// Tick forever. Nothing is fatal: a failed tick is logged and retried
    /// after a short pause.
    pub fn run<H: Hardware>(&mut self, hw: &mut H) -> ! {
        loop {
            if let Err(error) = self.tick(hw) {
                warn!(%error, mode = ?self.mode, "tick failed");
                hw.delay_ms(ERROR_BACKOFF_MS);
            }
        }
    }

    pub fn mode(&self) -> &R::Mode {
        &self.mode
    }

    pub fn ledger(&self) -> &EncounterLedger {
        &self.ledger
    }

    pub fn role(&self) -> &R {
        &self.role
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn switch<H: Hardware>(&mut self, next: R::Mode, hw: &mut H) {
        debug!(from = ?self.mode, to = ?next, "mode switch");
        // transitions only clear the display
        hw.display().clear();
        self.mode = next;
    }
}
