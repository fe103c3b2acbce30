#[cfg(feature = "simulator")]
pub mod simulator;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::InputPin;

use crate::config::RadioSettings;
use crate::error::HalError;
use crate::protocol::{Course, Frame, NodeId};

/// Radio transport.
///
/// Best-effort broadcast: no addressing, no delivery confirmation, frames may
/// be lost.
pub trait Radio {
    /// Apply channel, group and transmit power.
    fn configure(&mut self, settings: &RadioSettings) -> Result<(), HalError>;

    /// Broadcast one frame.
    fn send(&mut self, frame: &[u8]) -> Result<(), HalError>;

    /// Take the next queued frame, if any, without waiting.
    fn try_receive(&mut self) -> Result<Option<Frame>, HalError>;
}

/// What the node asks the display to show. Turning a glyph into pixels is up
/// to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph<'a> {
    /// Needle pointing at the given quantizer bucket
    Needle(u16),
    /// Image identifying a node
    Identity(&'a NodeId),
    /// Course label
    Course(Course),
}

/// Write-only display.
pub trait Display {
    fn show(&mut self, glyph: Glyph<'_>);

    fn clear(&mut self);

    fn scroll(&mut self, text: &str);
}

/// Buttons polled at the start of a tick.
///
/// A press shows up as exactly one `true` per tick window; debouncing is the
/// hardware's business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Input {
    pub a: bool,
    pub b: bool,
}

impl Input {
    pub const NONE: Self = Self { a: false, b: false };
    pub const A: Self = Self { a: true, b: false };
    pub const B: Self = Self { a: false, b: true };

    pub fn is_idle(&self) -> bool {
        !self.a && !self.b
    }
}

/// The two buttons of a node, wired active-low.
pub struct Buttons<A, B> {
    a: A,
    b: B,
}

impl<A: InputPin, B: InputPin> Buttons<A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self { a, b }
    }

    pub fn read(&self) -> Result<Input, HalError> {
        Ok(Input {
            a: self.a.is_low().map_err(|_| HalError::Input)?,
            b: self.b.is_low().map_err(|_| HalError::Input)?,
        })
    }
}

/// Everything a node touches on its board. Pauses go through `DelayMs`.
pub trait Hardware: DelayMs<u32> {
    type Radio: Radio;
    type Display: Display;

    fn radio(&mut self) -> &mut Self::Radio;

    fn display(&mut self) -> &mut Self::Display;

    /// Current heading in degrees. May drift slightly outside `[0, 360)`.
    fn read_heading(&mut self) -> Result<f32, HalError>;

    fn poll_input(&mut self) -> Result<Input, HalError>;
}
