//! In-process simulator: many nodes sharing one broadcast medium, driven by
//! either a virtual or a wall clock.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError, TrySendError};
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::InputPin;
use tracing::{debug, trace, warn};

use crate::config::{RadioSettings, MAX_CHANNEL, MAX_POWER};
use crate::error::HalError;
use crate::hal::{Buttons, Display, Glyph, Hardware, Input, Radio};
use crate::protocol::{Course, Frame};

/// Frames a station can hold before new ones are lost (micro:bit default).
pub const DEFAULT_QUEUE_LEN: usize = 3;
/// Display actions kept per node.
pub const DISPLAY_LOG_LEN: usize = 1024;
/// Zone of a station that hears nothing and is heard by nobody.
pub const NOWHERE: u32 = u32::MAX;

/// Per-station tuning and position, shared with its controls.
#[derive(Debug, Default)]
struct Link {
    channel: AtomicU8,
    group: AtomicU8,
    zone: AtomicU32,
}

impl Link {
    fn tuned(settings: &RadioSettings) -> Self {
        Self {
            channel: AtomicU8::new(settings.channel),
            group: AtomicU8::new(settings.group),
            zone: AtomicU32::new(0),
        }
    }

    fn hears(&self, other: &Link) -> bool {
        let zone = self.zone.load(Ordering::Relaxed);
        zone != NOWHERE
            && zone == other.zone.load(Ordering::Relaxed)
            && self.channel.load(Ordering::Relaxed) == other.channel.load(Ordering::Relaxed)
            && self.group.load(Ordering::Relaxed) == other.group.load(Ordering::Relaxed)
    }
}

struct Station {
    id: usize,
    tx: Sender<Frame>,
    link: Arc<Link>,
}

/// Shared broadcast medium between simulated nodes.
///
/// Stations hear each other when they sit in the same zone and are tuned to
/// the same channel and group. Each station has a bounded receive queue; a
/// frame arriving at a full queue is lost, as on the real radio.
#[derive(Clone)]
pub struct SimEther {
    stations: Arc<Mutex<Vec<Station>>>,
    queue_len: usize,
}

impl Default for SimEther {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEther {
    pub fn new() -> Self {
        Self::with_queue_len(DEFAULT_QUEUE_LEN)
    }

    pub fn with_queue_len(queue_len: usize) -> Self {
        Self {
            stations: Arc::new(Mutex::new(Vec::new())),
            queue_len: queue_len.max(1),
        }
    }

    /// Attach a new radio, tuned to the default settings, in zone 0.
    pub fn join(&self) -> SimRadio {
        let (tx, rx) = channel::bounded(self.queue_len);
        let link = Arc::new(Link::tuned(&RadioSettings::default()));

        let mut stations = self.stations.lock().unwrap_or_else(PoisonError::into_inner);
        let id = stations.len();
        stations.push(Station {
            id,
            tx,
            link: Arc::clone(&link),
        });
        drop(stations);

        SimRadio {
            station: id,
            rx,
            link,
            ether: self.clone(),
        }
    }

    fn broadcast(&self, source: usize, frame: &Frame) {
        let stations = self.stations.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = stations.iter().find(|s| s.id == source) else {
            return;
        };

        for station in stations.iter() {
            // a radio never hears itself
            if station.id == source || !sender.link.hears(&station.link) {
                continue;
            }
            match station.tx.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    trace!(station = station.id, "receive queue full, frame lost");
                }
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }
}

/// Simulated radio attached to a [`SimEther`].
pub struct SimRadio {
    station: usize,
    rx: Receiver<Frame>,
    link: Arc<Link>,
    ether: SimEther,
}

impl SimRadio {
    /// Move the station; only stations in the same zone hear each other.
    pub fn move_to(&self, zone: u32) {
        self.link.zone.store(zone, Ordering::Relaxed);
    }
}

impl Radio for SimRadio {
    fn configure(&mut self, settings: &RadioSettings) -> Result<(), HalError> {
        if settings.channel > MAX_CHANNEL {
            return Err(HalError::Config("channel out of range"));
        }
        if settings.power > MAX_POWER {
            return Err(HalError::Config("power out of range"));
        }

        self.link.channel.store(settings.channel, Ordering::Relaxed);
        self.link.group.store(settings.group, Ordering::Relaxed);
        trace!(
            station = self.station,
            channel = settings.channel,
            group = settings.group,
            "radio tuned"
        );
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), HalError> {
        let frame = Frame::from_slice(frame).map_err(|_| HalError::SendFailed)?;
        self.ether.broadcast(self.station, &frame);
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, HalError> {
        match self.rx.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(HalError::RecvFailed),
        }
    }
}

/// Simulated time source.
///
/// Virtual clocks only count; real-time clocks also sleep.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ms: Arc<AtomicU64>,
    realtime: bool,
}

impl SimClock {
    pub fn virtual_time() -> Self {
        Self::default()
    }

    pub fn realtime() -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(0)),
            realtime: true,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }

    pub fn advance(&self, ms: u32) {
        if self.realtime {
            thread::sleep(Duration::from_millis(u64::from(ms)));
        }
        self.now_ms.fetch_add(u64::from(ms), Ordering::Relaxed);
    }
}

/// Owned copy of a [`Glyph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Needle(u16),
    Identity(String),
    Course(Course),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayAction {
    Show(Shown),
    Clear,
    Scroll(String),
}

/// A display action and the simulated time it happened at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEvent {
    pub at_ms: u64,
    pub action: DisplayAction,
}

/// Display that records what it was asked to do.
#[derive(Debug, Clone)]
pub struct SimDisplay {
    log: Arc<Mutex<VecDeque<DisplayEvent>>>,
    clock: SimClock,
}

impl SimDisplay {
    pub fn new(clock: SimClock) -> Self {
        Self {
            log: Arc::new(Mutex::new(VecDeque::new())),
            clock,
        }
    }

    /// Recorded actions, oldest first.
    pub fn events(&self) -> Vec<DisplayEvent> {
        match self.log.lock() {
            Ok(log) => log.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn clear_events(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    fn record(&self, action: DisplayAction) {
        debug!(?action, "display");
        if let Ok(mut log) = self.log.lock() {
            if log.len() == DISPLAY_LOG_LEN {
                log.pop_front();
            }
            log.push_back(DisplayEvent {
                at_ms: self.clock.now_ms(),
                action,
            });
        }
    }
}

impl Display for SimDisplay {
    fn show(&mut self, glyph: Glyph<'_>) {
        let shown = match glyph {
            Glyph::Needle(bucket) => Shown::Needle(bucket),
            Glyph::Identity(id) => Shown::Identity(id.as_str().to_owned()),
            Glyph::Course(course) => Shown::Course(course),
        };
        self.record(DisplayAction::Show(shown));
    }

    fn clear(&mut self) {
        self.record(DisplayAction::Clear);
    }

    fn scroll(&mut self, text: &str) {
        self.record(DisplayAction::Scroll(text.to_owned()));
    }
}

/// Simulated push button.
///
/// A press is latched until the pin is next read low, so each press is seen
/// by exactly one tick.
#[derive(Debug, Clone, Default)]
pub struct SimButton {
    latched: Arc<AtomicBool>,
}

impl SimButton {
    pub fn press(&self) {
        self.latched.store(true, Ordering::Relaxed);
    }
}

impl InputPin for SimButton {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(!self.latched.load(Ordering::Relaxed))
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.latched.swap(false, Ordering::Relaxed))
    }
}

/// Handle for poking a simulated node from the outside: pressing buttons,
/// turning it around, walking it between zones, reading its display.
#[derive(Debug, Clone)]
pub struct SimControls {
    button_a: SimButton,
    button_b: SimButton,
    heading: Arc<AtomicU32>,
    display: SimDisplay,
    clock: SimClock,
    link: Arc<Link>,
}

impl SimControls {
    pub fn press_a(&self) {
        self.button_a.press();
    }

    pub fn press_b(&self) {
        self.button_b.press();
    }

    pub fn set_heading(&self, degrees: f32) {
        self.heading.store(degrees.to_bits(), Ordering::Relaxed);
    }

    pub fn move_to(&self, zone: u32) {
        self.link.zone.store(zone, Ordering::Relaxed);
    }

    pub fn display_events(&self) -> Vec<DisplayEvent> {
        self.display.events()
    }

    pub fn clear_display_events(&self) {
        self.display.clear_events();
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

/// Drive a node from stdin, one command per line: `a` and `b` press a
/// button, `h <degrees>` sets the heading, `z <zone>` moves the node.
///
/// Runs on its own thread until stdin closes.
pub fn spawn_console(controls: SimControls) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let mut words = line.split_whitespace();
            match (words.next(), words.next()) {
                (Some("a"), None) => controls.press_a(),
                (Some("b"), None) => controls.press_b(),
                (Some("h"), Some(degrees)) => match degrees.parse() {
                    Ok(degrees) => controls.set_heading(degrees),
                    Err(_) => warn!(%degrees, "bad heading"),
                },
                (Some("z"), Some(zone)) => match zone.parse() {
                    Ok(zone) => controls.move_to(zone),
                    Err(_) => warn!(%zone, "bad zone"),
                },
                (None, _) => {}
                _ => warn!(command = %line, "unknown command, expected a, b, h <deg> or z <zone>"),
            }
        }
    })
}

/// Simulated node board.
pub struct SimHardware {
    radio: SimRadio,
    display: SimDisplay,
    buttons: Buttons<SimButton, SimButton>,
    heading: Arc<AtomicU32>,
    clock: SimClock,
    controls: SimControls,
}

impl SimHardware {
    pub fn new(ether: &SimEther, clock: SimClock) -> Self {
        let radio = ether.join();
        let display = SimDisplay::new(clock.clone());
        let button_a = SimButton::default();
        let button_b = SimButton::default();
        let heading = Arc::new(AtomicU32::new(0.0f32.to_bits()));

        let controls = SimControls {
            button_a: button_a.clone(),
            button_b: button_b.clone(),
            heading: Arc::clone(&heading),
            display: display.clone(),
            clock: clock.clone(),
            link: Arc::clone(&radio.link),
        };

        Self {
            radio,
            display,
            buttons: Buttons::new(button_a, button_b),
            heading,
            clock,
            controls,
        }
    }

    pub fn controls(&self) -> SimControls {
        self.controls.clone()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

impl DelayMs<u32> for SimHardware {
    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(ms);
    }
}

impl Hardware for SimHardware {
    type Radio = SimRadio;
    type Display = SimDisplay;

    fn radio(&mut self) -> &mut Self::Radio {
        &mut self.radio
    }

    fn display(&mut self) -> &mut Self::Display {
        &mut self.display
    }

    fn read_heading(&mut self) -> Result<f32, HalError> {
        Ok(f32::from_bits(self.heading.load(Ordering::Relaxed)))
    }

    fn poll_input(&mut self) -> Result<Input, HalError> {
        self.buttons.read()
    }
}
