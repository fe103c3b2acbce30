//! Wire protocol shared by flags and compasses.
//!
//! Every frame is a short ASCII string: a producer tag, a course character and
//! the sender identity, in that order. Receivers filter on the first two fields
//! before they ever look at the identity.

use core::fmt;

use serde::{Deserialize, Serialize};

pub mod message;

pub use message::{decode, encode, Message};

/// Maximum frame size accepted by the radio (micro:bit default payload).
pub const MAX_FRAME_LEN: usize = 32;
/// Maximum identity length in bytes.
pub const MAX_ID_LEN: usize = 16;
/// Maximum number of courses a single flag can belong to.
pub const MAX_COURSES: usize = 8;

/// A raw radio frame.
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Which kind of node produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProducerKind {
    Flag = b'F',
    Compass = b'C',
}

impl ProducerKind {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'F' => Some(Self::Flag),
            b'C' => Some(Self::Compass),
            _ => None,
        }
    }
}

/// A course label: one ASCII letter or digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct Course(u8);

impl Course {
    pub fn new(label: char) -> Option<Self> {
        if label.is_ascii_alphanumeric() {
            Some(Self(label as u8))
        } else {
            None
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        if byte.is_ascii_alphanumeric() {
            Some(Self(byte))
        } else {
            None
        }
    }

    pub fn as_byte(self) -> u8 {
        self.0
    }

    pub fn as_char(self) -> char {
        self.0 as char
    }
}

impl TryFrom<char> for Course {
    type Error = InvalidCourse;

    fn try_from(label: char) -> Result<Self, Self::Error> {
        Self::new(label).ok_or(InvalidCourse(label))
    }
}

impl From<Course> for char {
    fn from(course: Course) -> Self {
        course.as_char()
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Rejected course label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCourse(pub char);

impl fmt::Display for InvalidCourse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "course must be a single ASCII letter or digit, got {:?}", self.0)
    }
}

/// Node identity: 1 to 16 printable ASCII characters, no spaces.
///
/// Uniqueness across nodes sharing a channel is the operator's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "heapless::String<MAX_ID_LEN>", into = "heapless::String<MAX_ID_LEN>")]
pub struct NodeId(heapless::String<MAX_ID_LEN>);

impl NodeId {
    pub fn new(id: &str) -> Option<Self> {
        Self::from_bytes(id.as_bytes())
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > MAX_ID_LEN {
            return None;
        }
        if !bytes.iter().all(u8::is_ascii_graphic) {
            return None;
        }
        // ASCII only, checked above
        let text = core::str::from_utf8(bytes).ok()?;
        let mut id = heapless::String::new();
        id.push_str(text).ok()?;
        Some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<heapless::String<MAX_ID_LEN>> for NodeId {
    type Error = InvalidNodeId;

    fn try_from(id: heapless::String<MAX_ID_LEN>) -> Result<Self, Self::Error> {
        Self::new(id.as_str()).ok_or(InvalidNodeId)
    }
}

impl From<NodeId> for heapless::String<MAX_ID_LEN> {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidNodeId;

impl fmt::Display for InvalidNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node id must be 1 to {} printable ASCII characters without spaces",
            MAX_ID_LEN
        )
    }
}
