use crate::protocol::{Course, Frame, NodeId, ProducerKind, MAX_ID_LEN};

/// Offset of the producer tag.
const TAG_OFFSET: usize = 0;
/// Offset of the course character.
const COURSE_OFFSET: usize = 1;
/// Offset of the first identity byte.
const ID_OFFSET: usize = 2;

/// A decoded radio message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Periodic broadcast from a flag for one of its courses.
    Announce { course: Course, id: NodeId },
    /// A compass confirming it registered an announcement.
    Ack { course: Course, id: NodeId },
}

impl Message {
    pub fn announce(course: Course, id: NodeId) -> Self {
        Self::Announce { course, id }
    }

    pub fn ack(course: Course, id: NodeId) -> Self {
        Self::Ack { course, id }
    }

    pub fn producer_kind(&self) -> ProducerKind {
        match self {
            Self::Announce { .. } => ProducerKind::Flag,
            Self::Ack { .. } => ProducerKind::Compass,
        }
    }

    pub fn course(&self) -> Course {
        match self {
            Self::Announce { course, .. } | Self::Ack { course, .. } => *course,
        }
    }

    pub fn id(&self) -> &NodeId {
        match self {
            Self::Announce { id, .. } | Self::Ack { id, .. } => id,
        }
    }
}

/// Encode a message as `<tag><course><id>`.
///
/// Always fits: the identity is at most `MAX_ID_LEN` bytes, well under the
/// frame limit.
pub fn encode(message: &Message) -> Frame {
    let mut frame = Frame::new();
    // Capacity is covered by MAX_ID_LEN
    let _ = frame.push(message.producer_kind().tag());
    let _ = frame.push(message.course().as_byte());
    let _ = frame.extend_from_slice(message.id().as_str().as_bytes());
    frame
}

/// Decode a frame. Anything that is not a well-formed message, including
/// untagged legacy frames, yields `None`.
pub fn decode(frame: &[u8]) -> Option<Message> {
    if frame.len() <= ID_OFFSET || frame.len() > ID_OFFSET + MAX_ID_LEN {
        return None;
    }

    let kind = ProducerKind::from_tag(frame[TAG_OFFSET])?;
    let course = Course::from_byte(frame[COURSE_OFFSET])?;
    let id = NodeId::from_bytes(&frame[ID_OFFSET..])?;

    Some(match kind {
        ProducerKind::Flag => Message::Announce { course, id },
        ProducerKind::Compass => Message::Ack { course, id },
    })
}
