//! Control messages delivered to the real-time consumer.

use crate::SeekTarget;

/// Command for the [`SinkProcessor`](crate::SinkProcessor).
///
/// Variants that discard already rendered audio carry the reset epoch they
/// belong to; the sink parks until the render side has reset the ring for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkCommand {
    /// Start or resume advancing the playback transport.
    Play,
    /// Hold position and output silence.
    Pause,
    /// Pause and return to the origin.
    Stop { epoch: u64 },
    /// Reposition to an absolute target.
    Seek { target: SeekTarget, epoch: u64 },
    /// A new song was published; return to the origin.
    Song { epoch: u64 },
}

impl SinkCommand {
    /// Reset epoch carried by this command, if any.
    pub fn epoch(&self) -> Option<u64> {
        match *self {
            SinkCommand::Play | SinkCommand::Pause => None,
            SinkCommand::Stop { epoch }
            | SinkCommand::Seek { epoch, .. }
            | SinkCommand::Song { epoch } => Some(epoch),
        }
    }
}
