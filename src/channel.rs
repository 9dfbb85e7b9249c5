//! Logical CAN communication channel
//!
//! The responder never talks to hardware directly: every CAN access goes
//! through the [CanChannel] trait so the dispatcher and ISO-TP layer can be
//! driven by a [MockCanChannel] in tests and by a real transport (see
//! `hardware::socketcan`, behind the `socketcan` feature) in production.

use crate::error::ChannelError;
use std::collections::VecDeque;

/// A single raw CAN frame: an 11 or 29-bit arbitration ID plus up to 8 data
/// bytes.
pub type CanFrame = (u32, Vec<u8>);

/// Minimal interface a CAN transport must provide for the responder to run
/// over it. Collapsed to raw-frame granularity, separate from protocol
/// layering, since this crate implements its own ISO-TP rather than
/// delegating it to the channel.
pub trait CanChannel: Send {
    /// Sends one raw CAN frame with the given arbitration ID.
    fn send_frame(&mut self, id: u32, data: &[u8]) -> Result<(), ChannelError>;

    /// Polls for one received frame without blocking. Returns `Ok(None)` if
    /// nothing is queued.
    fn try_recv_frame(&mut self) -> Result<Option<CanFrame>, ChannelError>;
}

/// In-memory [CanChannel] used by unit and scenario tests.
///
/// A pair of FIFO queues stand in for the CAN bus, one direction each way,
/// with no real timing behavior.
#[derive(Debug, Default)]
pub struct MockCanChannel {
    outbox: VecDeque<CanFrame>,
    inbox: VecDeque<CanFrame>,
}

impl MockCanChannel {
    /// Creates an empty mock channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a frame as if it had arrived from the bus, for the responder
    /// to pick up on its next `try_recv_frame`.
    pub fn push_incoming(&mut self, id: u32, data: &[u8]) {
        self.inbox.push_back((id, data.to_vec()));
    }

    /// Drains every frame the responder has sent so far, in send order.
    pub fn drain_outgoing(&mut self) -> Vec<CanFrame> {
        self.outbox.drain(..).collect()
    }
}

impl CanChannel for MockCanChannel {
    fn send_frame(&mut self, id: u32, data: &[u8]) -> Result<(), ChannelError> {
        self.outbox.push_back((id, data.to_vec()));
        Ok(())
    }

    fn try_recv_frame(&mut self) -> Result<Option<CanFrame>, ChannelError> {
        Ok(self.inbox.pop_front())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mock_channel_round_trip() {
        let mut chan = MockCanChannel::new();
        chan.push_incoming(0x7E0, &[0x02, 0x10, 0x01]);
        let (id, data) = chan.try_recv_frame().unwrap().unwrap();
        assert_eq!(id, 0x7E0);
        assert_eq!(data, vec![0x02, 0x10, 0x01]);
        assert!(chan.try_recv_frame().unwrap().is_none());

        chan.send_frame(0x7E8, &[0x01, 0x50]).unwrap();
        let sent = chan.drain_outgoing();
        assert_eq!(sent, vec![(0x7E8, vec![0x01, 0x50])]);
        assert!(chan.drain_outgoing().is_empty());
    }
}
