//! Raw CAN transport over Linux SocketCAN
//!
//! Open/close a `socketcan::CanSocket`, non-blocking reads, straight frame
//! write/read with no ISO-TP delegated to the kernel module — this crate's
//! ISO-TP segmentation (`hardware::isotp`) runs on top of this channel
//! rather than inside it, since `socketcan-isotp` has no role left once the
//! responder does its own Flow Control handling.

use crate::channel::{CanChannel, CanFrame};
use crate::error::ChannelError;
use socketcan::{CanFrame as RawCanFrame, CanSocket, EmbeddedFrame, Frame, Socket, StandardId};

/// A [CanChannel] backed by a Linux SocketCAN interface (e.g. `can0`,
/// `vcan0`).
pub struct SocketCanChannel {
    socket: CanSocket,
}

impl std::fmt::Debug for SocketCanChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketCanChannel").finish_non_exhaustive()
    }
}

impl SocketCanChannel {
    /// Opens the named SocketCAN interface in non-blocking mode.
    pub fn open(if_name: &str) -> Result<Self, ChannelError> {
        let socket = CanSocket::open(if_name).map_err(ChannelError::Io)?;
        socket.set_nonblocking(true).map_err(ChannelError::Io)?;
        Ok(Self { socket })
    }
}

impl CanChannel for SocketCanChannel {
    fn send_frame(&mut self, id: u32, data: &[u8]) -> Result<(), ChannelError> {
        let std_id = StandardId::new(id as u16)
            .ok_or_else(|| ChannelError::InvalidFrame(format!("id {id:#x} out of range")))?;
        let frame = RawCanFrame::new(std_id, data)
            .ok_or_else(|| ChannelError::InvalidFrame("frame data too long".to_string()))?;
        self.socket.write_frame(&frame).map_err(ChannelError::Io)?;
        Ok(())
    }

    fn try_recv_frame(&mut self) -> Result<Option<CanFrame>, ChannelError> {
        match self.socket.read_frame() {
            Ok(frame) => Ok(Some((frame.raw_id(), frame.data().to_vec()))),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(ChannelError::Io(e)),
        }
    }
}
