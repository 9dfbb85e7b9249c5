//! ISO-TP (ISO 15765-2) segmentation over a [CanChannel]
//!
//! The reassembly state machine (PCI nibble dispatch, sequence-number
//! wraparound) follows `can_pal_s32k144/src/uds.c`'s
//! `UDS_SendMultiFrameISO_TP` and its implicit receive-side counterpart.
//! Flow Control handling is this crate's resolution of that file's own
//! simplification: the original never
//! parses an inbound FC at all, sleeping a fixed 10ms then streaming
//! Consecutive Frames on a fixed 5ms cadence. This transmitter polls for a
//! real FC for a bounded window and honors it when offered, falling back to
//! the original's fixed timing when none arrives.

use crate::channel::CanChannel;
use crate::error::TransportError;
use std::time::{Duration, Instant};

/// Largest PDU this transport can segment, bounded by ISO-TP's 12-bit
/// First Frame length field.
pub const MAX_PDU_LEN: usize = 4095;

const FC_POLL_TIMEOUT_MS: u64 = 10;
const FALLBACK_FF_DELAY_MS: u64 = 10;
const FALLBACK_CF_DELAY_MS: u8 = 5;

const PCI_SINGLE_FRAME: u8 = 0x0;
const PCI_FIRST_FRAME: u8 = 0x1;
const PCI_CONSECUTIVE_FRAME: u8 = 0x2;
const PCI_FLOW_CONTROL: u8 = 0x3;

const FS_CLEAR_TO_SEND: u8 = 0x0;
const FS_WAIT: u8 = 0x1;
const FS_OVERFLOW: u8 = 0x2;

#[derive(Debug)]
enum ReceiverState {
    Idle,
    Receiving {
        buffer: Vec<u8>,
        expected_len: usize,
        expected_seq: u8,
    },
}

/// Reassembles inbound CAN frames for one ISO-TP direction into whole PDUs.
///
/// One instance tracks one reassembly at a time, matching the responder's
/// single-concurrent-transaction model.
#[derive(Debug)]
pub struct IsoTpReceiver {
    state: ReceiverState,
}

impl Default for IsoTpReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl IsoTpReceiver {
    /// Creates a receiver with no reassembly in progress.
    pub fn new() -> Self {
        Self {
            state: ReceiverState::Idle,
        }
    }

    /// Resets any in-progress reassembly back to idle.
    pub fn reset(&mut self) {
        self.state = ReceiverState::Idle;
    }

    /// Feeds one raw CAN frame into the reassembler. Returns `Some(pdu)`
    /// once a full PDU has been reassembled; a First Frame causes a Flow
    /// Control frame to be sent immediately on `channel` addressed to
    /// `flow_control_id`.
    pub fn on_frame<C: CanChannel>(
        &mut self,
        channel: &mut C,
        flow_control_id: u32,
        data: &[u8],
    ) -> Result<Option<Vec<u8>>, TransportError> {
        if data.is_empty() {
            return Ok(None);
        }
        let pci_type = data[0] >> 4;
        match pci_type {
            PCI_SINGLE_FRAME => {
                let len = (data[0] & 0x0F) as usize;
                if len == 0 || len > data.len().saturating_sub(1) {
                    return Err(TransportError::LengthMismatch);
                }
                self.state = ReceiverState::Idle;
                Ok(Some(data[1..1 + len].to_vec()))
            }
            PCI_FIRST_FRAME => {
                if data.len() < 2 {
                    return Err(TransportError::LengthMismatch);
                }
                let len = (((data[0] & 0x0F) as usize) << 8) | data[1] as usize;
                let first_chunk = &data[2..data.len().min(8)];
                let mut buffer = Vec::with_capacity(len);
                buffer.extend_from_slice(first_chunk);
                self.state = ReceiverState::Receiving {
                    buffer,
                    expected_len: len,
                    expected_seq: 1,
                };
                let _ = channel.send_frame(flow_control_id, &[0x30, 0x00, 0x00]);
                Ok(None)
            }
            PCI_CONSECUTIVE_FRAME => match &mut self.state {
                ReceiverState::Receiving {
                    buffer,
                    expected_len,
                    expected_seq,
                } => {
                    let seq = data[0] & 0x0F;
                    if seq != *expected_seq {
                        self.state = ReceiverState::Idle;
                        return Err(TransportError::SequenceMismatch);
                    }
                    let remaining = expected_len.saturating_sub(buffer.len());
                    let take = remaining.min(data.len().saturating_sub(1));
                    buffer.extend_from_slice(&data[1..1 + take]);
                    *expected_seq = (*expected_seq + 1) % 16;
                    if buffer.len() >= *expected_len {
                        let pdu = std::mem::take(buffer);
                        self.state = ReceiverState::Idle;
                        Ok(Some(pdu))
                    } else {
                        Ok(None)
                    }
                }
                ReceiverState::Idle => Ok(None),
            },
            PCI_FLOW_CONTROL => Ok(None),
            _ => Ok(None),
        }
    }
}

/// Polls for a Flow Control frame for up to `FC_POLL_TIMEOUT_MS`, returning
/// `(block_size, st_min_ms)` honored for the following CF burst. Falls back
/// to the original firmware's fixed timing if nothing arrives.
fn poll_flow_control<C: CanChannel>(channel: &mut C) -> Result<(u8, u8), TransportError> {
    let start = Instant::now();
    loop {
        if let Ok(Some((_id, data))) = channel.try_recv_frame() {
            if !data.is_empty() && (data[0] >> 4) == PCI_FLOW_CONTROL {
                match data[0] & 0x0F {
                    FS_CLEAR_TO_SEND => {
                        let bs = data.get(1).copied().unwrap_or(0);
                        let st = data.get(2).copied().unwrap_or(0);
                        return Ok((bs, st));
                    }
                    FS_WAIT => continue,
                    FS_OVERFLOW => return Err(TransportError::Timeout),
                    _ => continue,
                }
            }
        }
        if start.elapsed() >= Duration::from_millis(FC_POLL_TIMEOUT_MS) {
            std::thread::sleep(Duration::from_millis(FALLBACK_FF_DELAY_MS));
            return Ok((0, FALLBACK_CF_DELAY_MS));
        }
    }
}

/// Sends one PDU over `channel`, addressed to `tx_id`, segmenting into
/// First Frame + Consecutive Frames when it does not fit a Single Frame.
/// `tx_id` is the arbitration ID this side transmits on; Flow Control
/// responses are expected back via `channel.try_recv_frame`.
pub fn send_pdu<C: CanChannel>(
    channel: &mut C,
    tx_id: u32,
    pdu: &[u8],
) -> Result<(), TransportError> {
    if pdu.len() > MAX_PDU_LEN {
        return Err(TransportError::LengthMismatch);
    }
    if pdu.len() <= 7 {
        // DLC is `1 + len`, not padded out to 8: the original firmware sets
        // `msg.dlc = 1 + total_uds_length` (or `4` for a negative response)
        // and transmits exactly that many bytes, unlike First/Consecutive
        // Frames, which always carry a full 8-byte DLC.
        let mut frame = Vec::with_capacity(1 + pdu.len());
        frame.push(pdu.len() as u8);
        frame.extend_from_slice(pdu);
        channel
            .send_frame(tx_id, &frame)
            .map_err(|_| TransportError::Timeout)?;
        return Ok(());
    }

    let len = pdu.len();
    let mut ff = Vec::with_capacity(8);
    ff.push(0x10 | (((len >> 8) as u8) & 0x0F));
    ff.push((len & 0xFF) as u8);
    ff.extend_from_slice(&pdu[0..6]);
    channel
        .send_frame(tx_id, &ff)
        .map_err(|_| TransportError::Timeout)?;

    let (mut block_size, mut st_min_ms) = poll_flow_control(channel)?;

    let mut seq: u8 = 1;
    let mut offset = 6;
    let mut sent_in_block: u32 = 0;
    while offset < len {
        let take = (len - offset).min(7);
        let mut cf = Vec::with_capacity(8);
        cf.push(0x20 | seq);
        cf.extend_from_slice(&pdu[offset..offset + take]);
        while cf.len() < 8 {
            cf.push(0xAA);
        }
        channel
            .send_frame(tx_id, &cf)
            .map_err(|_| TransportError::Timeout)?;
        offset += take;
        seq = (seq + 1) % 16;
        sent_in_block += 1;

        if offset < len {
            std::thread::sleep(Duration::from_millis(st_min_ms as u64));
            if block_size != 0 && sent_in_block >= block_size as u32 {
                let (bs, st) = poll_flow_control(channel)?;
                block_size = bs;
                st_min_ms = st;
                sent_in_block = 0;
            }
        }
    }
    Ok(())
}
