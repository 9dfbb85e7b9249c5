//! Crate-wide error types
//!
//! The responder has two independent failure domains: transport-level errors,
//! which never reach the UDS layer as a negative response, and store-level
//! errors, which the UDS dispatcher maps to `NRC_GeneralProgrammingFailure`.

use thiserror::Error;

/// Errors produced by the persistent store (`nvm.c`/`nvm.h`'s bounded,
/// offset-addressed byte region backing the DID and DTC regions).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// `offset + len` exceeded the region size, or a null/zero-length buffer
    /// was passed where data was required.
    #[error("invalid parameter: offset/length out of bounds")]
    InvalidParam,
    /// The underlying backend (flash emulation, driver) failed the operation.
    #[error("backend driver error")]
    DriverError,
}

/// Errors produced while reassembling or transmitting an ISO 15765-2
/// (ISO-TP) PDU.
///
/// Per the transport's error handling contract, these never surface as a UDS
/// negative response: the dispatcher simply receives no PDU for that frame
/// sequence and the receiver resets to `Idle`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// A Consecutive Frame's sequence number did not equal
    /// `(previous_sn + 1) mod 16`.
    #[error("consecutive frame sequence number mismatch")]
    SequenceMismatch,
    /// The total bytes received did not match the length declared by the
    /// First Frame.
    #[error("reassembled length did not match the declared PDU length")]
    LengthMismatch,
    /// No frame arrived within the per-frame timeout (`N_Cr`).
    #[error("timed out waiting for the next ISO-TP frame")]
    Timeout,
}

/// Errors produced by a CAN-level communication channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Underlying I/O error from the hardware channel.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The channel is not open.
    #[error("channel is not open")]
    NotOpen,
    /// The channel rejected the frame (bad DLC, bad ID, etc).
    #[error("channel rejected frame: {0}")]
    InvalidFrame(String),
}
