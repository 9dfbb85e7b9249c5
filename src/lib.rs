#![deny(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_imports,
    unused_import_braces,
    unused_qualifications
)]

//! A UDS (ISO 14229-1) diagnostic responder
//!
//! Where most of this crate's ancestry talks to a remote ECU as a tester,
//! this crate plays the other half of that conversation: it receives CAN
//! frames, reassembles them through an ISO-TP transport, and answers a
//! handful of UDS services against an emulated non-volatile store.
//!
//! ## Protocol support
//!
//! ### Unified diagnostic services (UDS)
//! ISO14229-1 services implemented: ECU Reset (0x11), Clear Diagnostic
//! Information (0x14), Read DTC Information (0x19), Read Data By Identifier
//! (0x22), and Write Data By Identifier (0x2E). See [uds] for the dispatcher
//! and one submodule per service.
//!
//! ### ISO-TP (ISO 15765-2)
//! Segmentation and reassembly of UDS PDUs onto raw CAN frames, including
//! Flow Control handling. See [hardware::isotp].
//!
//! ## Hardware support
//!
//! ### SocketCAN (Linux only)
//! Raw CAN frame I/O over a SocketCAN interface, gated behind the `socketcan`
//! feature. See [hardware::socketcan].
//!
//! ### In-memory channel
//! [channel::MockCanChannel] drives the responder in tests without any real
//! hardware.
//!
//! ## Persistent state
//!
//! [store] emulates the byte-addressable EEPROM/NVM the original firmware
//! reads and writes; [dtc] and [did] layer a DTC record catalogue and a
//! Data Identifier registry on top of it. [sensor] and [platform] are the
//! narrow ADC-sampling and reset primitives the DID registry and ECU Reset
//! service consume. [responder] ties transport, dispatch, and storage
//! together into a poll-driven loop.

pub mod channel;
pub mod did;
pub mod dtc;
pub mod error;
pub mod hardware;
pub mod platform;
pub mod responder;
pub mod sensor;
pub mod store;
pub mod uds;
