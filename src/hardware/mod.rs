//! Hardware-facing transports: the ISO-TP segmentation layer and the
//! concrete CAN channels it runs over.

pub mod isotp;

#[cfg(feature = "socketcan")]
pub mod socketcan;
