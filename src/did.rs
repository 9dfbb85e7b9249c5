//! Data Identifier (DID) registry
//!
//! A flat, `const`-indexed table rather than a match arm per identifier,
//! in the style of a table-driven PID registry: a compile-time identifier
//! table with per-entry metadata rather than one function per identifier.

use crate::error::StoreError;
use crate::sensor::SensorBackend;
use crate::store::{NvmBackend, DID_THRESHOLD_OFFSET};

/// Where a DID's value comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DidSource {
    /// Sampled live from an ADC channel; never writable.
    Adc {
        /// The ADC channel this DID reads.
        channel: u8,
    },
    /// Backed by a fixed offset in the persistent store.
    Stored {
        /// Byte offset within the store's DID region.
        offset: u32,
    },
}

/// One entry in the DID registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DidEntry {
    /// The 16-bit Data Identifier value, as sent on the wire.
    pub did: u16,
    /// Where this DID's value lives.
    pub source: DidSource,
    /// Whether WriteDataByIdentifier (service 0x2E) accepts writes to this DID.
    pub writable: bool,
    /// Length in bytes of this DID's value on the wire (big-endian).
    pub len: u8,
}

/// Engine coolant temperature, read-only, sampled from ADC channel 0.
pub const DID_ENGINE_TEMP: u16 = 0xF190;
/// Engine warning light state, read-only, sampled from ADC channel 1.
pub const DID_ENGINE_LIGHT: u16 = 0xF191;
/// Configurable warning threshold, writable, persisted in the store.
pub const DID_THRESHOLD: u16 = 0xF192;

const ADC_CHANNEL_ENGINE_TEMP: u8 = 0;
const ADC_CHANNEL_ENGINE_LIGHT: u8 = 1;

/// The complete, compile-time DID registry this responder serves.
pub const DID_TABLE: &[DidEntry] = &[
    DidEntry {
        did: DID_ENGINE_TEMP,
        source: DidSource::Adc {
            channel: ADC_CHANNEL_ENGINE_TEMP,
        },
        writable: false,
        len: 2,
    },
    DidEntry {
        did: DID_ENGINE_LIGHT,
        source: DidSource::Adc {
            channel: ADC_CHANNEL_ENGINE_LIGHT,
        },
        writable: false,
        len: 2,
    },
    DidEntry {
        did: DID_THRESHOLD,
        source: DidSource::Stored {
            offset: DID_THRESHOLD_OFFSET,
        },
        writable: true,
        len: 2,
    },
];

/// Looks up a DID's registry entry by its wire value.
pub fn find_did(did: u16) -> Option<&'static DidEntry> {
    DID_TABLE.iter().find(|entry| entry.did == did)
}

/// Reads a DID's current value, big-endian, from whichever source backs it.
pub fn read(
    nvm: &mut impl NvmBackend,
    sensor: &mut impl SensorBackend,
    entry: &DidEntry,
) -> Result<Vec<u8>, StoreError> {
    match entry.source {
        DidSource::Adc { channel } => {
            let sample = sensor.read(channel);
            Ok(vec![(sample >> 8) as u8, (sample & 0xFF) as u8])
        }
        DidSource::Stored { offset } => {
            let mut buf = vec![0u8; entry.len as usize];
            nvm.read(offset, &mut buf)?;
            Ok(buf)
        }
    }
}

/// Writes a new value for a writable, store-backed DID.
///
/// Callers must check `entry.writable` and `data.len() == entry.len as
/// usize` first. ADC-sourced DIDs are never writable, so this always fails
/// them with [StoreError::InvalidParam] rather than silently discarding the
/// write.
pub fn write(nvm: &mut impl NvmBackend, entry: &DidEntry, data: &[u8]) -> Result<(), StoreError> {
    match entry.source {
        DidSource::Adc { .. } => Err(StoreError::InvalidParam),
        DidSource::Stored { offset } => nvm.write(offset, data),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sensor::SimulatedSensor;
    use crate::store::{SimulatedNvm, DID_MAX_SIZE};

    #[test]
    fn table_entries_fit_in_their_did_max_size() {
        for entry in DID_TABLE {
            assert!(u32::from(entry.len) <= DID_MAX_SIZE);
        }
    }

    #[test]
    fn lookup_finds_known_dids_and_rejects_unknown() {
        assert!(find_did(DID_ENGINE_TEMP).is_some());
        assert!(find_did(DID_THRESHOLD).unwrap().writable);
        assert!(find_did(0xDEAD).is_none());
    }

    #[test]
    fn adc_backed_did_reads_the_sensor_big_endian() {
        let mut nvm = SimulatedNvm::new();
        let mut sensor = SimulatedSensor::new();
        sensor.set_channel(ADC_CHANNEL_ENGINE_TEMP, 0x0234);
        let entry = find_did(DID_ENGINE_TEMP).unwrap();
        assert_eq!(read(&mut nvm, &mut sensor, entry).unwrap(), vec![0x02, 0x34]);
    }

    #[test]
    fn adc_backed_did_rejects_writes() {
        let mut nvm = SimulatedNvm::new();
        let entry = find_did(DID_ENGINE_TEMP).unwrap();
        assert_eq!(write(&mut nvm, entry, &[0, 0]), Err(StoreError::InvalidParam));
    }

    #[test]
    fn stored_did_round_trips() {
        let mut nvm = SimulatedNvm::new();
        let mut sensor = SimulatedSensor::new();
        let entry = find_did(DID_THRESHOLD).unwrap();
        write(&mut nvm, entry, &[0x0A, 0xBC]).unwrap();
        assert_eq!(read(&mut nvm, &mut sensor, entry).unwrap(), vec![0x0A, 0xBC]);
    }
}
