//! Persistent store: a bounded, byte-offset-addressed non-volatile region
//!
//! Grounded in `can_pal_s32k144/src/nvm.c` and `inc/nvm.h` from the original
//! firmware: a flat region, erased state `0xFF`, bounds-checked on every
//! access, split into a DID region followed by a DTC region.

use crate::error::StoreError;

/// Total size in bytes of the simulated non-volatile store.
pub const NVM_SIZE: u32 = 4096;

/// Number of Data Identifiers the store has room for.
pub const DID_COUNT: u32 = 3;
/// Maximum size in bytes of a single DID's stored value.
pub const DID_MAX_SIZE: u32 = 8;
/// Offset of the DID region within the store.
pub const DID_REGION_OFFSET: u32 = 0;
/// Size in bytes of the DID region.
pub const DID_REGION_SIZE: u32 = DID_COUNT * DID_MAX_SIZE;

/// Number of DTC slots the catalogue has room for.
pub const DTC_COUNT: u32 = 5;
/// Size in bytes of one DTC slot (code + status + snapshot + padding).
pub const DTC_SLOT_SIZE: u32 = 32;
/// Offset of the DTC region within the store, immediately after the DID region.
pub const DTC_REGION_OFFSET: u32 = DID_REGION_OFFSET + DID_REGION_SIZE;
/// Size in bytes of the DTC region.
pub const DTC_REGION_SIZE: u32 = DTC_COUNT * DTC_SLOT_SIZE;

/// Per-DID byte offset within the DID region, indexed by registry order
/// (see `did::DID_TABLE`).
pub const DID_ENGINE_TEMP_OFFSET: u32 = DID_REGION_OFFSET;
/// Offset of the second DID's stored value.
pub const DID_ENGINE_LIGHT_OFFSET: u32 = DID_REGION_OFFSET + DID_MAX_SIZE;
/// Offset of the third DID's stored value.
pub const DID_THRESHOLD_OFFSET: u32 = DID_REGION_OFFSET + 2 * DID_MAX_SIZE;

/// Abstract interface to a non-volatile byte store.
///
/// Mirrors the split `channel::CanChannel` draws between a logical
/// interface and its concrete error type: callers only ever see
/// [StoreError], never a backend-specific failure mode.
pub trait NvmBackend: Send {
    /// Reads `dest.len()` bytes starting at `offset`.
    fn read(&mut self, offset: u32, dest: &mut [u8]) -> Result<(), StoreError>;

    /// Writes `data` starting at `offset`.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StoreError>;

    /// Erases `len` bytes starting at `offset` back to `0xFF`.
    fn erase(&mut self, offset: u32, len: u32) -> Result<(), StoreError>;
}

/// An in-memory, all-`0xFF`-initialized stand-in for the real FlexNVM/EEPROM
/// driver, which is out of scope for this crate (the physical flash
/// controller is platform hardware, not diagnostic logic).
#[derive(Debug, Clone)]
pub struct SimulatedNvm {
    bytes: Vec<u8>,
}

impl SimulatedNvm {
    /// Creates a new simulated store of `NVM_SIZE` bytes, fully erased.
    pub fn new() -> Self {
        Self {
            bytes: vec![0xFFu8; NVM_SIZE as usize],
        }
    }

    fn check_bounds(&self, offset: u32, len: u32) -> Result<(), StoreError> {
        if len == 0 {
            return Err(StoreError::InvalidParam);
        }
        let end = offset.checked_add(len).ok_or(StoreError::InvalidParam)?;
        if end > self.bytes.len() as u32 {
            return Err(StoreError::InvalidParam);
        }
        Ok(())
    }
}

impl Default for SimulatedNvm {
    fn default() -> Self {
        Self::new()
    }
}

impl NvmBackend for SimulatedNvm {
    fn read(&mut self, offset: u32, dest: &mut [u8]) -> Result<(), StoreError> {
        self.check_bounds(offset, dest.len() as u32)?;
        let start = offset as usize;
        dest.copy_from_slice(&self.bytes[start..start + dest.len()]);
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StoreError> {
        self.check_bounds(offset, data.len() as u32)?;
        let start = offset as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn erase(&mut self, offset: u32, len: u32) -> Result<(), StoreError> {
        self.check_bounds(offset, len)?;
        let start = offset as usize;
        let end = start + len as usize;
        for b in &mut self.bytes[start..end] {
            *b = 0xFF;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_store_is_erased() {
        let mut nvm = SimulatedNvm::new();
        let mut buf = [0u8; 4];
        nvm.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut nvm = SimulatedNvm::new();
        nvm.write(DTC_REGION_OFFSET, &[1, 2, 3, 4]).unwrap();
        let mut buf = [0u8; 4];
        nvm.read(DTC_REGION_OFFSET, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn out_of_bounds_access_is_rejected() {
        let mut nvm = SimulatedNvm::new();
        let mut buf = [0u8; 4];
        assert_eq!(
            nvm.read(NVM_SIZE - 2, &mut buf),
            Err(StoreError::InvalidParam)
        );
        assert_eq!(
            nvm.write(NVM_SIZE - 2, &buf),
            Err(StoreError::InvalidParam)
        );
    }

    #[test]
    fn erase_resets_to_0xff() {
        let mut nvm = SimulatedNvm::new();
        nvm.write(0, &[1, 2, 3, 4]).unwrap();
        nvm.erase(0, 4).unwrap();
        let mut buf = [0u8; 4];
        nvm.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn regions_do_not_overlap() {
        assert_eq!(DID_REGION_SIZE, DID_COUNT * DID_MAX_SIZE);
        assert_eq!(DTC_REGION_OFFSET, DID_REGION_OFFSET + DID_REGION_SIZE);
        assert!(DTC_REGION_OFFSET + DTC_REGION_SIZE <= NVM_SIZE);
    }
}
