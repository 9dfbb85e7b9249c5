//! Diagnostic Trouble Code (DTC) catalogue
//!
//! Grounded in `can_pal_s32k144/src/dtc.c` and `inc/dtc.h` from the original
//! firmware: a fixed number of fixed-size slots inside the store's DTC
//! region, addressed by a FIFO overwrite cursor when no matching or empty
//! slot exists. The record layout and the `bitflags`-backed status mask
//! are idiomatic replacements for the original's raw byte buffer and
//! `#define`d status bits.

use crate::store::{NvmBackend, DTC_COUNT, DTC_REGION_OFFSET, DTC_SLOT_SIZE};
use bitflags::bitflags;

bitflags! {
    /// DTC status byte, per ISO 14229-1 Table 140's status availability mask.
    ///
    /// All 8 bits are named (matching `dtc.h`'s `DTC_STATUS_*` defines) so the
    /// mask is never truncated: the store treats this byte as opaque and must
    /// preserve whatever the tester or the firmware wrote, bit 7 included.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct DtcStatusMask: u8 {
        /// DTC test failed on the most recent test.
        const TEST_FAILED = 0x01;
        /// DTC test failed at least once since the last clear.
        const TEST_FAILED_THIS_OPERATION_CYCLE = 0x02;
        /// DTC test has not yet matured past the debounce counter.
        const PENDING_DTC = 0x04;
        /// DTC is confirmed (has matured past the debounce counter).
        const CONFIRMED_DTC = 0x08;
        /// DTC has not completed testing since the last clear.
        const TEST_NOT_COMPLETED_SINCE_LAST_CLEAR = 0x10;
        /// DTC test failed at least once since the last clear.
        const TEST_FAILED_SINCE_LAST_CLEAR = 0x20;
        /// DTC has not completed testing this operation cycle.
        const TEST_NOT_COMPLETED_THIS_OPERATION_CYCLE = 0x40;
        /// DTC triggered the malfunction indicator lamp at least once.
        const WARNING_INDICATOR_REQUESTED = 0x80;
    }
}

/// Freeze-frame style snapshot captured at the moment a DTC was set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct DtcSnapshot {
    /// Engine temperature at the time the DTC was set.
    pub temperature: u8,
    /// Day of month (1-31) the DTC was set.
    pub day: u8,
    /// Month (1-12) the DTC was set.
    pub month: u8,
    /// Year the DTC was set, stored big-endian on the wire/slot.
    pub year: u16,
}

/// One DTC catalogue entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DtcRecord {
    /// 24-bit DTC code (top byte of the 32-bit field is always zero).
    pub code: u32,
    /// Current status mask.
    pub status: DtcStatusMask,
    /// Snapshot captured when the DTC was last set.
    pub snapshot: DtcSnapshot,
}

const CODE_MASK: u32 = 0x00FF_FFFF;
const ERASED_CODE: u32 = 0x00FF_FFFF;
const CLEARED_CODE: u32 = 0;

impl DtcRecord {
    fn to_slot_bytes(self) -> [u8; DTC_SLOT_SIZE as usize] {
        let mut buf = [0xFFu8; DTC_SLOT_SIZE as usize];
        let code = self.code & CODE_MASK;
        buf[0] = (code & 0xFF) as u8;
        buf[1] = ((code >> 8) & 0xFF) as u8;
        buf[2] = ((code >> 16) & 0xFF) as u8;
        buf[3] = self.status.bits();
        buf[4] = self.snapshot.temperature;
        buf[5] = self.snapshot.day;
        buf[6] = self.snapshot.month;
        buf[7] = (self.snapshot.year >> 8) as u8;
        buf[8] = (self.snapshot.year & 0xFF) as u8;
        buf
    }

    fn from_slot_bytes(buf: &[u8]) -> Self {
        let code = buf[0] as u32 | ((buf[1] as u32) << 8) | ((buf[2] as u32) << 16);
        DtcRecord {
            code,
            status: DtcStatusMask::from_bits_retain(buf[3]),
            snapshot: DtcSnapshot {
                temperature: buf[4],
                day: buf[5],
                month: buf[6],
                year: ((buf[7] as u16) << 8) | buf[8] as u16,
            },
        }
    }
}

/// Slot-indexed DTC catalogue cursor, operating on whatever [NvmBackend] the
/// responder hands it.
///
/// Does not own the backend itself: the DTC region shares one physical
/// store with the DID region (see `store.rs`), so the responder owns the
/// single [NvmBackend] instance and passes it to each call here, the same
/// way it is passed to `did::read`/`did::write`.
///
/// `find`/`find_empty` are kept as two separate operations rather than one
/// that special-cases a sentinel code: the original firmware's
/// `DTC_Find(0xFFFFFFFF)` overloaded "search for an empty slot" onto the
/// same function as "search for a code", which this type splits into two
/// named methods instead.
#[derive(Debug, Default)]
pub struct DtcCatalogue {
    next_overwrite: u32,
}

impl DtcCatalogue {
    /// Creates a catalogue cursor. Does not alter the backend's contents.
    pub fn new() -> Self {
        Self { next_overwrite: 0 }
    }

    fn slot_offset(index: u32) -> u32 {
        DTC_REGION_OFFSET + index * DTC_SLOT_SIZE
    }

    fn read_slot(&self, nvm: &mut impl NvmBackend, index: u32) -> DtcRecord {
        let mut buf = [0u8; DTC_SLOT_SIZE as usize];
        // The region is always in-bounds for index < DTC_COUNT; a backend
        // failure here indicates a corrupt store, not a caller error, so we
        // fall back to reporting the slot as erased.
        if nvm.read(Self::slot_offset(index), &mut buf).is_err() {
            return DtcRecord {
                code: ERASED_CODE,
                status: DtcStatusMask::empty(),
                snapshot: DtcSnapshot::default(),
            };
        }
        DtcRecord::from_slot_bytes(&buf)
    }

    /// Number of slots the catalogue has room for.
    pub fn count(&self) -> u32 {
        DTC_COUNT
    }

    /// Returns the slot index currently holding `code`, if any.
    pub fn find(&self, nvm: &mut impl NvmBackend, code: u32) -> Option<u32> {
        let code = code & CODE_MASK;
        (0..DTC_COUNT).find(|&i| self.read_slot(nvm, i).code & CODE_MASK == code)
    }

    /// Returns the index of the first erased (never-used) slot, if any.
    pub fn find_empty(&self, nvm: &mut impl NvmBackend) -> Option<u32> {
        (0..DTC_COUNT).find(|&i| self.read_slot(nvm, i).code & CODE_MASK == ERASED_CODE)
    }

    /// Sets (creating or updating) the record for `code`.
    ///
    /// Slot selection priority, matching the original firmware: an existing
    /// slot for this code, else the first empty slot, else the FIFO
    /// overwrite cursor (which then advances, wrapping at `DTC_COUNT`).
    pub fn set(
        &mut self,
        nvm: &mut impl NvmBackend,
        code: u32,
        status: DtcStatusMask,
        snapshot: DtcSnapshot,
    ) {
        let index = if let Some(i) = self.find(nvm, code) {
            i
        } else if let Some(i) = self.find_empty(nvm) {
            i
        } else {
            let i = self.next_overwrite;
            self.next_overwrite = (self.next_overwrite + 1) % DTC_COUNT;
            i
        };
        let record = DtcRecord {
            code: code & CODE_MASK,
            status,
            snapshot,
        };
        let _ = nvm.write(Self::slot_offset(index), &record.to_slot_bytes());
    }

    /// Reads the record stored at `index`, if the slot holds a live DTC
    /// (neither erased nor cleared).
    pub fn get(&self, nvm: &mut impl NvmBackend, index: u32) -> Option<DtcRecord> {
        if index >= DTC_COUNT {
            return None;
        }
        let record = self.read_slot(nvm, index);
        let masked = record.code & CODE_MASK;
        if masked == ERASED_CODE || masked == CLEARED_CODE {
            None
        } else {
            Some(record)
        }
    }

    /// Clears the record at `index` back to the "no DTC" sentinel, without
    /// erasing the slot (so `find_empty` will not reuse it ahead of truly
    /// erased slots, matching the original's distinct erased-vs-cleared
    /// states).
    pub fn clear(&self, nvm: &mut impl NvmBackend, index: u32) {
        if index >= DTC_COUNT {
            return;
        }
        let record = DtcRecord {
            code: CLEARED_CODE,
            status: DtcStatusMask::empty(),
            snapshot: DtcSnapshot::default(),
        };
        let _ = nvm.write(Self::slot_offset(index), &record.to_slot_bytes());
    }

    /// Iterates over every currently-live DTC record (skipping erased and
    /// cleared slots), in slot order.
    pub fn iter_live(&self, nvm: &mut impl NvmBackend) -> Vec<(u32, DtcRecord)> {
        (0..DTC_COUNT)
            .filter_map(|i| self.get(nvm, i).map(|r| (i, r)))
            .collect()
    }
}
