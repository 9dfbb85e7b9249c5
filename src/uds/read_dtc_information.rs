//! Service 0x19: Read DTC Information
//!
//! Sub-functions grounded byte-for-byte in `can_pal_s32k144/src/uds.c`'s
//! `sf_reportNumberOfDTCByStatusMask`, `sf_reportDTCByStatusMask`,
//! `sf_reportDTCSnapshotByDTCNumber`, and `sf_reportSupportedDTC`. The
//! original's request bytes (`requestMsg->data[0]` for the frame length,
//! `data[1]` for SID, `data[2]` for sub-function, ...) map directly onto
//! this crate's reassembled PDU once the ISO-TP PCI byte the original
//! folded into `data[0]` is accounted for: `pdu.len()` takes the place of
//! `requestMsg->data[0]`, and every subsequent index shifts left by one
//! (`pdu[1]` is the sub-function, not `data[2]`).

use super::{nrc, ResponseFlow};
use crate::dtc::DtcCatalogue;
use crate::store::NvmBackend;

/// reportNumberOfDTCByStatusMask
pub const REPORT_NUMBER_OF_DTC_BY_STATUS_MASK: u8 = 0x01;
/// reportDTCByStatusMask
pub const REPORT_DTC_BY_STATUS_MASK: u8 = 0x02;
/// reportDTCSnapshotRecordByDTCNumber
pub const REPORT_DTC_SNAPSHOT_RECORD_BY_DTC_NUMBER: u8 = 0x04;
/// reportSupportedDTC
pub const REPORT_SUPPORTED_DTC: u8 = 0x0A;

/// DTC format identifier reported alongside a count, per ISO 14229-1.
const DTC_FORMAT_ID_ISO14229_1: u8 = 0x01;

fn status_matches(status_bits: u8, requested_mask: u8) -> bool {
    requested_mask == 0xFF || (status_bits & requested_mask) == requested_mask
}

fn sf_report_number_of_dtc_by_status_mask(
    pdu: &[u8],
    nvm: &mut impl NvmBackend,
    dtc: &DtcCatalogue,
) -> ResponseFlow {
    if pdu.len() != 3 {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }
    let requested_mask = pdu[2];
    let count = dtc
        .iter_live(nvm)
        .iter()
        .filter(|(_, r)| status_matches(r.status.bits(), requested_mask))
        .count() as u16;

    ResponseFlow::Positive(vec![
        REPORT_NUMBER_OF_DTC_BY_STATUS_MASK,
        0xFF,
        DTC_FORMAT_ID_ISO14229_1,
        (count >> 8) as u8,
        (count & 0xFF) as u8,
    ])
}

fn sf_report_dtc_by_status_mask(
    pdu: &[u8],
    nvm: &mut impl NvmBackend,
    dtc: &DtcCatalogue,
) -> ResponseFlow {
    if pdu.len() != 3 {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }
    let requested_mask = pdu[2];
    let mut payload = vec![REPORT_DTC_BY_STATUS_MASK, 0xFF];
    for (_, record) in dtc.iter_live(nvm) {
        if status_matches(record.status.bits(), requested_mask) {
            payload.push((record.code >> 16) as u8);
            payload.push((record.code >> 8) as u8);
            payload.push(record.code as u8);
            payload.push(record.status.bits());
        }
    }
    ResponseFlow::Positive(payload)
}

fn sf_report_dtc_snapshot_by_dtc_number(
    pdu: &[u8],
    nvm: &mut impl NvmBackend,
    dtc: &DtcCatalogue,
) -> ResponseFlow {
    if pdu.len() != 6 {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }
    let requested_record_number = pdu[5];
    if requested_record_number != 0x01 && requested_record_number != 0xFF {
        return ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE);
    }
    let requested_dtc = ((pdu[2] as u32) << 16) | ((pdu[3] as u32) << 8) | pdu[4] as u32;

    let Some(index) = dtc.find(nvm, requested_dtc) else {
        return ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE);
    };
    let Some(record) = dtc.get(nvm, index) else {
        return ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE);
    };

    // This store keeps exactly one snapshot per DTC, always reported as
    // record number 1 regardless of which record number was requested —
    // matching the original firmware's single-snapshot limitation.
    ResponseFlow::Positive(vec![
        REPORT_DTC_SNAPSHOT_RECORD_BY_DTC_NUMBER,
        (record.code >> 16) as u8,
        (record.code >> 8) as u8,
        record.code as u8,
        record.status.bits(),
        0x01,
        record.snapshot.temperature,
        record.snapshot.day,
        record.snapshot.month,
        (record.snapshot.year >> 8) as u8,
        (record.snapshot.year & 0xFF) as u8,
    ])
}

fn sf_report_supported_dtc(
    pdu: &[u8],
    nvm: &mut impl NvmBackend,
    dtc: &DtcCatalogue,
) -> ResponseFlow {
    if pdu.len() != 2 {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }
    let mut payload = vec![REPORT_SUPPORTED_DTC, 0xFF];
    for (_, record) in dtc.iter_live(nvm) {
        payload.push((record.code >> 16) as u8);
        payload.push((record.code >> 8) as u8);
        payload.push(record.code as u8);
        payload.push(record.status.bits());
    }
    ResponseFlow::Positive(payload)
}

/// Handles a Read DTC Information request. `pdu` is `[0x19, sub_function, ...]`.
pub fn handle(pdu: &[u8], nvm: &mut impl NvmBackend, dtc: &DtcCatalogue) -> ResponseFlow {
    if pdu.len() < 2 {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }
    let sub_function = pdu[1];
    match sub_function {
        REPORT_NUMBER_OF_DTC_BY_STATUS_MASK => {
            sf_report_number_of_dtc_by_status_mask(pdu, nvm, dtc)
        }
        REPORT_DTC_BY_STATUS_MASK => sf_report_dtc_by_status_mask(pdu, nvm, dtc),
        REPORT_DTC_SNAPSHOT_RECORD_BY_DTC_NUMBER => {
            sf_report_dtc_snapshot_by_dtc_number(pdu, nvm, dtc)
        }
        REPORT_SUPPORTED_DTC => sf_report_supported_dtc(pdu, nvm, dtc),
        _ => ResponseFlow::Negative(nrc::SUB_FUNCTION_NOT_SUPPORTED),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dtc::{DtcSnapshot, DtcStatusMask};
    use crate::store::SimulatedNvm;

    fn seeded() -> (SimulatedNvm, DtcCatalogue) {
        let mut nvm = SimulatedNvm::new();
        let mut dtc = DtcCatalogue::new();
        dtc.set(
            &mut nvm,
            0x00A123,
            DtcStatusMask::CONFIRMED_DTC | DtcStatusMask::TEST_FAILED,
            DtcSnapshot {
                temperature: 95,
                day: 12,
                month: 3,
                year: 2026,
            },
        );
        dtc.set(
            &mut nvm,
            0x00B456,
            DtcStatusMask::TEST_NOT_COMPLETED_SINCE_LAST_CLEAR,
            DtcSnapshot::default(),
        );
        (nvm, dtc)
    }

    #[test]
    fn report_number_by_status_mask_counts_matches() {
        let (mut nvm, dtc) = seeded();
        let flow = handle(&[0x19, 0x01, 0xFF], &mut nvm, &dtc);
        assert_eq!(flow, ResponseFlow::Positive(vec![0x01, 0xFF, 0x01, 0x00, 0x02]));
    }

    #[test]
    fn report_by_status_mask_filters_non_matching() {
        let (mut nvm, dtc) = seeded();
        let flow = handle(
            &[0x19, 0x02, DtcStatusMask::CONFIRMED_DTC.bits()],
            &mut nvm,
            &dtc,
        );
        assert_eq!(
            flow,
            ResponseFlow::Positive(vec![
                0x02,
                0xFF,
                0x00,
                0xA1,
                0x23,
                DtcStatusMask::CONFIRMED_DTC.bits() | DtcStatusMask::TEST_FAILED.bits(),
            ])
        );
    }

    #[test]
    fn snapshot_by_dtc_number_returns_fixed_record_one() {
        let (mut nvm, dtc) = seeded();
        let flow = handle(&[0x19, 0x04, 0x00, 0xA1, 0x23, 0xFF], &mut nvm, &dtc);
        assert_eq!(
            flow,
            ResponseFlow::Positive(vec![
                0x04,
                0x00,
                0xA1,
                0x23,
                DtcStatusMask::CONFIRMED_DTC.bits() | DtcStatusMask::TEST_FAILED.bits(),
                0x01,
                95,
                12,
                3,
                0x07,
                0xEA,
            ])
        );
    }

    #[test]
    fn snapshot_rejects_unknown_record_number() {
        let (mut nvm, dtc) = seeded();
        let flow = handle(&[0x19, 0x04, 0x00, 0xA1, 0x23, 0x02], &mut nvm, &dtc);
        assert_eq!(flow, ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE));
    }

    #[test]
    fn snapshot_rejects_unknown_dtc() {
        let (mut nvm, dtc) = seeded();
        let flow = handle(&[0x19, 0x04, 0x00, 0x00, 0x01, 0x01], &mut nvm, &dtc);
        assert_eq!(flow, ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE));
    }

    #[test]
    fn report_supported_dtc_lists_everything_live() {
        let (mut nvm, dtc) = seeded();
        let flow = handle(&[0x19, 0x0A], &mut nvm, &dtc);
        assert_eq!(
            flow,
            ResponseFlow::Positive(vec![
                0x0A, 0xFF, 0x00, 0xA1, 0x23, DtcStatusMask::CONFIRMED_DTC.bits() | DtcStatusMask::TEST_FAILED.bits(),
                0x00, 0xB4, 0x56, DtcStatusMask::TEST_NOT_COMPLETED_SINCE_LAST_CLEAR.bits(),
            ])
        );
    }

    #[test]
    fn unknown_sub_function_is_rejected() {
        let (mut nvm, dtc) = seeded();
        let flow = handle(&[0x19, 0x99], &mut nvm, &dtc);
        assert_eq!(flow, ResponseFlow::Negative(nrc::SUB_FUNCTION_NOT_SUPPORTED));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let (mut nvm, dtc) = seeded();
        let flow = handle(&[0x19, 0x01, 0xFF, 0xFF], &mut nvm, &dtc);
        assert_eq!(
            flow,
            ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT)
        );
    }
}
