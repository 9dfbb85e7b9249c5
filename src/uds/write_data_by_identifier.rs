//! Service 0x2E: Write Data By Identifier
//!
//! Request shape: `[0x2E, did_hi, did_lo, value...]`. Unknown DIDs,
//! non-writable DIDs, a value length mismatch, and an out-of-range value
//! are all rejected before touching the store.

use super::{nrc, ResponseFlow};
use crate::did;
use crate::store::NvmBackend;

/// Largest value this core accepts for a writable DID, matching the 12-bit
/// range of the ADC samples the other DIDs report.
const MAX_WRITABLE_VALUE: u16 = 4095;

/// Handles a Write Data By Identifier request.
pub fn handle(pdu: &[u8], nvm: &mut impl NvmBackend) -> ResponseFlow {
    if pdu.len() < 4 || pdu.len() > 6 {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }
    let requested_did = ((pdu[1] as u16) << 8) | pdu[2] as u16;
    let value = &pdu[3..];

    let Some(entry) = did::find_did(requested_did) else {
        return ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE);
    };
    if !entry.writable {
        return ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE);
    }
    if value.len() != entry.len as usize {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }
    if entry.len == 2 {
        let requested_value = ((value[0] as u16) << 8) | value[1] as u16;
        if requested_value > MAX_WRITABLE_VALUE {
            return ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE);
        }
    }

    match did::write(nvm, entry, value) {
        Ok(()) => ResponseFlow::Positive(vec![pdu[1], pdu[2]]),
        Err(_) => ResponseFlow::Negative(nrc::GENERAL_PROGRAMMING_FAILURE),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::did::{self as didmod, DID_ENGINE_TEMP, DID_THRESHOLD};
    use crate::sensor::SimulatedSensor;
    use crate::store::SimulatedNvm;

    #[test]
    fn writes_a_writable_did() {
        let mut nvm = SimulatedNvm::new();
        let pdu = [0x2E, (DID_THRESHOLD >> 8) as u8, DID_THRESHOLD as u8, 0x0A, 0xBC];
        let flow = handle(&pdu, &mut nvm);
        assert_eq!(
            flow,
            ResponseFlow::Positive(vec![(DID_THRESHOLD >> 8) as u8, DID_THRESHOLD as u8])
        );
        let entry = didmod::find_did(DID_THRESHOLD).unwrap();
        let mut sensor = SimulatedSensor::new();
        assert_eq!(didmod::read(&mut nvm, &mut sensor, entry).unwrap(), vec![0x0A, 0xBC]);
    }

    #[test]
    fn read_only_did_is_rejected() {
        let mut nvm = SimulatedNvm::new();
        let pdu = [
            0x2E,
            (DID_ENGINE_TEMP >> 8) as u8,
            DID_ENGINE_TEMP as u8,
            0x00,
            0x01,
        ];
        assert_eq!(
            handle(&pdu, &mut nvm),
            ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE)
        );
    }

    #[test]
    fn value_above_4095_is_out_of_range() {
        let mut nvm = SimulatedNvm::new();
        let pdu = [0x2E, (DID_THRESHOLD >> 8) as u8, DID_THRESHOLD as u8, 0x10, 0x00];
        assert_eq!(
            handle(&pdu, &mut nvm),
            ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE)
        );
    }

    #[test]
    fn wrong_value_length_is_rejected() {
        let mut nvm = SimulatedNvm::new();
        let pdu = [
            0x2E,
            (DID_THRESHOLD >> 8) as u8,
            DID_THRESHOLD as u8,
            0x01,
        ];
        assert_eq!(
            handle(&pdu, &mut nvm),
            ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT)
        );
    }
}
