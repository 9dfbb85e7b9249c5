//! Service 0x22: Read Data By Identifier
//!
//! Request shape: `[0x22, did1_hi, did1_lo, did2_hi, did2_lo, ...]` — one or
//! more DID pairs. Every supported DID in the request contributes
//! `[did_hi, did_lo, val_hi, val_lo]` to the response; unsupported DIDs are
//! silently skipped unless none of the requested DIDs are supported, which
//! is rejected outright.

use super::{nrc, ResponseFlow};
use crate::did;
use crate::sensor::SensorBackend;
use crate::store::NvmBackend;

/// Upper bound on a positive response's payload length, mirroring the
/// original firmware's convention of small fixed-size static response
/// buffers (e.g. `sf_reportDTCByStatusMask`'s `1 + DTC_COUNT * 4`).
pub const MAX_RESPONSE_LEN: usize = 255;

/// Handles a Read Data By Identifier request.
pub fn handle(pdu: &[u8], nvm: &mut impl NvmBackend, sensor: &mut impl SensorBackend) -> ResponseFlow {
    if pdu.len() < 3 || (pdu.len() - 1) % 2 != 0 {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }

    let mut payload = Vec::new();
    let mut any_supported = false;
    for pair in pdu[1..].chunks_exact(2) {
        let requested_did = ((pair[0] as u16) << 8) | pair[1] as u16;
        let Some(entry) = did::find_did(requested_did) else {
            continue;
        };
        any_supported = true;
        match did::read(nvm, sensor, entry) {
            Ok(value) => {
                payload.push(pair[0]);
                payload.push(pair[1]);
                payload.extend_from_slice(&value);
            }
            Err(_) => return ResponseFlow::Negative(nrc::GENERAL_PROGRAMMING_FAILURE),
        }
    }

    if !any_supported {
        return ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE);
    }
    if payload.len() > MAX_RESPONSE_LEN {
        return ResponseFlow::Negative(nrc::RESPONSE_TOO_LONG);
    }
    ResponseFlow::Positive(payload)
}
