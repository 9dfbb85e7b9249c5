//! Service 0x14: Clear Diagnostic Information
//!
//! Request shape per ISO 14229-1: `[0x14, groupOfDTC_hi, groupOfDTC_mid, groupOfDTC_lo]`,
//! four bytes total — matching `requestMsg->dlc == 5` / length-byte `== 4` in
//! the original firmware's equivalent single-frame framing.

use super::{nrc, ResponseFlow};
use crate::dtc::DtcCatalogue;
use crate::store::NvmBackend;

/// `groupOfDTC` value meaning "clear every DTC", per ISO 14229-1.
pub const GROUP_OF_DTC_ALL: u32 = 0x00FF_FFFF;

/// Handles a Clear Diagnostic Information request.
pub fn handle(pdu: &[u8], nvm: &mut impl NvmBackend, dtc: &mut DtcCatalogue) -> ResponseFlow {
    if pdu.len() != 4 {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }
    let group = ((pdu[1] as u32) << 16) | ((pdu[2] as u32) << 8) | pdu[3] as u32;

    if group == GROUP_OF_DTC_ALL {
        for (index, _) in dtc.iter_live(nvm) {
            dtc.clear(nvm, index);
        }
    } else if let Some(index) = dtc.find(nvm, group) {
        dtc.clear(nvm, index);
    }
    // Clearing a group with no matching DTCs is still a positive response,
    // per ISO 14229-1 — there is nothing to reject.
    ResponseFlow::Positive(Vec::new())
}
