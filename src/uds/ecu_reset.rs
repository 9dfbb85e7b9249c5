//! Service 0x11: ECU Reset
//!
//! This core supports exactly one reset type, hard reset, carried in the
//! sub-function's low 7 bits; bit 7 is `suppressPositiveResponse`. The
//! physical reset sequence itself is out of scope (platform hardware, not
//! diagnostic logic) and is reached only through [PlatformReset::reset].

use super::{nrc, ResponseFlow};
use crate::platform::PlatformReset;

/// The only reset type this ECU accepts.
pub const HARD_RESET: u8 = 0x01;
const SUPPRESS_POSITIVE_RESPONSE_BIT: u8 = 0x80;

/// Handles an ECU Reset request. `pdu` is `[0x11, sub_function]`.
///
/// A `suppressPositiveResponse` request resets immediately and returns
/// `ResponseFlow::None`; otherwise the reset happens only after the positive
/// response has been handed to the transport, which is the caller's
/// responsibility (see `responder::Responder::run_once`) since this
/// function has no access to the wire.
pub fn handle(pdu: &[u8], platform: &mut impl PlatformReset) -> ResponseFlow {
    if pdu.len() != 2 {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    }
    let sub_function = pdu[1];
    let suppress_positive_response = sub_function & SUPPRESS_POSITIVE_RESPONSE_BIT != 0;
    let reset_type = sub_function & !SUPPRESS_POSITIVE_RESPONSE_BIT;
    if reset_type != HARD_RESET {
        return ResponseFlow::Negative(nrc::SUB_FUNCTION_NOT_SUPPORTED);
    }

    if suppress_positive_response {
        platform.reset();
        return ResponseFlow::None;
    }
    ResponseFlow::Positive(vec![sub_function])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::platform::SimulatedPlatform;

    #[test]
    fn hard_reset_is_accepted_and_echoed() {
        let mut platform = SimulatedPlatform::new();
        assert_eq!(
            handle(&[0x11, HARD_RESET], &mut platform),
            ResponseFlow::Positive(vec![HARD_RESET])
        );
        assert_eq!(platform.reset_count(), 0);
    }

    #[test]
    fn suppressed_positive_response_resets_immediately_with_no_reply() {
        let mut platform = SimulatedPlatform::new();
        let flow = handle(&[0x11, HARD_RESET | SUPPRESS_POSITIVE_RESPONSE_BIT], &mut platform);
        assert_eq!(flow, ResponseFlow::None);
        assert_eq!(platform.reset_count(), 1);
    }

    #[test]
    fn other_reset_types_are_rejected() {
        let mut platform = SimulatedPlatform::new();
        assert_eq!(
            handle(&[0x11, 0x03], &mut platform),
            ResponseFlow::Negative(nrc::SUB_FUNCTION_NOT_SUPPORTED)
        );
        assert_eq!(platform.reset_count(), 0);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut platform = SimulatedPlatform::new();
        assert_eq!(
            handle(&[0x11], &mut platform),
            ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT)
        );
    }
}
