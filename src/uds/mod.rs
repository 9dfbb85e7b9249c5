//! UDS (ISO 14229-1) service dispatcher
//!
//! One submodule per supported service (`uds::ecu_reset`,
//! `uds::clear_diagnostic_information`, `uds::read_dtc_information`, ...),
//! each parsing a *request* and building a *response* rather than the other
//! way around, since this crate plays the ECU's part of the conversation
//! rather than a tester's. `dispatch` is the single entry point the
//! responder calls with one fully reassembled ISO-TP PDU.

pub mod clear_diagnostic_information;
pub mod ecu_reset;
pub mod read_data_by_identifier;
pub mod read_dtc_information;
pub mod write_data_by_identifier;

use crate::dtc::DtcCatalogue;
use crate::platform::PlatformReset;
use crate::sensor::SensorBackend;
use crate::store::NvmBackend;

/// Service IDs this responder implements.
pub mod sid {
    /// ECU Reset
    pub const ECU_RESET: u8 = 0x11;
    /// Clear Diagnostic Information
    pub const CLEAR_DIAGNOSTIC_INFORMATION: u8 = 0x14;
    /// Read DTC Information
    pub const READ_DTC_INFORMATION: u8 = 0x19;
    /// Read Data By Identifier
    pub const READ_DATA_BY_IDENTIFIER: u8 = 0x22;
    /// Write Data By Identifier
    pub const WRITE_DATA_BY_IDENTIFIER: u8 = 0x2E;
}

/// Negative Response Codes this responder can produce.
pub mod nrc {
    /// General reject, no more specific NRC applies.
    pub const GENERAL_REJECT: u8 = 0x10;
    /// The service identifier is not supported by this ECU.
    pub const SERVICE_NOT_SUPPORTED: u8 = 0x11;
    /// The sub-function is not supported for this service.
    pub const SUB_FUNCTION_NOT_SUPPORTED: u8 = 0x12;
    /// The request message length or format is invalid for this service/sub-function.
    pub const INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT: u8 = 0x13;
    /// The positive response payload would exceed the response buffer.
    pub const RESPONSE_TOO_LONG: u8 = 0x14;
    /// The request is well-formed but cannot be performed right now.
    pub const CONDITIONS_NOT_CORRECT: u8 = 0x22;
    /// A parameter in the request (DID, DTC, record number, ...) is out of range.
    pub const REQUEST_OUT_OF_RANGE: u8 = 0x31;
    /// The store rejected the operation (see [crate::error::StoreError]).
    pub const GENERAL_PROGRAMMING_FAILURE: u8 = 0x72;
}

/// Outcome of dispatching one UDS request.
///
/// A sum type rather than a mutable transaction-context struct with a flow
/// discriminator field: each handler returns exactly the one outcome it
/// produced, instead of mutating shared state that a caller must remember
/// to reset between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFlow {
    /// No response should be sent (reserved for services/sub-functions with
    /// a suppress-positive-response bit; unused by the services this
    /// responder implements today, but part of the contract every handler
    /// returns against).
    None,
    /// A positive response; payload excludes the response SID, which
    /// `dispatch` prepends.
    Positive(Vec<u8>),
    /// A negative response with the given NRC.
    Negative(u8),
}

/// Everything a service handler needs: the DTC catalogue cursor, the
/// single non-volatile store instance backing both the DTC and DID regions,
/// and the narrow ADC/reset primitives a handful of services consume.
#[derive(Debug)]
pub struct EcuContext<'a, N: NvmBackend, S: SensorBackend, P: PlatformReset> {
    /// The backing store, shared by the DID region and the DTC region.
    pub nvm: &'a mut N,
    /// DTC catalogue cursor (FIFO eviction state); the records themselves
    /// live in `nvm`.
    pub dtc: &'a mut DtcCatalogue,
    /// ADC sampling, consumed only by ADC-backed DIDs (service 0x22).
    pub sensor: &'a mut S,
    /// Platform reset primitive, consumed only by ECU Reset (service 0x11).
    pub platform: &'a mut P,
}

/// Dispatches one reassembled UDS request PDU (`[SID, ...]`, no ISO-TP
/// framing) to the matching service handler.
pub fn dispatch<N: NvmBackend, S: SensorBackend, P: PlatformReset>(
    pdu: &[u8],
    ctx: &mut EcuContext<N, S, P>,
) -> ResponseFlow {
    let Some(&service_id) = pdu.first() else {
        return ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT);
    };
    log::debug!("dispatching UDS service {service_id:#04x}");

    let flow = match service_id {
        sid::ECU_RESET => ecu_reset::handle(pdu, ctx.platform),
        sid::CLEAR_DIAGNOSTIC_INFORMATION => {
            clear_diagnostic_information::handle(pdu, ctx.nvm, ctx.dtc)
        }
        sid::READ_DTC_INFORMATION => read_dtc_information::handle(pdu, ctx.nvm, ctx.dtc),
        sid::READ_DATA_BY_IDENTIFIER => read_data_by_identifier::handle(pdu, ctx.nvm, ctx.sensor),
        sid::WRITE_DATA_BY_IDENTIFIER => write_data_by_identifier::handle(pdu, ctx.nvm),
        _ => ResponseFlow::Negative(nrc::SERVICE_NOT_SUPPORTED),
    };

    if let ResponseFlow::Negative(code) = flow {
        log::debug!("service {service_id:#04x} rejected with NRC {code:#04x}");
    }
    flow
}

/// Builds the raw UDS response bytes (sans ISO-TP framing) for a dispatched
/// [ResponseFlow], or `None` if nothing should be sent.
///
/// Mirrors `UDS_SendResponse`'s response-shape logic from the original
/// firmware: negative responses are always `[0x7F, original_sid, nrc]`;
/// positive responses are `[original_sid + 0x40, payload...]`.
pub fn build_response(service_id: u8, flow: ResponseFlow) -> Option<Vec<u8>> {
    match flow {
        ResponseFlow::None => None,
        ResponseFlow::Negative(code) => Some(vec![0x7F, service_id, code]),
        ResponseFlow::Positive(payload) => {
            let mut out = Vec::with_capacity(1 + payload.len());
            out.push(service_id + 0x40);
            out.extend_from_slice(&payload);
            Some(out)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::platform::SimulatedPlatform;
    use crate::sensor::SimulatedSensor;
    use crate::store::SimulatedNvm;

    #[test]
    fn unknown_service_is_rejected() {
        let mut nvm = SimulatedNvm::new();
        let mut dtc = DtcCatalogue::new();
        let mut sensor = SimulatedSensor::new();
        let mut platform = SimulatedPlatform::new();
        let mut ctx = EcuContext {
            nvm: &mut nvm,
            dtc: &mut dtc,
            sensor: &mut sensor,
            platform: &mut platform,
        };
        let flow = dispatch(&[0xBA], &mut ctx);
        assert_eq!(flow, ResponseFlow::Negative(nrc::SERVICE_NOT_SUPPORTED));
    }

    #[test]
    fn empty_pdu_is_rejected() {
        let mut nvm = SimulatedNvm::new();
        let mut dtc = DtcCatalogue::new();
        let mut sensor = SimulatedSensor::new();
        let mut platform = SimulatedPlatform::new();
        let mut ctx = EcuContext {
            nvm: &mut nvm,
            dtc: &mut dtc,
            sensor: &mut sensor,
            platform: &mut platform,
        };
        let flow = dispatch(&[], &mut ctx);
        assert_eq!(
            flow,
            ResponseFlow::Negative(nrc::INCORRECT_MESSAGE_LENGTH_OR_INVALID_FORMAT)
        );
    }

    #[test]
    fn build_response_shapes_negative_and_positive() {
        assert_eq!(
            build_response(0x19, ResponseFlow::Negative(nrc::REQUEST_OUT_OF_RANGE)),
            Some(vec![0x7F, 0x19, nrc::REQUEST_OUT_OF_RANGE])
        );
        assert_eq!(
            build_response(0x22, ResponseFlow::Positive(vec![0xF1, 0x90, 42])),
            Some(vec![0x62, 0xF1, 0x90, 42])
        );
        assert_eq!(build_response(0x11, ResponseFlow::None), None);
    }
}
