//! The responder's single-transaction cooperative loop
//!
//! `run_once` is a plain function rather than a thread or async task: CAN
//! hardware channels are themselves synchronous (blocking or returning
//! empty), and this crate's [CanChannel] follows the same shape, so no
//! `Arc`/`Mutex`/executor is needed to drive it.

use crate::channel::CanChannel;
use crate::dtc::DtcCatalogue;
use crate::hardware::isotp::{self, IsoTpReceiver};
use crate::platform::PlatformReset;
use crate::sensor::SensorBackend;
use crate::store::NvmBackend;
use crate::uds::{self, EcuContext};

/// Owns the state a running responder needs across calls to `run_once`:
/// the ISO-TP reassembler, the DTC catalogue cursor, the non-volatile store
/// backing both the DID and DTC regions, and the ADC/reset primitives a
/// handful of services consume.
#[derive(Debug)]
pub struct Responder<N: NvmBackend, S: SensorBackend, P: PlatformReset> {
    rx_id: u32,
    tx_id: u32,
    receiver: IsoTpReceiver,
    dtc: DtcCatalogue,
    nvm: N,
    sensor: S,
    platform: P,
}

impl<N: NvmBackend, S: SensorBackend, P: PlatformReset> Responder<N, S, P> {
    /// Creates a responder listening for requests addressed to `rx_id` and
    /// replying on `tx_id` (both raw CAN arbitration IDs).
    pub fn new(rx_id: u32, tx_id: u32, nvm: N, sensor: S, platform: P) -> Self {
        Self {
            rx_id,
            tx_id,
            receiver: IsoTpReceiver::new(),
            dtc: DtcCatalogue::new(),
            nvm,
            sensor,
            platform,
        }
    }

    /// Grants direct access to the backing store, e.g. to seed DIDs or DTCs
    /// before the responder starts serving requests.
    pub fn nvm_mut(&mut self) -> &mut N {
        &mut self.nvm
    }

    /// Grants direct access to the sensor double, e.g. to seed ADC readings
    /// before the responder starts serving requests.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Grants direct access to the platform reset primitive, e.g. to assert
    /// on the number of resets requested in a test.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Polls `channel` once. If a CAN frame addressed to this responder's
    /// `rx_id` completes a UDS request PDU, dispatches it and writes the
    /// response back onto `channel`. Returns `true` if a request was fully
    /// processed (whether or not a response was sent).
    pub fn run_once<C: CanChannel>(&mut self, channel: &mut C) -> bool {
        let Ok(Some((id, data))) = channel.try_recv_frame() else {
            return false;
        };
        if id != self.rx_id {
            return false;
        }

        let pdu = match self.receiver.on_frame(channel, self.tx_id, &data) {
            Ok(Some(pdu)) => pdu,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("ISO-TP framing error, resetting reassembly: {e}");
                self.receiver.reset();
                return false;
            }
        };

        let service_id = pdu.first().copied().unwrap_or(0);
        let mut ctx = EcuContext {
            nvm: &mut self.nvm,
            dtc: &mut self.dtc,
            sensor: &mut self.sensor,
            platform: &mut self.platform,
        };
        let flow = uds::dispatch(&pdu, &mut ctx);
        let is_positive_reset = service_id == uds::sid::ECU_RESET
            && matches!(flow, uds::ResponseFlow::Positive(_));

        if let Some(response) = uds::build_response(service_id, flow) {
            if let Err(e) = isotp::send_pdu(channel, self.tx_id, &response) {
                log::error!("failed to send UDS response: {e}");
            }
        }

        // A non-suppressed ECU Reset only resets after its positive response
        // has been handed to the transport; a suppressed one already reset
        // inside `ecu_reset::handle` and returned `ResponseFlow::None`.
        if is_positive_reset {
            self.platform.reset();
        }
        true
    }
}
