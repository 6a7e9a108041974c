//! The sink persona.
//!
//! Attaches with Rd/Ra terminations, requests the first offered PDO and answers discovery VDMs.
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::millivolt;
use usbpd_partner_traits::CcStatus;

use super::vdm::{self, Response};
use super::{Notification, Notifications, PartnerState, SinkState, State, notify};
use crate::protocol_layer::message::Message;
use crate::protocol_layer::message::data::Data;
use crate::protocol_layer::message::data::request::{FixedVariableSupply, PowerSource};
use crate::protocol_layer::message::data::sink_capabilities::{SinkCapabilities, SinkFixedSupply, SinkPowerDataObject};
use crate::protocol_layer::message::header::{ControlMessageType, DataMessageType, MessageType};
use crate::units::{ElectricCurrent, ElectricPotential};

/// The current that the sink persona requests from the first PDO.
const REQUEST_CURRENT_MA: u32 = 1500;

/// The current that the sink persona reports in its capabilities.
const OPERATIONAL_CURRENT_MA: u32 = 2000;

impl PartnerState {
    pub(super) fn sink_step(&mut self, state: SinkState, notifications: &mut Notifications) {
        if state == SinkState::Attach {
            self.electrical.vbus_present = false;
            self.electrical.cc1 = CcStatus::Rd;
            self.electrical.cc2 = CcStatus::Ra;
            notify(notifications, Notification::CcChanged);
            self.state = State::Sink(SinkState::AdvertiseSinkReady);
        }
    }

    /// Handle a message that the port manager sent to the sink persona.
    pub(super) fn sink_receive(&mut self, message: &Message, notifications: &mut Notifications) {
        let State::Sink(state) = self.state else {
            return;
        };

        match message.header.message_type() {
            MessageType::Control(control) => match control {
                ControlMessageType::GoodCRC
                | ControlMessageType::GotoMin
                | ControlMessageType::Accept
                | ControlMessageType::Ping
                | ControlMessageType::Wait => (),
                ControlMessageType::PsRdy => {
                    if state == SinkState::AdvertiseSinkReady {
                        info!("Explicit contract established");
                        self.state = State::Sink(SinkState::Run);
                    }
                }
                ControlMessageType::Reject
                | ControlMessageType::GetSourceCap
                | ControlMessageType::DrSwap
                | ControlMessageType::PrSwap
                | ControlMessageType::VconnSwap => self.protocol_violation(message, notifications),
                ControlMessageType::GetSinkCap => self.queue_sink_capabilities(),
                ControlMessageType::SoftReset => self.message_id.reset(),
                ControlMessageType::Reserved(_) => debug!("Ignoring reserved control message"),
            },
            MessageType::Data(_) => match &message.payload {
                Some(Data::SourceCapabilities(_)) if state == SinkState::Run => {
                    self.protocol_violation(message, notifications)
                }
                Some(Data::SourceCapabilities(_)) => self.queue_request(),
                Some(Data::Request(_)) | Some(Data::SinkCapabilities(_)) => {
                    self.protocol_violation(message, notifications)
                }
                Some(Data::VendorDefined((header, vdos))) => match vdm::respond(header, vdos) {
                    Response::Reply(reply) => self.queue_data(DataMessageType::VendorDefined, reply),
                    Response::NoResponse => (),
                },
                Some(Data::Unknown(_)) | None => debug!("Ignoring data message"),
            },
        }
    }

    /// Request the first PDO.
    fn queue_request(&mut self) {
        let current = ElectricCurrent::new::<milliampere>(REQUEST_CURRENT_MA);
        let request = FixedVariableSupply::new(1, current, current).with_usb_communications_capable(true);

        self.queue_data(
            DataMessageType::Request,
            Data::Request(PowerSource::FixedVariableSupply(request)),
        );
    }

    fn queue_sink_capabilities(&mut self) {
        let pdo = SinkFixedSupply::new(
            ElectricPotential::new::<millivolt>(5000),
            ElectricCurrent::new::<milliampere>(OPERATIONAL_CURRENT_MA),
        )
        .with_usb_communications_capable(true);

        self.queue_data(
            DataMessageType::SinkCapabilities,
            Data::SinkCapabilities(SinkCapabilities::new(&[SinkPowerDataObject::FixedSupply(pdo)])),
        );
    }
}
