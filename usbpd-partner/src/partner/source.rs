//! The source persona.
//!
//! Attaches with an Rp 3.0 A termination, ramps up VBUS, offers a single 5 V PDO and accepts any
//! request for it.
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::millivolt;
use usbpd_partner_traits::CcStatus;

use super::{Notification, Notifications, PartnerState, SourceState, State, notify};
use crate::protocol_layer::message::Message;
use crate::protocol_layer::message::data::Data;
use crate::protocol_layer::message::data::source_capabilities::{FixedSupply, PowerDataObject, SourceCapabilities};
use crate::protocol_layer::message::header::{ControlMessageType, DataMessageType, MessageType};
use crate::timers::TimerType;
use crate::units::{ElectricCurrent, ElectricPotential};

/// The maximum current that the source persona offers.
const MAX_CURRENT_MA: u32 = 3000;

impl PartnerState {
    pub(super) fn source_step(&mut self, state: SourceState, timeout: bool, notifications: &mut Notifications) {
        let idle = !self.requests.msg_rx();

        match state {
            SourceState::Attach => {
                self.electrical.cc1 = CcStatus::Open;
                self.electrical.cc2 = CcStatus::Rp3_0;
                notify(notifications, Notification::CcChanged);
                self.delay = Some(TimerType::VbusRampUp);
                self.state = State::Source(SourceState::VbusRampUp);
            }
            SourceState::VbusRampUp if timeout => {
                self.electrical.vbus_present = true;
                self.requests.set_vbus_change(true);
                self.state = State::Source(SourceState::AdvertiseSourceCapabilities);
            }
            SourceState::AdvertiseSourceCapabilities if idle && self.electrical.pd_rx_enabled => {
                self.queue_source_capabilities();
                self.state = State::Source(SourceState::AwaitRequest);
            }
            SourceState::SendAccept if idle => {
                self.queue_control(ControlMessageType::Accept);
                self.state = State::Source(SourceState::SendPowerReady);
            }
            SourceState::SendPowerReady if idle => {
                self.queue_control(ControlMessageType::PsRdy);
                info!("Explicit contract established");
                self.state = State::Source(SourceState::Run);
            }
            _ => (),
        }
    }

    /// Handle a message that the port manager sent to the source persona.
    pub(super) fn source_receive(&mut self, message: &Message, notifications: &mut Notifications) {
        let State::Source(state) = self.state else {
            return;
        };

        match message.header.message_type() {
            MessageType::Control(control) => match control {
                ControlMessageType::GoodCRC
                | ControlMessageType::GotoMin
                | ControlMessageType::Ping
                | ControlMessageType::PsRdy
                | ControlMessageType::Wait => (),
                ControlMessageType::Accept
                | ControlMessageType::Reject
                | ControlMessageType::GetSourceCap
                | ControlMessageType::GetSinkCap
                | ControlMessageType::DrSwap
                | ControlMessageType::PrSwap
                | ControlMessageType::VconnSwap => self.protocol_violation(message, notifications),
                ControlMessageType::SoftReset => self.message_id.reset(),
                ControlMessageType::Reserved(_) => debug!("Ignoring reserved control message"),
            },
            MessageType::Data(_) => match &message.payload {
                Some(Data::SourceCapabilities(_)) => self.protocol_violation(message, notifications),
                Some(Data::Request(request)) if state == SourceState::AwaitRequest => {
                    info!("Accepting request for object position {}", request.object_position());
                    self.state = State::Source(SourceState::SendAccept);
                }
                Some(Data::Request(_)) => self.protocol_violation(message, notifications),
                Some(Data::VendorDefined(_)) => debug!("Ignoring VDM, the source persona has no modes"),
                Some(Data::SinkCapabilities(_)) | Some(Data::Unknown(_)) | None => debug!("Ignoring data message"),
            },
        }
    }

    fn queue_source_capabilities(&mut self) {
        let pdo = FixedSupply::new(
            ElectricPotential::new::<millivolt>(5000),
            ElectricCurrent::new::<milliampere>(MAX_CURRENT_MA),
        )
        .with_dual_role_power(true)
        .with_externally_powered(true)
        .with_usb_communications_capable(true)
        .with_dual_role_data(true);

        self.queue_data(
            DataMessageType::SourceCapabilities,
            Data::SourceCapabilities(SourceCapabilities::new(&[PowerDataObject::FixedSupply(pdo)])),
        );
    }
}
