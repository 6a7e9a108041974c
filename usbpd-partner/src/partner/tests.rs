//! Tests for the partner's state machine.
use usbpd_partner_traits::{CcStatus, TransmitStatus, TransmitType};

use super::*;
use crate::dummy::{self, Bytes, DUMMY_CAPABILITIES};
use crate::protocol_layer::message::data::PdoState;
use crate::protocol_layer::message::data::request::PowerSource;
use crate::protocol_layer::message::data::sink_capabilities::SinkPowerDataObject;
use crate::protocol_layer::message::data::source_capabilities::{Kind, PowerDataObject};
use crate::protocol_layer::message::data::vendor_defined::VdmCommand;
use crate::protocol_layer::message::header::MessageType;

fn process(partner: &mut PartnerState) -> (Notifications, Option<TimerType>) {
    let mut notifications = Notifications::new();
    let delay = partner.process(&mut notifications);
    (notifications, delay)
}

/// Let the armed delay expire, and process what follows.
fn expire(partner: &mut PartnerState) -> (Notifications, Option<TimerType>) {
    let mut notifications = Notifications::new();
    partner.expire(partner.epoch(), &mut notifications);
    let delay = partner.process(&mut notifications);
    (notifications, delay)
}

fn transmit(partner: &mut PartnerState, transmit_type: TransmitType, data: &[u8]) -> (Notifications, Option<TimerType>) {
    partner.queue_transmission(Transmission {
        transmit_type,
        data: Bytes::from_slice(data).unwrap(),
    });
    process(partner)
}

fn transmit_sop(partner: &mut PartnerState, data: &[u8]) -> (Notifications, Option<TimerType>) {
    transmit(partner, TransmitType::Sop, data)
}

fn delivered(notifications: &Notifications) -> &Message {
    match notifications.as_slice() {
        [Notification::Receive(message)] => message,
        other => panic!("Expected one delivered message, got {:?}", other),
    }
}

fn attached_sink() -> PartnerState {
    let mut partner = PartnerState::new();
    partner.request_mode(ModeRequest::Sink);
    process(&mut partner);
    partner
}

/// A sink persona with an explicit contract.
fn running_sink() -> PartnerState {
    let mut partner = attached_sink();
    transmit_sop(&mut partner, &DUMMY_CAPABILITIES);
    expire(&mut partner);
    transmit_sop(
        &mut partner,
        &dummy::control_message(dummy::source_template(), 1, ControlMessageType::Accept),
    );
    transmit_sop(
        &mut partner,
        &dummy::control_message(dummy::source_template(), 2, ControlMessageType::PsRdy),
    );
    assert_eq!(partner.state(), State::Sink(SinkState::Run));
    partner
}

/// A source persona that has ramped up VBUS and delivered its capabilities.
fn advertising_source() -> PartnerState {
    let mut partner = PartnerState::new();
    partner.request_mode(ModeRequest::Source);
    process(&mut partner);
    expire(&mut partner);
    partner.set_pd_rx(true);
    process(&mut partner);
    expire(&mut partner);
    assert_eq!(partner.state(), State::Source(SourceState::AwaitRequest));
    partner
}

fn request_first_pdo(message_id: u8) -> Bytes {
    let current = crate::units::ElectricCurrent::new::<uom::si::electric_current::milliampere>(3000);
    dummy::data_message(
        dummy::sink_template(),
        message_id,
        DataMessageType::Request,
        Data::Request(PowerSource::FixedVariableSupply(
            crate::protocol_layer::message::data::request::FixedVariableSupply::new(1, current, current),
        )),
    )
}

#[test]
fn test_mode_request_parsing() {
    assert_eq!("snk".parse::<ModeRequest>(), Ok(ModeRequest::Sink));
    assert_eq!("src\n".parse::<ModeRequest>(), Ok(ModeRequest::Source));
    assert_eq!("reset".parse::<ModeRequest>(), Ok(ModeRequest::Reset));
    assert_eq!("none".parse::<ModeRequest>(), Ok(ModeRequest::None));
    assert_eq!("sink".parse::<ModeRequest>(), Err(ModeParseError));

    assert_eq!(std::format!("{}", Mode::Sink), "snk");
    assert_eq!(std::format!("{}", Mode::None), "none");
}

#[test]
fn test_sink_attach() {
    let mut partner = PartnerState::new();
    partner.set_vbus(true);
    process(&mut partner);

    partner.request_mode(ModeRequest::Sink);
    let (notifications, delay) = process(&mut partner);

    assert_eq!(notifications.as_slice(), &[Notification::CcChanged]);
    assert_eq!(delay, None);
    assert_eq!(partner.mode(), Mode::Sink);
    assert_eq!(partner.state(), State::Sink(SinkState::AdvertiseSinkReady));
    assert_eq!(partner.electrical().cc1, CcStatus::Rd);
    assert_eq!(partner.electrical().cc2, CcStatus::Ra);
    assert!(!partner.electrical().vbus_present);
}

#[test]
fn test_sink_requests_first_pdo() {
    let mut partner = attached_sink();

    let (notifications, delay) = transmit_sop(&mut partner, &DUMMY_CAPABILITIES);
    assert_eq!(
        notifications.as_slice(),
        &[Notification::TransmitComplete(TransmitStatus::Success)]
    );
    assert_eq!(delay, Some(TimerType::SinkResponse));
    assert!(partner.requests().msg_rx());
    assert_eq!(partner.pdo_kinds().pdo_at_object_position(1), Some(Kind::FixedSupply));

    // The request is only delivered after the response delay.
    let (notifications, delay) = expire(&mut partner);
    assert_eq!(delay, None);

    let request = delivered(&notifications);
    assert_eq!(request.header.message_id(), 0);
    assert_eq!(request.header.port_power_role(), PowerRole::Sink);
    assert_eq!(request.header.message_type(), MessageType::Data(DataMessageType::Request));

    let Some(Data::Request(PowerSource::FixedVariableSupply(rdo))) = &request.payload else {
        panic!("Expected a fixed supply request, got {:?}", request.payload);
    };
    assert_eq!(rdo.object_position(), 1);
    assert_eq!(rdo.raw_operating_current(), 150);
    assert_eq!(rdo.raw_max_operating_current(), 150);
    assert!(rdo.usb_communications_capable());
}

#[test]
fn test_sink_contract() {
    let mut partner = attached_sink();
    transmit_sop(&mut partner, &DUMMY_CAPABILITIES);
    expire(&mut partner);

    transmit_sop(
        &mut partner,
        &dummy::control_message(dummy::source_template(), 1, ControlMessageType::Accept),
    );
    assert_eq!(partner.state(), State::Sink(SinkState::AdvertiseSinkReady));

    let (notifications, delay) = transmit_sop(
        &mut partner,
        &dummy::control_message(dummy::source_template(), 2, ControlMessageType::PsRdy),
    );
    assert_eq!(
        notifications.as_slice(),
        &[Notification::TransmitComplete(TransmitStatus::Success)]
    );
    assert_eq!(delay, None);
    assert_eq!(partner.state(), State::Sink(SinkState::Run));
    assert_eq!(partner.requests(), Requests::default());
}

#[test]
fn test_sink_capabilities_in_run_is_violation() {
    let mut partner = running_sink();
    let epoch = partner.epoch();

    let (notifications, delay) = transmit_sop(&mut partner, &DUMMY_CAPABILITIES);

    assert_eq!(
        notifications.as_slice(),
        &[
            Notification::HardResetReceived,
            Notification::TransmitComplete(TransmitStatus::Success)
        ]
    );
    assert_eq!(delay, None);
    assert_eq!(partner.state(), State::Sink(SinkState::AdvertiseSinkReady));
    assert_eq!(partner.mode(), Mode::Sink);
    assert!(partner.pdo_kinds().is_empty());
    assert_eq!(partner.epoch(), epoch + 1);

    // Negotiation starts over, with fresh message IDs.
    transmit_sop(&mut partner, &DUMMY_CAPABILITIES);
    let (notifications, _) = expire(&mut partner);
    assert_eq!(delivered(&notifications).header.message_id(), 0);
}

#[test]
fn test_sink_violations() {
    for message_type in [
        ControlMessageType::Reject,
        ControlMessageType::GetSourceCap,
        ControlMessageType::DrSwap,
        ControlMessageType::PrSwap,
        ControlMessageType::VconnSwap,
    ] {
        let mut partner = running_sink();
        let (notifications, _) = transmit_sop(
            &mut partner,
            &dummy::control_message(dummy::source_template(), 3, message_type),
        );

        assert_eq!(notifications[0], Notification::HardResetReceived, "{:?}", message_type);
        assert_eq!(partner.state(), State::Sink(SinkState::AdvertiseSinkReady));
    }
}

#[test]
fn test_sink_capabilities_reply() {
    let mut partner = running_sink();

    transmit_sop(
        &mut partner,
        &dummy::control_message(dummy::source_template(), 3, ControlMessageType::GetSinkCap),
    );
    let (notifications, _) = expire(&mut partner);

    let message = delivered(&notifications);
    assert_eq!(message.header.message_id(), 1);

    let Some(Data::SinkCapabilities(capabilities)) = &message.payload else {
        panic!("Expected sink capabilities, got {:?}", message.payload);
    };
    assert_eq!(capabilities.pdos().len(), 1);
    assert_eq!(u32::from(capabilities.pdos()[0]), 0x0401_90c8);
    assert!(matches!(capabilities.pdos()[0], SinkPowerDataObject::FixedSupply(_)));
    assert_eq!(partner.state(), State::Sink(SinkState::Run));
}

#[test]
fn test_sink_soft_reset() {
    let mut partner = running_sink();

    transmit_sop(
        &mut partner,
        &dummy::control_message(dummy::source_template(), 3, ControlMessageType::SoftReset),
    );
    transmit_sop(
        &mut partner,
        &dummy::control_message(dummy::source_template(), 0, ControlMessageType::GetSinkCap),
    );
    let (notifications, _) = expire(&mut partner);

    assert_eq!(delivered(&notifications).header.message_id(), 0);
}

#[test]
fn test_sink_replies_to_discovery() {
    let mut partner = running_sink();

    transmit_sop(&mut partner, &dummy::vdm_request(3, 0xff00, VdmCommand::DiscoverSVIDS));
    let (notifications, _) = expire(&mut partner);

    let Some(Data::VendorDefined((header, vdos))) = &delivered(&notifications).payload else {
        panic!("Expected a VDM");
    };
    assert_eq!(header.svid(), 0xff00);
    assert_eq!(vdos.as_slice(), &[0xff01_0000]);
}

#[test]
fn test_mode_change_requires_idle() {
    let mut partner = attached_sink();

    partner.request_mode(ModeRequest::Source);
    let (notifications, _) = process(&mut partner);

    assert!(notifications.is_empty());
    assert_eq!(partner.mode(), Mode::Sink);
    assert_eq!(partner.state(), State::Sink(SinkState::AdvertiseSinkReady));
}

#[test]
fn test_transmit_without_persona_fails() {
    let mut partner = PartnerState::new();

    let (notifications, delay) = transmit_sop(&mut partner, &DUMMY_CAPABILITIES);

    assert_eq!(
        notifications.as_slice(),
        &[Notification::TransmitComplete(TransmitStatus::Failed)]
    );
    assert_eq!(delay, None);
    assert!(partner.pdo_kinds().is_empty());
}

#[test]
fn test_hard_reset_in_idle_is_idempotent() {
    let mut partner = PartnerState::new();
    partner.set_pd_rx(true);
    let before = partner.clone();

    for _ in 0..2 {
        let (notifications, _) = transmit(&mut partner, TransmitType::HardReset, &[]);

        assert_eq!(
            notifications.as_slice(),
            &[Notification::TransmitComplete(TransmitStatus::Failed)]
        );
        assert_eq!(partner, before);
    }
}

#[test]
fn test_hard_reset_from_manager() {
    let mut partner = running_sink();
    let epoch = partner.epoch();

    let (notifications, _) = transmit(&mut partner, TransmitType::HardReset, &[]);

    // A hard reset of the manager is not echoed back.
    assert_eq!(
        notifications.as_slice(),
        &[Notification::TransmitComplete(TransmitStatus::Success)]
    );
    assert_eq!(partner.epoch(), epoch + 1);
    assert_eq!(partner.state(), State::Sink(SinkState::AdvertiseSinkReady));
}

#[test]
fn test_unparseable_transmission_is_discarded() {
    let mut partner = attached_sink();

    let (notifications, _) = transmit_sop(&mut partner, &[0x61]);
    assert_eq!(
        notifications.as_slice(),
        &[Notification::TransmitComplete(TransmitStatus::Discarded)]
    );

    // Revision 3.0 source capabilities.
    let (notifications, _) = transmit_sop(&mut partner, &[0xa1, 0x11, 0x2c, 0x91, 0x01, 0x26]);
    assert_eq!(
        notifications.as_slice(),
        &[Notification::TransmitComplete(TransmitStatus::Discarded)]
    );
    assert!(!partner.requests().msg_rx());
    assert_eq!(partner.state(), State::Sink(SinkState::AdvertiseSinkReady));
}

#[test]
fn test_cable_transmissions_are_ignored() {
    let mut partner = attached_sink();

    for transmit_type in [TransmitType::SopPrime, TransmitType::SopPrimePrime] {
        let (notifications, _) = transmit(
            &mut partner,
            transmit_type,
            &dummy::vdm_request(0, 0xff00, VdmCommand::DiscoverIdentity),
        );

        assert_eq!(
            notifications.as_slice(),
            &[Notification::TransmitComplete(TransmitStatus::Success)]
        );
    }

    let (notifications, _) = transmit(&mut partner, TransmitType::CableReset, &[]);
    assert_eq!(
        notifications.as_slice(),
        &[Notification::TransmitComplete(TransmitStatus::Success)]
    );

    assert!(!partner.requests().msg_rx());
    assert_eq!(partner.state(), State::Sink(SinkState::AdvertiseSinkReady));
}

#[test]
fn test_source_attach_and_advertise() {
    let mut partner = PartnerState::new();
    partner.request_mode(ModeRequest::Source);

    let (notifications, delay) = process(&mut partner);
    assert_eq!(notifications.as_slice(), &[Notification::CcChanged]);
    assert_eq!(delay, Some(TimerType::VbusRampUp));
    assert_eq!(partner.electrical().cc1, CcStatus::Open);
    assert_eq!(partner.electrical().cc2, CcStatus::Rp3_0);
    assert!(!partner.electrical().vbus_present);

    // Capabilities wait for PD reception.
    let (notifications, delay) = expire(&mut partner);
    assert_eq!(notifications.as_slice(), &[Notification::VbusChanged]);
    assert_eq!(delay, None);
    assert!(partner.electrical().vbus_present);
    assert_eq!(
        partner.state(),
        State::Source(SourceState::AdvertiseSourceCapabilities)
    );

    partner.set_pd_rx(true);
    let (notifications, delay) = process(&mut partner);
    assert!(notifications.is_empty());
    assert_eq!(delay, Some(TimerType::SourceResponse));
    assert_eq!(partner.state(), State::Source(SourceState::AwaitRequest));

    let (notifications, _) = expire(&mut partner);
    let capabilities = delivered(&notifications);
    assert_eq!(capabilities.header.port_power_role(), PowerRole::Source);
    assert_eq!(capabilities.header.port_data_role(), DataRole::Dfp);

    let Some(Data::SourceCapabilities(capabilities)) = &capabilities.payload else {
        panic!("Expected source capabilities");
    };
    let Some(PowerDataObject::FixedSupply(pdo)) = capabilities.pdos().first() else {
        panic!("Expected a fixed supply PDO");
    };
    assert_eq!(pdo.raw_voltage(), 100);
    assert_eq!(pdo.raw_max_current(), 300);
    assert!(capabilities.dual_role_power());
    assert!(capabilities.externally_powered());
    assert!(capabilities.dual_role_data());
    assert_eq!(partner.pdo_kinds().len(), 1);
}

#[test]
fn test_source_accepts_request() {
    let mut partner = advertising_source();

    let (notifications, delay) = transmit_sop(&mut partner, &request_first_pdo(0));
    assert_eq!(
        notifications.as_slice(),
        &[Notification::TransmitComplete(TransmitStatus::Success)]
    );
    assert_eq!(delay, Some(TimerType::SourceResponse));
    assert_eq!(partner.state(), State::Source(SourceState::SendPowerReady));

    // PS_RDY is only queued once the accept message is delivered.
    let (notifications, delay) = expire(&mut partner);
    let accept = delivered(&notifications);
    assert_eq!(
        accept.header.message_type(),
        MessageType::Control(ControlMessageType::Accept)
    );
    assert_eq!(accept.header.message_id(), 1);
    assert_eq!(delay, Some(TimerType::SourceResponse));
    assert_eq!(partner.state(), State::Source(SourceState::Run));

    let (notifications, delay) = expire(&mut partner);
    let ready = delivered(&notifications);
    assert_eq!(
        ready.header.message_type(),
        MessageType::Control(ControlMessageType::PsRdy)
    );
    assert_eq!(ready.header.message_id(), 2);
    assert_eq!(delay, None);
    assert_eq!(partner.requests(), Requests::default());
}

#[test]
fn test_source_violation_restarts_ramp_up() {
    let mut partner = advertising_source();
    transmit_sop(&mut partner, &request_first_pdo(0));
    expire(&mut partner);
    expire(&mut partner);
    assert_eq!(partner.state(), State::Source(SourceState::Run));

    let (notifications, delay) = transmit_sop(&mut partner, &request_first_pdo(1));

    assert_eq!(
        notifications.as_slice(),
        &[
            Notification::HardResetReceived,
            Notification::TransmitComplete(TransmitStatus::Success),
            Notification::VbusChanged,
        ]
    );
    assert_eq!(delay, Some(TimerType::VbusRampUp));
    assert_eq!(partner.state(), State::Source(SourceState::VbusRampUp));
    assert!(!partner.electrical().vbus_present);

    // After the ramp up, capabilities are offered again.
    let (notifications, delay) = expire(&mut partner);
    assert_eq!(notifications.as_slice(), &[Notification::VbusChanged]);
    assert_eq!(delay, Some(TimerType::SourceResponse));
    assert_eq!(partner.state(), State::Source(SourceState::AwaitRequest));
}

#[test]
fn test_source_get_sink_cap_is_violation() {
    let mut partner = advertising_source();

    let (notifications, _) = transmit_sop(
        &mut partner,
        &dummy::control_message(dummy::sink_template(), 0, ControlMessageType::GetSinkCap),
    );

    assert_eq!(notifications[0], Notification::HardResetReceived);
    assert_eq!(partner.state(), State::Source(SourceState::VbusRampUp));
}

#[test]
fn test_source_ignores_vdm() {
    let mut partner = advertising_source();

    let (notifications, delay) = transmit_sop(
        &mut partner,
        &dummy::vdm_request(0, 0xff00, VdmCommand::DiscoverIdentity),
    );

    assert_eq!(
        notifications.as_slice(),
        &[Notification::TransmitComplete(TransmitStatus::Success)]
    );
    assert_eq!(delay, None);
    assert_eq!(partner.state(), State::Source(SourceState::AwaitRequest));
}

#[test]
fn test_reset_returns_to_idle() {
    let mut partner = advertising_source();
    transmit_sop(&mut partner, &request_first_pdo(0));
    expire(&mut partner);
    expire(&mut partner);
    let epoch = partner.epoch();

    partner.request_mode(ModeRequest::Reset);
    let (notifications, delay) = process(&mut partner);

    assert_eq!(
        notifications.as_slice(),
        &[Notification::Reset, Notification::VbusChanged]
    );
    assert_eq!(delay, None);
    assert_eq!(partner.mode(), Mode::None);
    assert_eq!(partner.state(), State::Idle);
    assert_eq!(partner.electrical().cc1, CcStatus::Open);
    assert_eq!(partner.electrical().cc2, CcStatus::Open);
    assert!(!partner.electrical().vbus_present);
    assert!(partner.pdo_kinds().is_empty());
    assert_eq!(partner.epoch(), epoch + 1);
}

#[test]
fn test_detach_cancels_pending_delivery() {
    let mut partner = attached_sink();
    transmit_sop(&mut partner, &DUMMY_CAPABILITIES);
    let epoch = partner.epoch();

    partner.request_mode(ModeRequest::None);
    let (notifications, _) = process(&mut partner);
    assert_eq!(notifications.as_slice(), &[Notification::CcChanged]);

    // The delivery timer of the old session fires late, and is ignored.
    let mut notifications = Notifications::new();
    partner.expire(epoch, &mut notifications);
    assert!(notifications.is_empty());
    assert!(!partner.requests().msg_rx());
}
