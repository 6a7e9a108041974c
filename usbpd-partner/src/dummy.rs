//! Implements a recording port manager and a timer for testing.
use std::cell::RefCell;
use std::time::Duration;
use std::vec::Vec;

use usbpd_partner_traits::{PortManager, TransmitStatus};

use crate::counters::{Counter, CounterType};
use crate::protocol_layer::MAX_MESSAGE_SIZE;
use crate::protocol_layer::message::Message;
use crate::protocol_layer::message::data::Data;
use crate::protocol_layer::message::data::vendor_defined::{
    VdmCommand, VdmCommandType, VdmHeader, VdmHeaderStructured,
};
use crate::protocol_layer::message::header::{
    ControlMessageType, DataMessageType, Header, SUPPORTED_REVISION,
};
use crate::timers::Timer;
use crate::{DataRole, PowerRole};

/// A message in its wire format.
pub type Bytes = heapless::Vec<u8, MAX_MESSAGE_SIZE>;

/// A timer on tokio's clock.
pub struct DummyTimer {}

impl Timer for DummyTimer {
    async fn after_millis(milliseconds: u64) {
        tokio::time::sleep(Duration::from_millis(milliseconds)).await
    }
}

/// A callback that the port manager received.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CcChanged,
    VbusChanged,
    Received(Bytes),
    TransmitComplete(TransmitStatus),
    HardResetReceived,
    Reset,
}

/// Callbacks, in the order in which they arrived.
#[derive(Default)]
pub struct Events(RefCell<Vec<Event>>);

impl Events {
    /// Take all events that arrived so far.
    pub fn take(&self) -> Vec<Event> {
        self.0.take()
    }
}

/// A port manager that records all callbacks.
pub struct DummyManager<'a> {
    events: &'a Events,
}

impl<'a> DummyManager<'a> {
    /// Create a new dummy port manager, which records into `events`.
    pub fn new(events: &'a Events) -> Self {
        Self { events }
    }

    fn record(&mut self, event: Event) {
        self.events.0.borrow_mut().push(event);
    }
}

impl PortManager for DummyManager<'_> {
    async fn cc_changed(&mut self) {
        self.record(Event::CcChanged);
    }

    async fn vbus_changed(&mut self) {
        self.record(Event::VbusChanged);
    }

    async fn pd_receive(&mut self, data: &[u8]) {
        self.record(Event::Received(Bytes::from_slice(data).unwrap()));
    }

    async fn transmit_complete(&mut self, status: TransmitStatus) {
        self.record(Event::TransmitComplete(status));
    }

    async fn hard_reset_received(&mut self) {
        self.record(Event::HardResetReceived);
    }

    async fn reset(&mut self) {
        self.record(Event::Reset);
    }
}

/// Source capabilities, as sent by a port manager in the source role.
///
/// - Fixed 5 V at 3 A, dual-role power, USB communications capable, dual-role data
pub const DUMMY_CAPABILITIES: [u8; 6] = [
    0x61, // Header
    0x11, // Header
    0x2c, // +
    0x91, // | Fixed 5V @ 3A
    0x01, // |
    0x26, // +
];

/// The header template of a port manager in the source role.
pub fn source_template() -> Header {
    Header::new_template(DataRole::Dfp, PowerRole::Source, SUPPORTED_REVISION)
}

/// The header template of a port manager in the sink role.
pub fn sink_template() -> Header {
    Header::new_template(DataRole::Ufp, PowerRole::Sink, SUPPORTED_REVISION)
}

fn to_bytes(message: &Message) -> Bytes {
    let mut buffer = [0u8; MAX_MESSAGE_SIZE];
    let length = message.to_bytes(&mut buffer);
    Bytes::from_slice(&buffer[..length]).unwrap()
}

/// A control message of the port manager.
pub fn control_message(template: Header, message_id: u8, message_type: ControlMessageType) -> Bytes {
    to_bytes(&Message::new(Header::new_control(
        template,
        Counter::new_from_value(CounterType::MessageId, message_id),
        message_type,
    )))
}

/// A data message of the port manager.
pub fn data_message(template: Header, message_id: u8, message_type: DataMessageType, data: Data) -> Bytes {
    let header = Header::new_data(
        template,
        Counter::new_from_value(CounterType::MessageId, message_id),
        message_type,
        data.num_objects(),
    );
    to_bytes(&Message::new_with_data(header, data))
}

/// A structured VDM request of the port manager, acting as the DFP.
pub fn vdm_request(message_id: u8, svid: u16, command: VdmCommand) -> Bytes {
    let header = VdmHeaderStructured::new(svid, VdmCommandType::InitiatorREQ, command);
    data_message(
        source_template(),
        message_id,
        DataMessageType::VendorDefined,
        Data::VendorDefined((VdmHeader::Structured(header), heapless::Vec::new())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol_layer::message::header::MessageType;

    #[test]
    fn test_capabilities_match_template() {
        let message = Message::from_bytes(&DUMMY_CAPABILITIES).unwrap();

        assert_eq!(message.header.port_power_role(), PowerRole::Source);
        assert_eq!(message.header.port_data_role(), DataRole::Dfp);
        assert_eq!(message.header.message_id(), 0);
        assert_eq!(
            message.header.message_type(),
            MessageType::Data(DataMessageType::SourceCapabilities)
        );
    }

    #[tokio::test]
    async fn test_records_in_order() {
        let events = Events::default();
        let mut manager = DummyManager::new(&events);

        manager.cc_changed().await;
        manager.transmit_complete(TransmitStatus::Failed).await;

        assert_eq!(
            events.take(),
            [Event::CcChanged, Event::TransmitComplete(TransmitStatus::Failed)]
        );
        assert!(events.take().is_empty());
    }
}
