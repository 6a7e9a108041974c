//! Definitions of message content.
//!
//! A message is a 16 bit header, followed by up to seven 32 bit data objects. All fields are
//! little endian on the wire.
pub mod data;
#[allow(missing_docs)]
pub mod header;

use data::{Data, PdoState};
use header::{HEADER_SIZE, Header, MessageType};

/// Errors that can occur during message/header parsing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The input buffer has an invalid length.
    /// * `expected` - The expected length.
    /// * `found` - The actual length found.
    #[error("invalid input buffer length (expected {expected:?}, found {found:?})")]
    InvalidLength {
        /// The expected length.
        expected: usize,
        /// The actual length found.
        found: usize,
    },
    /// The input buffer ends before the data objects that the header announces.
    #[error("truncated message (expected {expected:?} bytes, found {found:?})")]
    Truncated {
        /// The number of bytes that the header announces.
        expected: usize,
        /// The number of bytes present.
        found: usize,
    },
    /// The specification revision field is not supported.
    #[error("unsupported specification revision `{0}`")]
    UnsupportedSpecificationRevision(u8),
}

/// A USB PD message.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// The message header.
    pub header: Header,
    /// Optional payload for data messages.
    pub payload: Option<Data>,
}

impl Message {
    /// Create a new message from a message header.
    pub fn new(header: Header) -> Self {
        Self { header, payload: None }
    }

    /// Create a new message from a message header and payload data.
    ///
    /// The object count of the header is replaced by the size of the payload.
    pub fn new_with_data(header: Header, data: Data) -> Self {
        Self {
            header: header.with_num_objects(data.num_objects()),
            payload: Some(data),
        }
    }

    /// Serialize a message to a slice, returning the number of written bytes.
    pub fn to_bytes(&self, buffer: &mut [u8]) -> usize {
        self.header.to_bytes(buffer)
            + match self.payload.as_ref() {
                Some(data) => data.to_bytes(&mut buffer[HEADER_SIZE..]),
                None => 0,
            }
    }

    /// Parse a message from a slice of bytes.
    ///
    /// Requests are decoded without knowledge of the offered PDOs.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        Self::from_bytes_with_state(data, &())
    }

    /// Parse a message from a slice of bytes, decoding requests against offered PDOs.
    pub fn from_bytes_with_state<P: PdoState>(data: &[u8], state: &P) -> Result<Self, ParseError> {
        if data.len() < HEADER_SIZE {
            return Err(ParseError::Truncated {
                expected: HEADER_SIZE,
                found: data.len(),
            });
        }

        let header = Header::from_bytes(&data[..HEADER_SIZE])?;
        let payload = &data[HEADER_SIZE..];

        match header.message_type() {
            MessageType::Control(_) => Ok(Self::new(header)),
            MessageType::Data(message_type) => Ok(Self {
                header,
                payload: Some(Data::parse(message_type, header.num_objects(), payload, state)?),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::data::request::{FixedVariableSupply, PowerSource, RawDataObject};
    use super::data::source_capabilities::{FixedSupply, PdoKinds, PowerDataObject, SourceCapabilities};
    use super::data::vendor_defined::{PD_SID, VdmCommand, VdmCommandType, VdmHeader, VdmHeaderStructured};
    use super::header::{ControlMessageType, DataMessageType, SpecificationRevision};
    use super::*;
    use crate::counters::{Counter, CounterType};
    use crate::protocol_layer::MAX_MESSAGE_SIZE;
    use crate::{DataRole, PowerRole};

    fn source_template() -> Header {
        Header::new_template(DataRole::Dfp, PowerRole::Source, SpecificationRevision::R2_0)
    }

    fn encode(message: &Message) -> heapless::Vec<u8, MAX_MESSAGE_SIZE> {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let len = message.to_bytes(&mut buf);
        heapless::Vec::from_slice(&buf[..len]).unwrap()
    }

    #[test]
    fn test_source_capabilities_message() {
        let capabilities = SourceCapabilities::new(&[PowerDataObject::FixedSupply(
            FixedSupply(0x2601_912c).with_dual_role_power(true),
        )]);
        let message = Message::new_with_data(
            Header::new_data(
                source_template(),
                Counter::new(CounterType::MessageId),
                DataMessageType::SourceCapabilities,
                0,
            ),
            Data::SourceCapabilities(capabilities),
        );

        assert_eq!(message.header.num_objects(), 1);

        let bytes = encode(&message);
        assert_eq!(bytes.as_slice(), &[0x61, 0x11, 0x2c, 0x91, 0x01, 0x26]);
        assert_eq!(Message::from_bytes(&bytes), Ok(message));
    }

    #[test]
    fn test_control_message() {
        let message = Message::new(Header::new_control(
            source_template(),
            Counter::new_from_value(CounterType::MessageId, 5),
            ControlMessageType::Accept,
        ));

        let bytes = encode(&message);
        assert_eq!(bytes.len(), 2);

        let parsed = Message::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.header.message_id(), 5);
        assert_eq!(parsed.payload, None);
    }

    #[test]
    fn test_request_needs_pdo_kinds() {
        let rdo = FixedVariableSupply(0x1202_5896);
        let template = Header::new_template(DataRole::Ufp, PowerRole::Sink, SpecificationRevision::R2_0);
        let message = Message::new_with_data(
            Header::new_data(template, Counter::new(CounterType::MessageId), DataMessageType::Request, 1),
            Data::Request(PowerSource::FixedVariableSupply(rdo)),
        );
        let bytes = encode(&message);

        let parsed = Message::from_bytes(&bytes).unwrap();
        assert_eq!(
            parsed.payload,
            Some(Data::Request(PowerSource::Unknown(RawDataObject(rdo.0))))
        );

        let mut kinds = PdoKinds::default();
        kinds.record(&SourceCapabilities::new(&[PowerDataObject::FixedSupply(FixedSupply(0x0001_912c))]));

        let parsed = Message::from_bytes_with_state(&bytes, &kinds).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_vendor_defined_message() {
        let header = VdmHeaderStructured::new(PD_SID, VdmCommandType::InitiatorREQ, VdmCommand::DiscoverSVIDS);
        let message = Message::new_with_data(
            Header::new_data(source_template(), Counter::new(CounterType::MessageId), DataMessageType::VendorDefined, 0),
            Data::VendorDefined((VdmHeader::Structured(header), heapless::Vec::new())),
        );

        let bytes = encode(&message);
        assert_eq!(bytes.len(), 6);
        assert_eq!(Message::from_bytes(&bytes), Ok(message));
    }

    #[test]
    fn test_truncated_message() {
        // Source capabilities that announce two objects, but carry only one.
        let bytes = [0x61, 0x21, 0x2c, 0x91, 0x01, 0x26];

        assert_eq!(
            Message::from_bytes(&bytes),
            Err(ParseError::Truncated { expected: 8, found: 4 })
        );
        assert_eq!(
            Message::from_bytes(&bytes[..1]),
            Err(ParseError::Truncated { expected: 2, found: 1 })
        );
    }

    #[test]
    fn test_reserved_data_message_is_kept_raw() {
        // Data message type 0b00111 is reserved in revision 2.0.
        let bytes = [0x47, 0x10, 0x78, 0x56, 0x34, 0x12];
        let message = Message::from_bytes(&bytes).unwrap();

        assert_eq!(message.payload, Some(Data::Unknown(heapless::Vec::from_slice(&[0x1234_5678]).unwrap())));
        assert_eq!(encode(&message).as_slice(), &bytes);
    }
}
