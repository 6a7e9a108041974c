//! Definitions and implementations of data messages.
//!
//! See [6.4].
use byteorder::{ByteOrder, LittleEndian};
use heapless::Vec;

use crate::protocol_layer::message::header::DataMessageType;
use crate::protocol_layer::message::ParseError;

/// The size of a data object in bytes.
pub const OBJECT_SIZE: usize = 4;

/// The largest number of data objects in one message.
pub const MAX_OBJECTS: usize = 7;

/// Access to the kinds of PDOs that were offered most recently.
///
/// Needed for decoding requests, whose layout depends on the PDO they refer to.
pub trait PdoState {
    /// The kind of the PDO at a 1-based object position, if known.
    fn pdo_at_object_position(&self, position: u8) -> Option<source_capabilities::Kind>;
}

impl PdoState for () {
    fn pdo_at_object_position(&self, _position: u8) -> Option<source_capabilities::Kind> {
        None
    }
}

/// Types of data messages.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Data {
    /// Source capabilities.
    SourceCapabilities(source_capabilities::SourceCapabilities),
    /// Sink capabilities.
    SinkCapabilities(sink_capabilities::SinkCapabilities),
    /// Request for a power level from the source.
    Request(request::PowerSource),
    /// Vendor defined, with the VDM header and the data objects that follow it.
    VendorDefined((vendor_defined::VdmHeader, Vec<u32, { vendor_defined::MAX_VDOS }>)),
    /// BIST or reserved data message, kept as raw data objects.
    Unknown(Vec<u32, MAX_OBJECTS>),
}

impl Data {
    /// Parse the payload of a data message.
    ///
    /// Exactly `num_objects` objects are read from `payload`, surplus bytes are ignored.
    pub fn parse<P: PdoState>(
        message_type: DataMessageType,
        num_objects: usize,
        payload: &[u8],
        state: &P,
    ) -> Result<Self, ParseError> {
        let expected = num_objects * OBJECT_SIZE;
        if payload.len() < expected {
            return Err(ParseError::Truncated {
                expected,
                found: payload.len(),
            });
        }

        let mut objects = payload[..expected].chunks_exact(OBJECT_SIZE).map(LittleEndian::read_u32);

        Ok(match message_type {
            DataMessageType::SourceCapabilities => Data::SourceCapabilities(source_capabilities::SourceCapabilities(
                objects.map(source_capabilities::PowerDataObject::from_raw).collect(),
            )),
            DataMessageType::SinkCapabilities => Data::SinkCapabilities(sink_capabilities::SinkCapabilities(
                objects.map(sink_capabilities::SinkPowerDataObject::from_raw).collect(),
            )),
            DataMessageType::Request => {
                if num_objects != 1 {
                    return Err(ParseError::InvalidLength {
                        expected: OBJECT_SIZE,
                        found: expected,
                    });
                }

                let raw = request::RawDataObject(LittleEndian::read_u32(payload));
                let kind = state.pdo_at_object_position(raw.object_position());

                if kind.is_none() {
                    warn!("No PDO known at request object position {}", raw.object_position());
                }

                Data::Request(request::PowerSource::from_raw(raw.0, kind))
            }
            DataMessageType::VendorDefined => {
                // The object count is at least one for any data message.
                let header = objects.next().map(vendor_defined::VdmHeader::from).ok_or(ParseError::Truncated {
                    expected: OBJECT_SIZE,
                    found: 0,
                })?;

                Data::VendorDefined((header, objects.collect()))
            }
            DataMessageType::Bist | DataMessageType::Reserved(_) => Data::Unknown(objects.collect()),
        })
    }

    /// The raw data objects, in wire order.
    pub fn objects(&self) -> Vec<u32, MAX_OBJECTS> {
        let mut objects = Vec::new();

        // Payload sizes are bounded by the variants, so pushing cannot fail.
        match self {
            Self::SourceCapabilities(capabilities) => {
                objects.extend(capabilities.pdos().iter().copied().map(u32::from));
            }
            Self::SinkCapabilities(capabilities) => {
                objects.extend(capabilities.pdos().iter().copied().map(u32::from));
            }
            Self::Request(power_source) => {
                objects.extend(core::iter::once(u32::from(*power_source)));
            }
            Self::VendorDefined((header, vdos)) => {
                objects.extend(core::iter::once(u32::from(*header)).chain(vdos.iter().copied()));
            }
            Self::Unknown(raw) => objects.extend(raw.iter().copied()),
        }

        objects
    }

    /// The number of data objects in the payload.
    pub fn num_objects(&self) -> u8 {
        self.objects().len() as u8
    }

    /// Serialize message data to a slice, returning the number of written bytes.
    pub fn to_bytes(&self, payload: &mut [u8]) -> usize {
        let objects = self.objects();

        for (object, buf) in objects.iter().zip(payload.chunks_exact_mut(OBJECT_SIZE)) {
            LittleEndian::write_u32(buf, *object);
        }

        objects.len() * OBJECT_SIZE
    }
}

#[allow(missing_docs)]
pub mod displayport;

#[allow(missing_docs)]
pub mod request;

pub mod sink_capabilities;

#[allow(missing_docs)]
pub mod source_capabilities;

#[allow(missing_docs)]
pub mod vendor_defined;
