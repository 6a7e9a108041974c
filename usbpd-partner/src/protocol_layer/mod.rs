//! The protocol layer of the simulated port partner.
//!
//! Holds the message codec, which converts between the byte frames that a port manager exchanges
//! and typed messages, and a logger that describes every message crossing the wire.
pub mod log;
pub mod message;

/// The size of the largest revision 2.0 message: a header and seven data objects.
pub const MAX_MESSAGE_SIZE: usize = message::header::HEADER_SIZE + message::data::MAX_OBJECTS * message::data::OBJECT_SIZE;
