//! USB PD port partner traits.
//!
//! Provides the interface between the simulated port partner and the Type-C port manager that is
//! exercised by it.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
use core::future::Future;

/// Status of a CC line, as seen by the port manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CcStatus {
    /// Nothing attached.
    Open,
    /// Powered cable or audio adapter (Ra).
    Ra,
    /// Sink attached (Rd).
    Rd,
    /// Source advertising default USB current.
    RpDefault,
    /// Source advertising 1.5 A.
    Rp1_5,
    /// Source advertising 3.0 A.
    Rp3_0,
}

/// Cable orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Communication on CC1.
    #[default]
    Cc1,
    /// Communication on CC2.
    Cc2,
}

/// The kind of transmission requested by the port manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitType {
    /// Message to the port partner.
    Sop,
    /// Message to the near cable plug.
    SopPrime,
    /// Message to the far cable plug.
    SopPrimePrime,
    /// Debug message to the near cable plug.
    SopDebugPrime,
    /// Debug message to the far cable plug.
    SopDebugPrimePrime,
    /// Hard Reset signaling.
    HardReset,
    /// Cable Reset signaling.
    CableReset,
    /// BIST carrier mode 2.
    BistMode2,
}

impl TransmitType {
    /// Whether this transmission carries a message, as opposed to plain signaling.
    pub fn carries_message(&self) -> bool {
        matches!(
            self,
            Self::Sop | Self::SopPrime | Self::SopPrimePrime | Self::SopDebugPrime | Self::SopDebugPrimePrime
        )
    }
}

/// Outcome of a transmission, reported back to the port manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitStatus {
    /// The port partner accepted the message.
    Success,
    /// The message was discarded, e.g. because it could not be parsed.
    Discarded,
    /// There is no port partner that could accept the message.
    Failed,
}

/// Port manager trait, through which the port partner reports events.
///
/// All callbacks are issued from the port partner's worker context, never from within an entry
/// point call. It is therefore allowed to call back into the port partner from within a callback.
pub trait PortManager {
    /// The state of the CC lines changed.
    fn cc_changed(&mut self) -> impl Future<Output = ()>;

    /// The presence of VBUS changed.
    fn vbus_changed(&mut self) -> impl Future<Output = ()>;

    /// A message from the port partner was received.
    ///
    /// `data` holds the message in its wire format.
    fn pd_receive(&mut self, data: &[u8]) -> impl Future<Output = ()>;

    /// The last transmission completed.
    fn transmit_complete(&mut self, status: TransmitStatus) -> impl Future<Output = ()>;

    /// The port partner signaled a hard reset.
    fn hard_reset_received(&mut self) -> impl Future<Output = ()>;

    /// The port manager shall reset the port controller completely.
    fn reset(&mut self) -> impl Future<Output = ()>;
}
