//! DisplayPort alternate mode data objects.
//!
//! The DisplayPort SVID carries a mode capability VDO in discover modes responses, a status VDO
//! in status and attention messages, and a configuration VDO in configure messages.
use proc_bitfield::bitfield;

/// The standard ID of the DisplayPort alternate mode.
pub const DISPLAYPORT_SVID: u16 = 0xff01;

/// Pin assignments, as a bit set.
pub mod pin_assignment {
    pub const A: u8 = 1 << 0;
    pub const B: u8 = 1 << 1;
    pub const C: u8 = 1 << 2;
    pub const D: u8 = 1 << 3;
    pub const E: u8 = 1 << 4;
    pub const F: u8 = 1 << 5;
}

/// Signaling rates, as a bit set.
pub mod signaling {
    /// DisplayPort 1.3 signaling.
    pub const DP_V13: u8 = 1 << 0;
    /// USB Gen 2 signaling.
    pub const USB_GEN2: u8 = 1 << 1;
}

/// Which DisplayPort roles a port supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortCapability {
    Reserved,
    /// UFP_D only, a DisplayPort sink.
    SinkOnly,
    /// DFP_D only, a DisplayPort source.
    SourceOnly,
    Both,
}

impl From<PortCapability> for u8 {
    fn from(value: PortCapability) -> Self {
        match value {
            PortCapability::Reserved => 0,
            PortCapability::SinkOnly => 1,
            PortCapability::SourceOnly => 2,
            PortCapability::Both => 3,
        }
    }
}

impl From<u8> for PortCapability {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            1 => PortCapability::SinkOnly,
            2 => PortCapability::SourceOnly,
            3 => PortCapability::Both,
            _ => PortCapability::Reserved,
        }
    }
}

bitfield! {
    /// The DisplayPort mode capability VDO.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct DisplayPortCapabilities(pub u32): FromStorage, IntoStorage {
        /// Pin assignments as UFP_D
        pub ufp_d_pin_assignments: u8 @ 16..=23,
        /// Pin assignments as DFP_D
        pub dfp_d_pin_assignments: u8 @ 8..=15,
        pub usb20_signaling_not_used: bool @ 7,
        /// Set for a receptacle, cleared for a plug
        pub receptacle: bool @ 6,
        pub signaling: u8 @ 2..=5,
        pub capability: u8 [PortCapability] @ 0..=1,
    }
}

impl DisplayPortCapabilities {
    /// The supported pin assignments.
    ///
    /// Falls back to the UFP_D assignments if no DFP_D assignments are given.
    pub fn pin_assignments(&self) -> u8 {
        match self.dfp_d_pin_assignments() {
            0 => self.ufp_d_pin_assignments(),
            pins => pins,
        }
    }
}

bitfield! {
    /// The DisplayPort status VDO.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct DisplayPortStatus(pub u32): FromStorage, IntoStorage {
        pub irq_hpd: bool @ 8,
        /// The hot plug detect level
        pub hpd: bool @ 7,
        pub exit_request: bool @ 6,
        pub usb_configuration_request: bool @ 5,
        pub multi_function_preferred: bool @ 4,
        pub enabled: bool @ 3,
        pub power_low: bool @ 2,
        /// Which of DFP_D and UFP_D are connected, as a bit set
        pub connected: u8 @ 0..=1,
    }
}

/// The configuration that a configure message selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Configuration {
    Usb,
    /// Configure the receiver as DFP_D.
    DfpD,
    /// Configure the receiver as UFP_D.
    UfpD,
    Reserved,
}

impl From<Configuration> for u8 {
    fn from(value: Configuration) -> Self {
        match value {
            Configuration::Usb => 0,
            Configuration::DfpD => 1,
            Configuration::UfpD => 2,
            Configuration::Reserved => 3,
        }
    }
}

impl From<u8> for Configuration {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0 => Configuration::Usb,
            1 => Configuration::DfpD,
            2 => Configuration::UfpD,
            _ => Configuration::Reserved,
        }
    }
}

bitfield! {
    /// The DisplayPort configuration VDO.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct DisplayPortConfiguration(pub u32): FromStorage, IntoStorage {
        /// Pin assignments as UFP_D, used by older configure messages
        pub legacy_pin_assignments: u8 @ 16..=23,
        pub raw_pin_assignments: u8 @ 8..=15,
        pub signaling: u8 @ 2..=5,
        pub configuration: u8 [Configuration] @ 0..=1,
    }
}

impl DisplayPortConfiguration {
    /// The selected pin assignments, falling back to the legacy field if the primary one is empty.
    pub fn pin_assignments(&self) -> u8 {
        match self.raw_pin_assignments() {
            0 => self.legacy_pin_assignments(),
            pins => pins,
        }
    }

    /// Whether DisplayPort is switched on, in either direction.
    pub fn displayport_enabled(&self) -> bool {
        matches!(self.configuration(), Configuration::DfpD | Configuration::UfpD)
    }
}
