//! Definitions of request message content.
//!
//! A request data object (RDO) selects one PDO of the most recent source capabilities by its
//! object position. Its layout depends on the kind of the selected PDO.
use proc_bitfield::bitfield;
use uom::si::electric_current::centiampere;

use super::source_capabilities::{Kind, raw_field};
use crate::_250milliwatts_mod::_250milliwatts;
use crate::units::{ElectricCurrent, Power};

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RawDataObject(pub u32): Debug, FromStorage, IntoStorage {
        /// Valid range 1..=7
        pub object_position: u8 @ 28..=31,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FixedVariableSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Valid range 1..=7
        pub object_position: u8 @ 28..=31,
        pub giveback_flag: bool @ 27,
        pub capability_mismatch: bool @ 26,
        pub usb_communications_capable: bool @ 25,
        pub no_usb_suspend: bool @ 24,
        /// Operating current in 10 mA units
        pub raw_operating_current: u16 @ 10..=19,
        /// Maximum operating current in 10 mA units, or minimum with the give back flag set
        pub raw_max_operating_current: u16 @ 0..=9,
    }
}

impl FixedVariableSupply {
    /// Create a request for the PDO at `object_position`.
    pub fn new(
        object_position: u8,
        operating_current: ElectricCurrent,
        max_operating_current: ElectricCurrent,
    ) -> Self {
        Self(0)
            .with_object_position(object_position)
            .with_raw_operating_current(raw_field(operating_current.get::<centiampere>()))
            .with_raw_max_operating_current(raw_field(max_operating_current.get::<centiampere>()))
    }

    pub fn operating_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_operating_current().into())
    }

    pub fn max_operating_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_operating_current().into())
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Battery(pub u32): Debug, FromStorage, IntoStorage {
        /// Object position (0000b and 1000b…1111b are Reserved and Shall Not be used)
        pub object_position: u8 @ 28..=31,
        /// GiveBackFlag = 0
        pub giveback_flag: bool @ 27,
        /// Capability mismatch
        pub capability_mismatch: bool @ 26,
        /// USB communications capable
        pub usb_communications_capable: bool @ 25,
        /// No USB Suspend
        pub no_usb_suspend: bool @ 24,
        /// Operating power in 250mW units
        pub raw_operating_power: u16 @ 10..=19,
        /// Maximum operating power in 250mW units
        pub raw_max_operating_power: u16 @ 0..=9,
    }
}

impl Battery {
    /// Create a request for the battery PDO at `object_position`.
    pub fn new(object_position: u8, operating_power: Power, max_operating_power: Power) -> Self {
        Self(0)
            .with_object_position(object_position)
            .with_raw_operating_power(raw_field(operating_power.get::<_250milliwatts>()))
            .with_raw_max_operating_power(raw_field(max_operating_power.get::<_250milliwatts>()))
    }

    pub fn operating_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_operating_power().into())
    }

    pub fn max_operating_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_max_operating_power().into())
    }
}

/// Power requests towards the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerSource {
    FixedVariableSupply(FixedVariableSupply),
    Battery(Battery),
    /// A request for a PDO of unknown kind.
    Unknown(RawDataObject),
}

impl PowerSource {
    /// Interpret a raw request, given the kind of the PDO that it refers to.
    pub fn from_raw(raw: u32, kind: Option<Kind>) -> Self {
        match kind {
            Some(Kind::FixedSupply | Kind::VariableSupply) => Self::FixedVariableSupply(FixedVariableSupply(raw)),
            Some(Kind::Battery) => Self::Battery(Battery(raw)),
            None => Self::Unknown(RawDataObject(raw)),
        }
    }

    pub fn object_position(&self) -> u8 {
        match self {
            PowerSource::FixedVariableSupply(p) => p.object_position(),
            PowerSource::Battery(p) => p.object_position(),
            PowerSource::Unknown(p) => p.object_position(),
        }
    }
}

impl From<PowerSource> for u32 {
    fn from(value: PowerSource) -> Self {
        match value {
            PowerSource::FixedVariableSupply(rdo) => rdo.0,
            PowerSource::Battery(rdo) => rdo.0,
            PowerSource::Unknown(rdo) => rdo.0,
        }
    }
}
