//! Definitions of sink capabilities data message content.
//!
//! Sink capabilities are sent in response to Get_Sink_Cap messages. Battery and variable supply
//! PDOs share their layout with the source side, only the fixed supply PDO differs.
use heapless::Vec;
use proc_bitfield::bitfield;
use uom::si::electric_current::centiampere;

use super::source_capabilities::{Battery, MAX_PDOS, RawPowerDataObject, VariableSupply, raw_field};
use crate::_50millivolts_mod::_50millivolts;
use crate::units::{ElectricCurrent, ElectricPotential};

bitfield! {
    /// A sink fixed supply PDO.
    ///
    /// Different from the source fixed supply PDO in bit 28 and bits 20..=24.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SinkFixedSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Fixed supply (00b)
        pub kind: u8 @ 30..=31,
        /// Dual-Role Power - set if Dual-Role Power supported
        pub dual_role_power: bool @ 29,
        /// Higher Capability - set if sink needs more than vSafe5V for full functionality
        pub higher_capability: bool @ 28,
        /// Externally powered
        pub externally_powered: bool @ 27,
        /// USB Communications Capable
        pub usb_communications_capable: bool @ 26,
        /// Dual-Role Data
        pub dual_role_data: bool @ 25,
        /// Voltage in 50 mV units
        pub raw_voltage: u16 @ 10..=19,
        /// Operational Current in 10 mA units
        pub raw_operational_current: u16 @ 0..=9,
    }
}

#[allow(clippy::derivable_impls)]
impl Default for SinkFixedSupply {
    fn default() -> Self {
        Self(0)
    }
}

impl SinkFixedSupply {
    /// Create a new sink fixed supply PDO without any capability flags.
    pub fn new(voltage: ElectricPotential, operational_current: ElectricCurrent) -> Self {
        Self::default()
            .with_raw_voltage(raw_field(voltage.get::<_50millivolts>()))
            .with_raw_operational_current(raw_field(operational_current.get::<centiampere>()))
    }

    /// Get the voltage in standard units.
    pub fn voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_voltage().into())
    }

    /// Get the operational current in standard units.
    pub fn operational_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_operational_current().into())
    }
}

/// A power data object that describes one operating point of a sink.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SinkPowerDataObject {
    /// Fixed voltage supply.
    FixedSupply(SinkFixedSupply),
    /// Battery supply, with operational power instead of maximum power.
    Battery(Battery),
    /// Variable supply, with operational current instead of maximum current.
    VariableSupply(VariableSupply),
    /// Reserved kind of power data object.
    Unknown(RawPowerDataObject),
}

impl SinkPowerDataObject {
    /// Interpret a raw object by its kind bits.
    pub fn from_raw(raw: u32) -> Self {
        match RawPowerDataObject(raw).kind() {
            0b00 => Self::FixedSupply(SinkFixedSupply(raw)),
            0b01 => Self::Battery(Battery(raw)),
            0b10 => Self::VariableSupply(VariableSupply(raw)),
            _ => Self::Unknown(RawPowerDataObject(raw)),
        }
    }
}

impl From<SinkPowerDataObject> for u32 {
    fn from(value: SinkPowerDataObject) -> Self {
        match value {
            SinkPowerDataObject::FixedSupply(pdo) => pdo.0,
            SinkPowerDataObject::Battery(pdo) => pdo.0,
            SinkPowerDataObject::VariableSupply(pdo) => pdo.0,
            SinkPowerDataObject::Unknown(pdo) => pdo.0,
        }
    }
}

/// Sink capabilities, as reported in a Sink_Capabilities message.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinkCapabilities(pub(crate) Vec<SinkPowerDataObject, MAX_PDOS>);

impl SinkCapabilities {
    /// Collect sink capabilities from a list of PDOs. Surplus PDOs are dropped.
    pub fn new(pdos: &[SinkPowerDataObject]) -> Self {
        Self(pdos.iter().copied().take(MAX_PDOS).collect())
    }

    /// The mandatory vSafe5V entry, which is always the first PDO.
    pub fn vsafe_5v(&self) -> Option<&SinkFixedSupply> {
        match self.0.first() {
            Some(SinkPowerDataObject::FixedSupply(supply)) => Some(supply),
            _ => None,
        }
    }

    /// Get the sink's power data objects.
    pub fn pdos(&self) -> &[SinkPowerDataObject] {
        &self.0
    }
}
