//! Definitions of source capabilities data message content.
//!
//! Revision 2.0 defines fixed, battery and variable supplies. The fourth PDO kind is reserved.
use heapless::Vec;
use proc_bitfield::bitfield;
use uom::si::electric_current::centiampere;

use super::PdoState;
use crate::_50millivolts_mod::_50millivolts;
use crate::_250milliwatts_mod::_250milliwatts;
use crate::units::{ElectricCurrent, ElectricPotential, Power};

/// The largest number of PDOs that fit into one capabilities message.
pub const MAX_PDOS: usize = 7;

/// The largest raw value of a 10 bit voltage, current or power field.
const MAX_RAW_FIELD: u32 = 0x3ff;

/// Convert a quantity to a 10 bit raw field value, clamping it if it does not fit.
pub(crate) fn raw_field(value: u32) -> u16 {
    if value > MAX_RAW_FIELD {
        error!("Clamping out-of-range field value {}", value);
        MAX_RAW_FIELD as u16
    } else {
        value as u16
    }
}

/// Kinds of supplies that can be reported within source capabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Kind {
    /// Fixed voltage supply.
    FixedSupply,
    /// Battery supply.
    Battery,
    /// Variable voltage supply.
    VariableSupply,
}

/// A power data object holds information about one type of source capability.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerDataObject {
    /// Fixed voltage supply.
    FixedSupply(FixedSupply),
    /// Battery supply.
    Battery(Battery),
    /// Variable voltage supply.
    VariableSupply(VariableSupply),
    /// Reserved kind of power data object.
    Unknown(RawPowerDataObject),
}

impl PowerDataObject {
    /// Interpret a raw object by its kind bits.
    pub fn from_raw(raw: u32) -> Self {
        match RawPowerDataObject(raw).kind() {
            0b00 => Self::FixedSupply(FixedSupply(raw)),
            0b01 => Self::Battery(Battery(raw)),
            0b10 => Self::VariableSupply(VariableSupply(raw)),
            _ => {
                warn!("Reserved power data object kind in {:#x}", raw);
                Self::Unknown(RawPowerDataObject(raw))
            }
        }
    }

    /// The kind of supply, if it is not reserved.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Self::FixedSupply(_) => Some(Kind::FixedSupply),
            Self::Battery(_) => Some(Kind::Battery),
            Self::VariableSupply(_) => Some(Kind::VariableSupply),
            Self::Unknown(_) => None,
        }
    }
}

impl From<PowerDataObject> for u32 {
    fn from(value: PowerDataObject) -> Self {
        match value {
            PowerDataObject::FixedSupply(pdo) => pdo.0,
            PowerDataObject::Battery(pdo) => pdo.0,
            PowerDataObject::VariableSupply(pdo) => pdo.0,
            PowerDataObject::Unknown(pdo) => pdo.0,
        }
    }
}

bitfield! {
    /// A raw power data object.
    ///
    /// Used as a fallback for encoding unknown source types.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RawPowerDataObject(pub u32): Debug, FromStorage, IntoStorage {
        /// The kind of power data object.
        pub kind: u8 @ 30..=31,
    }
}

bitfield! {
    /// A fixed voltage supply PDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FixedSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Fixed supply
        pub kind: u8 @ 30..=31,
        /// Dual-role power
        pub dual_role_power: bool @ 29,
        /// USB suspend supported
        pub usb_suspend_supported: bool @ 28,
        /// Externally powered
        pub externally_powered: bool @ 27,
        /// USB communications capable
        pub usb_communications_capable: bool @ 26,
        /// Dual-role data
        pub dual_role_data: bool @ 25,
        /// Peak current
        pub peak_current: u8 @ 20..=21,
        /// Voltage in 50 mV units
        pub raw_voltage: u16 @ 10..=19,
        /// Maximum current in 10 mA units
        pub raw_max_current: u16 @ 0..=9,
    }
}

#[allow(clippy::derivable_impls)]
impl Default for FixedSupply {
    fn default() -> Self {
        Self(0)
    }
}

impl FixedSupply {
    /// Create a fixed supply PDO without any capability flags.
    pub fn new(voltage: ElectricPotential, max_current: ElectricCurrent) -> Self {
        Self::default()
            .with_raw_voltage(raw_field(voltage.get::<_50millivolts>()))
            .with_raw_max_current(raw_field(max_current.get::<centiampere>()))
    }

    pub fn voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_voltage().into())
    }

    pub fn max_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_current().into())
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Battery(pub u32): Debug, FromStorage, IntoStorage {
        /// Battery
        pub kind: u8 @ 30..=31,
        /// Maximum Voltage in 50 mV units
        pub raw_max_voltage: u16 @ 20..=29,
        /// Minimum Voltage in 50 mV units
        pub raw_min_voltage: u16 @ 10..=19,
        /// Maximum Allowable Power in 250 mW units
        pub raw_max_power: u16 @ 0..=9,
    }
}

impl Battery {
    /// Create a battery supply PDO.
    pub fn new(min_voltage: ElectricPotential, max_voltage: ElectricPotential, max_power: Power) -> Self {
        Self(0)
            .with_kind(0b01)
            .with_raw_max_voltage(raw_field(max_voltage.get::<_50millivolts>()))
            .with_raw_min_voltage(raw_field(min_voltage.get::<_50millivolts>()))
            .with_raw_max_power(raw_field(max_power.get::<_250milliwatts>()))
    }

    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_max_voltage().into())
    }

    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_min_voltage().into())
    }

    pub fn max_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_max_power().into())
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct VariableSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Variable supply (non-battery)
        pub kind: u8 @ 30..=31,
        /// Maximum Voltage in 50mV units
        pub raw_max_voltage: u16 @ 20..=29,
        /// Minimum Voltage in 50mV units
        pub raw_min_voltage: u16 @ 10..=19,
        /// Maximum current in 10mA units
        pub raw_max_current: u16 @ 0..=9,
    }
}

impl VariableSupply {
    /// Create a variable supply PDO.
    pub fn new(min_voltage: ElectricPotential, max_voltage: ElectricPotential, max_current: ElectricCurrent) -> Self {
        Self(0)
            .with_kind(0b10)
            .with_raw_max_voltage(raw_field(max_voltage.get::<_50millivolts>()))
            .with_raw_min_voltage(raw_field(min_voltage.get::<_50millivolts>()))
            .with_raw_max_current(raw_field(max_current.get::<centiampere>()))
    }

    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_max_voltage().into())
    }

    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_min_voltage().into())
    }

    pub fn max_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_current().into())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceCapabilities(pub(crate) Vec<PowerDataObject, MAX_PDOS>);

impl SourceCapabilities {
    /// Collect source capabilities from a list of PDOs. Surplus PDOs are dropped.
    pub fn new(pdos: &[PowerDataObject]) -> Self {
        if pdos.len() > MAX_PDOS {
            warn!("Dropping {} surplus PDOs", pdos.len() - MAX_PDOS);
        }

        Self(pdos.iter().copied().take(MAX_PDOS).collect())
    }

    pub fn vsafe_5v(&self) -> Option<&FixedSupply> {
        self.0.first().and_then(|supply| {
            if let PowerDataObject::FixedSupply(supply) = supply {
                Some(supply)
            } else {
                None
            }
        })
    }

    pub fn dual_role_power(&self) -> bool {
        self.vsafe_5v().map(FixedSupply::dual_role_power).unwrap_or_default()
    }

    pub fn externally_powered(&self) -> bool {
        self.vsafe_5v()
            .map(FixedSupply::externally_powered)
            .unwrap_or_default()
    }

    /// Determine, whether dual-role data is supported by the source.
    pub fn dual_role_data(&self) -> bool {
        self.vsafe_5v().map(FixedSupply::dual_role_data).unwrap_or_default()
    }

    /// Get power data objects (PDOs) from the source.
    pub fn pdos(&self) -> &[PowerDataObject] {
        &self.0
    }
}

impl PdoState for SourceCapabilities {
    fn pdo_at_object_position(&self, position: u8) -> Option<Kind> {
        self.pdos()
            .get(position.checked_sub(1)? as usize)
            .and_then(PowerDataObject::kind)
    }
}

/// The kinds of PDOs in the most recent source capabilities message.
///
/// A request only carries an object position, so its layout follows from the kind of the PDO
/// that it refers to.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PdoKinds(Vec<Option<Kind>, MAX_PDOS>);

impl PdoKinds {
    /// Replace all entries by the kinds of PDOs in `source_capabilities`.
    pub fn record(&mut self, source_capabilities: &SourceCapabilities) {
        self.0 = source_capabilities.pdos().iter().map(PowerDataObject::kind).collect();
    }

    /// Forget all entries.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// The number of recorded entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no entries are recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PdoState for PdoKinds {
    fn pdo_at_object_position(&self, position: u8) -> Option<Kind> {
        self.0.get(position.checked_sub(1)? as usize).copied().flatten()
    }
}
