//! The port description that the port manager under test is registered with.
//!
//! The simulated partner is wired to a port that is described here. A host application hands
//! this description to its port manager, so that both sides agree on the port's capabilities.
use heapless::Vec;
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::millivolt;
use uom::si::power::milliwatt;

use crate::DataRole;
use crate::PowerRole;
use crate::protocol_layer::message::data::displayport::DISPLAYPORT_SVID;
use crate::protocol_layer::message::data::sink_capabilities::{SinkFixedSupply, SinkPowerDataObject};
use crate::protocol_layer::message::data::source_capabilities::{FixedSupply, MAX_PDOS, PowerDataObject};
use crate::units::{ElectricCurrent, ElectricPotential, Power};

/// The largest number of alternate modes that a port advertises.
pub const MAX_ALT_MODES: usize = 4;

/// The vendor ID of the vendor specific modes that the port advertises.
pub const VENDOR_SVID: u16 = 0x18d1;

/// The power roles that a port supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortType {
    /// Source only.
    Source,
    /// Sink only.
    Sink,
    /// Dual-role power.
    DualRole,
}

/// Limits of the port, when operating as a sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkLimits {
    /// The highest voltage that the port accepts.
    pub max_voltage: ElectricPotential,
    /// The highest current that the port draws.
    pub max_current: ElectricCurrent,
    /// The highest power that the port draws.
    pub max_power: Power,
    /// The power that the port needs for operation.
    pub operating_power: Power,
}

/// An alternate mode that the port advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AltMode {
    /// The standard or vendor ID of the mode.
    pub svid: u16,
    /// The mode VDO.
    pub vdo: u32,
    /// A human readable description.
    pub description: &'static str,
    /// The data role in which the mode is offered.
    pub role: DataRole,
}

/// The port description.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// PDOs offered as a source.
    pub source_pdos: Vec<PowerDataObject, MAX_PDOS>,
    /// PDOs requested as a sink.
    pub sink_pdos: Vec<SinkPowerDataObject, MAX_PDOS>,
    /// Limits as a sink.
    pub sink_limits: SinkLimits,
    /// The supported power roles.
    pub port_type: PortType,
    /// The preferred power role of a dual-role port.
    pub default_role: PowerRole,
    /// Whether the port controller implements Try.SRC/Try.SNK in hardware.
    pub try_role_hw: bool,
    /// Alternate modes that the port advertises.
    pub alt_modes: Vec<AltMode, MAX_ALT_MODES>,
}

impl Default for Config {
    fn default() -> Self {
        let source_pdo = FixedSupply::new(
            ElectricPotential::new::<millivolt>(5000),
            ElectricCurrent::new::<milliampere>(1500),
        )
        .with_dual_role_power(true)
        .with_usb_communications_capable(true)
        .with_dual_role_data(true);

        let sink_pdo = SinkFixedSupply::new(
            ElectricPotential::new::<millivolt>(5000),
            ElectricCurrent::new::<milliampere>(500),
        )
        .with_dual_role_power(true)
        .with_usb_communications_capable(true)
        .with_dual_role_data(true);

        Self {
            source_pdos: Vec::from_iter([PowerDataObject::FixedSupply(source_pdo)]),
            sink_pdos: Vec::from_iter([SinkPowerDataObject::FixedSupply(sink_pdo)]),
            sink_limits: SinkLimits {
                max_voltage: ElectricPotential::new::<millivolt>(5000),
                max_current: ElectricCurrent::new::<milliampere>(2200),
                max_power: Power::new::<milliwatt>(11000),
                operating_power: Power::new::<milliwatt>(6500),
            },
            port_type: PortType::DualRole,
            default_role: PowerRole::Sink,
            try_role_hw: false,
            alt_modes: Vec::from_iter([
                AltMode {
                    svid: DISPLAYPORT_SVID,
                    vdo: 0,
                    description: "DP alt 1",
                    role: DataRole::Dfp,
                },
                AltMode {
                    svid: VENDOR_SVID,
                    vdo: 0x123,
                    description: "Google mode 1",
                    role: DataRole::Ufp,
                },
                AltMode {
                    svid: VENDOR_SVID,
                    vdo: 0x456,
                    description: "Google mode 2",
                    role: DataRole::Dfp,
                },
            ]),
        }
    }
}
