//! Decoded logging of messages that cross the wire.
//!
//! Every message is logged with its header, followed by one line per data object.
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::millivolt;
use uom::si::power::milliwatt;
use usbpd_partner_traits::TransmitType;

use super::message::Message;
use super::message::data::Data;
use super::message::data::displayport::{
    DISPLAYPORT_SVID, DisplayPortCapabilities, DisplayPortConfiguration, DisplayPortStatus,
};
use super::message::data::request::PowerSource;
use super::message::data::sink_capabilities::SinkPowerDataObject;
use super::message::data::source_capabilities::PowerDataObject;
use super::message::data::vendor_defined::{
    AlternateModeAdapterVDO, CertStatVDO, ProductVDO, SvidVDO, VdmCommand, VdmCommandType, VdmHeader,
    VdmIdentityHeader,
};

/// The direction in which a message crosses the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Transmitted by the port manager, towards the partner.
    Transmit,
    /// Received by the port manager, from the partner.
    Receive,
}

/// Log a message with all of its data objects.
pub fn log_message(direction: Direction, transmit_type: TransmitType, message: &Message) {
    let header = message.header;
    info!(
        "{:?} {:?}: {:?}, ID {}, {} objects, {:?}/{:?}",
        direction,
        transmit_type,
        header.message_type(),
        header.message_id(),
        header.num_objects(),
        header.port_power_role(),
        header.port_data_role()
    );

    match &message.payload {
        None => (),
        Some(Data::SourceCapabilities(capabilities)) => {
            for (index, pdo) in capabilities.pdos().iter().enumerate() {
                log_source_pdo(index + 1, pdo);
            }
        }
        Some(Data::SinkCapabilities(capabilities)) => {
            for (index, pdo) in capabilities.pdos().iter().enumerate() {
                log_sink_pdo(index + 1, pdo);
            }
        }
        Some(Data::Request(power_source)) => log_request(power_source),
        Some(Data::VendorDefined((header, vdos))) => log_vdm(header, vdos),
        Some(Data::Unknown(objects)) => {
            for (index, object) in objects.iter().enumerate() {
                info!("  [{}] {:#x}", index + 1, object);
            }
        }
    }
}

fn log_source_pdo(position: usize, pdo: &PowerDataObject) {
    match pdo {
        PowerDataObject::FixedSupply(supply) => info!(
            "  [{}] fixed {} mV, {} mA{}{}{}{}{}",
            position,
            supply.voltage().get::<millivolt>(),
            supply.max_current().get::<milliampere>(),
            if supply.dual_role_power() { " DRP" } else { "" },
            if supply.usb_suspend_supported() { " suspend" } else { "" },
            if supply.externally_powered() { " ext-powered" } else { "" },
            if supply.usb_communications_capable() { " USB-comm" } else { "" },
            if supply.dual_role_data() { " DRD" } else { "" }
        ),
        PowerDataObject::Battery(supply) => info!(
            "  [{}] battery {}-{} mV, {} mW",
            position,
            supply.min_voltage().get::<millivolt>(),
            supply.max_voltage().get::<millivolt>(),
            supply.max_power().get::<milliwatt>()
        ),
        PowerDataObject::VariableSupply(supply) => info!(
            "  [{}] variable {}-{} mV, {} mA",
            position,
            supply.min_voltage().get::<millivolt>(),
            supply.max_voltage().get::<millivolt>(),
            supply.max_current().get::<milliampere>()
        ),
        PowerDataObject::Unknown(raw) => info!("  [{}] reserved {:#x}", position, raw.0),
    }
}

fn log_sink_pdo(position: usize, pdo: &SinkPowerDataObject) {
    match pdo {
        SinkPowerDataObject::FixedSupply(supply) => info!(
            "  [{}] fixed {} mV, {} mA{}{}{}{}{}",
            position,
            supply.voltage().get::<millivolt>(),
            supply.operational_current().get::<milliampere>(),
            if supply.dual_role_power() { " DRP" } else { "" },
            if supply.higher_capability() { " HC" } else { "" },
            if supply.externally_powered() { " ext-powered" } else { "" },
            if supply.usb_communications_capable() { " USB-comm" } else { "" },
            if supply.dual_role_data() { " DRD" } else { "" }
        ),
        SinkPowerDataObject::Battery(supply) => info!(
            "  [{}] battery {}-{} mV, {} mW",
            position,
            supply.min_voltage().get::<millivolt>(),
            supply.max_voltage().get::<millivolt>(),
            supply.max_power().get::<milliwatt>()
        ),
        SinkPowerDataObject::VariableSupply(supply) => info!(
            "  [{}] variable {}-{} mV, {} mA",
            position,
            supply.min_voltage().get::<millivolt>(),
            supply.max_voltage().get::<millivolt>(),
            supply.max_current().get::<milliampere>()
        ),
        SinkPowerDataObject::Unknown(raw) => info!("  [{}] reserved {:#x}", position, raw.0),
    }
}

fn log_request(power_source: &PowerSource) {
    match power_source {
        PowerSource::FixedVariableSupply(rdo) => info!(
            "  request PDO {}, {} mA operating, {} mA max{}{}{}{}",
            rdo.object_position(),
            rdo.operating_current().get::<milliampere>(),
            rdo.max_operating_current().get::<milliampere>(),
            if rdo.giveback_flag() { " give-back" } else { "" },
            if rdo.capability_mismatch() { " mismatch" } else { "" },
            if rdo.usb_communications_capable() { " USB-comm" } else { "" },
            if rdo.no_usb_suspend() { " no-suspend" } else { "" }
        ),
        PowerSource::Battery(rdo) => info!(
            "  request PDO {}, {} mW operating, {} mW max{}{}{}{}",
            rdo.object_position(),
            rdo.operating_power().get::<milliwatt>(),
            rdo.max_operating_power().get::<milliwatt>(),
            if rdo.giveback_flag() { " give-back" } else { "" },
            if rdo.capability_mismatch() { " mismatch" } else { "" },
            if rdo.usb_communications_capable() { " USB-comm" } else { "" },
            if rdo.no_usb_suspend() { " no-suspend" } else { "" }
        ),
        PowerSource::Unknown(raw) => info!(
            "  request PDO {} of unknown kind, raw {:#x}",
            raw.object_position(),
            raw.0
        ),
    }
}

fn log_vdm(header: &VdmHeader, vdos: &[u32]) {
    let structured = match header {
        VdmHeader::Unstructured(header) => {
            info!("  unstructured VDM SVID {:#x}, data {:#x}", header.standard_or_vid(), header.data());
            for (index, vdo) in vdos.iter().enumerate() {
                info!("  [{}] {:#x}", index + 1, vdo);
            }
            return;
        }
        VdmHeader::Structured(header) => header,
    };

    info!(
        "  VDM SVID {:#x}, version {}.{}, position {}, {:?} {:?}",
        structured.standard_or_vid(),
        structured.vdm_version_major(),
        structured.vdm_version_minor(),
        structured.object_position(),
        structured.command_type(),
        structured.command()
    );

    match (structured.command_type(), structured.command()) {
        (VdmCommandType::ResponderACK, VdmCommand::DiscoverIdentity) => log_identity(vdos),
        (VdmCommandType::ResponderACK, VdmCommand::DiscoverSVIDS) => {
            for svids in vdos.iter().copied().map(SvidVDO) {
                info!("  SVIDs {:#x}, {:#x}", svids.svid0(), svids.svid1());
            }
        }
        (VdmCommandType::ResponderACK, VdmCommand::DiscoverModes)
            if structured.standard_or_vid() == DISPLAYPORT_SVID =>
        {
            for capabilities in vdos.iter().copied().map(DisplayPortCapabilities) {
                info!(
                    "  DP mode: {:?}, pins {:#x}, signaling {:#x}{}{}",
                    capabilities.capability(),
                    capabilities.pin_assignments(),
                    capabilities.signaling(),
                    if capabilities.receptacle() { " receptacle" } else { " plug" },
                    if capabilities.usb20_signaling_not_used() { " no-USB2" } else { "" }
                );
            }
        }
        (_, VdmCommand::DisplayPortStatus | VdmCommand::Attention)
            if structured.standard_or_vid() == DISPLAYPORT_SVID =>
        {
            for status in vdos.iter().copied().map(DisplayPortStatus) {
                log_displayport_status(status);
            }
        }
        (_, VdmCommand::DisplayPortConfig) if structured.standard_or_vid() == DISPLAYPORT_SVID => {
            for configuration in vdos.iter().copied().map(DisplayPortConfiguration) {
                info!(
                    "  DP configure: {:?}, pins {:#x}, signaling {:#x}",
                    configuration.configuration(),
                    configuration.pin_assignments(),
                    configuration.signaling()
                );
            }
        }
        _ => {
            for (index, vdo) in vdos.iter().enumerate() {
                info!("  [{}] {:#x}", index + 1, vdo);
            }
        }
    }
}

fn log_identity(vdos: &[u32]) {
    let mut vdos = vdos.iter().copied();

    if let Some(id_header) = vdos.next().map(VdmIdentityHeader) {
        info!(
            "  ID header: VID {:#x}, {:?}{}{}{}",
            id_header.vid(),
            id_header.product_type(),
            if id_header.host_data() { " host" } else { "" },
            if id_header.device_data() { " device" } else { "" },
            if id_header.modal_supported() { " modal" } else { "" }
        );
    }

    if let Some(cert_stat) = vdos.next().map(CertStatVDO) {
        info!("  cert stat: XID {:#x}", cert_stat.xid());
    }

    if let Some(product) = vdos.next().map(ProductVDO) {
        info!("  product: PID {:#x}, bcdDevice {:#x}", product.pid(), product.bcd_device());
    }

    // An alternate mode adapter reports its capabilities in the product type VDO.
    if let Some(adapter) = vdos.next().map(AlternateModeAdapterVDO) {
        info!(
            "  AMA: HW {}, FW {}, SSTX1 {}, SSTX2 {}, SSRX1 {}, SSRX2 {}, VCONN {:?}{}{}, {:?}",
            adapter.hardware_version(),
            adapter.firmware_version(),
            if adapter.sstx1_configurable() { "C" } else { "F" },
            if adapter.sstx2_configurable() { "C" } else { "F" },
            if adapter.ssrx1_configurable() { "C" } else { "F" },
            if adapter.ssrx2_configurable() { "C" } else { "F" },
            adapter.vconn_power(),
            if adapter.vconn_required() { " VCONN-req" } else { "" },
            if adapter.vbus_required() { " VBUS-req" } else { "" },
            adapter.usb_superspeed_support()
        );
    }
}

fn log_displayport_status(status: DisplayPortStatus) {
    info!(
        "  DP status: connected {:#x}{}{}{}{}{}{}{}",
        status.connected(),
        if status.power_low() { " low-power" } else { "" },
        if status.enabled() { " enabled" } else { "" },
        if status.multi_function_preferred() { " multi-function" } else { "" },
        if status.usb_configuration_request() { " USB-request" } else { "" },
        if status.exit_request() { " exit-request" } else { "" },
        if status.hpd() { " HPD" } else { "" },
        if status.irq_hpd() { " IRQ" } else { "" }
    );
}
