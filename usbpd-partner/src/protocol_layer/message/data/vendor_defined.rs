//! Definitions of vendor defined message content.
//!
//! Covers the VDM header and the data objects of the discover identity and discover SVIDs
//! responses. DisplayPort specific objects live in [`super::displayport`].
use proc_bitfield::bitfield;

/// The standard ID of the USB PD specification itself.
pub const PD_SID: u16 = 0xff00;

/// The largest number of data objects that follow a VDM header.
pub const MAX_VDOS: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VdmCommandType {
    InitiatorREQ,
    ResponderACK,
    ResponderNAK,
    ResponderBSY,
}

impl From<VdmCommandType> for u8 {
    fn from(value: VdmCommandType) -> Self {
        match value {
            VdmCommandType::InitiatorREQ => 0,
            VdmCommandType::ResponderACK => 1,
            VdmCommandType::ResponderNAK => 2,
            VdmCommandType::ResponderBSY => 3,
        }
    }
}

impl From<u8> for VdmCommandType {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0 => VdmCommandType::InitiatorREQ,
            1 => VdmCommandType::ResponderACK,
            2 => VdmCommandType::ResponderNAK,
            _ => VdmCommandType::ResponderBSY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VdmCommand {
    DiscoverIdentity,
    DiscoverSVIDS,
    DiscoverModes,
    EnterMode,
    ExitMode,
    Attention,
    DisplayPortStatus,
    DisplayPortConfig,
    /// A reserved or SVID specific command.
    Other(u8),
}

impl From<VdmCommand> for u8 {
    fn from(value: VdmCommand) -> Self {
        match value {
            VdmCommand::DiscoverIdentity => 0x1,
            VdmCommand::DiscoverSVIDS => 0x2,
            VdmCommand::DiscoverModes => 0x3,
            VdmCommand::EnterMode => 0x4,
            VdmCommand::ExitMode => 0x5,
            VdmCommand::Attention => 0x6,
            VdmCommand::DisplayPortStatus => 0x10,
            VdmCommand::DisplayPortConfig => 0x11,
            VdmCommand::Other(x) => x,
        }
    }
}

impl From<u8> for VdmCommand {
    fn from(value: u8) -> Self {
        match value {
            0x01 => VdmCommand::DiscoverIdentity,
            0x02 => VdmCommand::DiscoverSVIDS,
            0x03 => VdmCommand::DiscoverModes,
            0x04 => VdmCommand::EnterMode,
            0x05 => VdmCommand::ExitMode,
            0x06 => VdmCommand::Attention,
            0x10 => VdmCommand::DisplayPortStatus,
            0x11 => VdmCommand::DisplayPortConfig,
            x => VdmCommand::Other(x),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VdmType {
    Unstructured,
    Structured,
}

impl From<VdmType> for bool {
    fn from(value: VdmType) -> Self {
        match value {
            VdmType::Unstructured => false,
            VdmType::Structured => true,
        }
    }
}

impl From<bool> for VdmType {
    fn from(value: bool) -> Self {
        match value {
            true => VdmType::Structured,
            false => VdmType::Unstructured,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VdmHeader {
    Structured(VdmHeaderStructured),
    Unstructured(VdmHeaderUnstructured),
}

impl VdmHeader {
    /// The standard or vendor ID that the message belongs to.
    pub fn svid(&self) -> u16 {
        match self {
            VdmHeader::Structured(header) => header.standard_or_vid(),
            VdmHeader::Unstructured(header) => header.standard_or_vid(),
        }
    }
}

impl From<VdmHeader> for u32 {
    fn from(value: VdmHeader) -> Self {
        match value {
            VdmHeader::Structured(header) => header.into(),
            VdmHeader::Unstructured(header) => header.into(),
        }
    }
}

impl From<u32> for VdmHeader {
    fn from(value: u32) -> Self {
        let header = VdmHeaderRaw(value);
        match header.vdm_type() {
            VdmType::Structured => VdmHeader::Structured(VdmHeaderStructured(value)),
            VdmType::Unstructured => VdmHeader::Unstructured(VdmHeaderUnstructured(value)),
        }
    }
}

bitfield! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct VdmHeaderRaw(pub u32): FromStorage, IntoStorage {
        /// VDM Standard or Vendor ID
        pub standard_or_vid: u16 @ 16..=31,
        /// VDM Type (Unstructured/Structured)
        pub vdm_type: bool [VdmType] @ 15,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct VdmHeaderStructured(pub u32): FromStorage, IntoStorage {
        /// VDM Standard or Vendor ID
        pub standard_or_vid: u16 @ 16..=31,
        /// VDM Type (Unstructured/Structured)
        pub vdm_type: bool [VdmType] @ 15,
        /// Structured VDM version, major
        pub vdm_version_major: u8 @ 13..=14,
        /// Structured VDM version, minor
        pub vdm_version_minor: u8 @ 11..=12,
        /// Object Position
        pub object_position: u8 @ 8..=10,
        /// Command Type
        pub command_type: u8 [VdmCommandType] @ 6..=7,
        /// Command
        pub command: u8 [VdmCommand] @ 0..=4,
    }
}

impl Default for VdmHeaderStructured {
    fn default() -> Self {
        VdmHeaderStructured(0).with_vdm_type(VdmType::Structured)
    }
}

impl VdmHeaderStructured {
    /// Create a structured VDM header for a version 1.0 exchange.
    pub fn new(svid: u16, command_type: VdmCommandType, command: VdmCommand) -> Self {
        Self::default()
            .with_standard_or_vid(svid)
            .with_command_type(command_type)
            .with_command(command)
    }
}

bitfield! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct VdmHeaderUnstructured(pub u32): FromStorage, IntoStorage {
        /// Vdm Standard or Vendor ID
        pub standard_or_vid: u16 @ 16..=31,
        /// Vdm Type (Unstructured/Structured)
        pub vdm_type: bool [VdmType] @ 15,
        /// Message defined
        pub data: u16 @ 0..=14
    }
}

/// Product types that a discover identity response may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProductType {
    Undefined,
    Hub,
    Peripheral,
    PassiveCable,
    ActiveCable,
    AlternateModeAdapter,
    /// A reserved product type.
    Reserved(u8),
}

impl From<ProductType> for u8 {
    fn from(value: ProductType) -> Self {
        match value {
            ProductType::Undefined => 0,
            ProductType::Hub => 1,
            ProductType::Peripheral => 2,
            ProductType::PassiveCable => 3,
            ProductType::ActiveCable => 4,
            ProductType::AlternateModeAdapter => 5,
            ProductType::Reserved(x) => x,
        }
    }
}

impl From<u8> for ProductType {
    fn from(value: u8) -> Self {
        match value {
            0 => ProductType::Undefined,
            1 => ProductType::Hub,
            2 => ProductType::Peripheral,
            3 => ProductType::PassiveCable,
            4 => ProductType::ActiveCable,
            5 => ProductType::AlternateModeAdapter,
            x => ProductType::Reserved(x),
        }
    }
}

bitfield! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct VdmIdentityHeader(pub u32): FromStorage, IntoStorage {
        /// Host data capable
        pub host_data: bool @ 31,
        /// Device data capable
        pub device_data: bool @ 30,
        /// Product type
        pub product_type: u8 [ProductType] @ 27..=29,
        /// Modal Operation Supported
        pub modal_supported: bool @ 26,
        /// VID
        pub vid: u16 @ 0..=15,
    }
}

bitfield! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct CertStatVDO(pub u32): FromStorage, IntoStorage {
        /// XID
        pub xid: u32 @ 0..=31,
    }
}

bitfield! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct ProductVDO(pub u32): FromStorage, IntoStorage {
        /// USB Product ID
        pub pid: u16 @ 16..=31,
        /// Device release number, BCD encoded
        pub bcd_device: u16 @ 0..=15,
    }
}

/// The power that an alternate mode adapter draws from VCONN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VconnPower {
    W1,
    W1p5,
    W2,
    W3,
    W4,
    W5,
    W6,
    Reserved,
}

impl From<VconnPower> for u8 {
    fn from(value: VconnPower) -> Self {
        match value {
            VconnPower::W1 => 0,
            VconnPower::W1p5 => 1,
            VconnPower::W2 => 2,
            VconnPower::W3 => 3,
            VconnPower::W4 => 4,
            VconnPower::W5 => 5,
            VconnPower::W6 => 6,
            VconnPower::Reserved => 7,
        }
    }
}

impl From<u8> for VconnPower {
    fn from(value: u8) -> Self {
        match value {
            0 => VconnPower::W1,
            1 => VconnPower::W1p5,
            2 => VconnPower::W2,
            3 => VconnPower::W3,
            4 => VconnPower::W4,
            5 => VconnPower::W5,
            6 => VconnPower::W6,
            _ => VconnPower::Reserved,
        }
    }
}

/// The highest USB signaling that an alternate mode adapter supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbSuperSpeedSupport {
    Usb2Only,
    Gen1,
    Gen2,
    BillboardOnly,
    Reserved(u8),
}

impl From<UsbSuperSpeedSupport> for u8 {
    fn from(value: UsbSuperSpeedSupport) -> Self {
        match value {
            UsbSuperSpeedSupport::Usb2Only => 0,
            UsbSuperSpeedSupport::Gen1 => 1,
            UsbSuperSpeedSupport::Gen2 => 2,
            UsbSuperSpeedSupport::BillboardOnly => 3,
            UsbSuperSpeedSupport::Reserved(x) => x,
        }
    }
}

impl From<u8> for UsbSuperSpeedSupport {
    fn from(value: u8) -> Self {
        match value {
            0 => UsbSuperSpeedSupport::Usb2Only,
            1 => UsbSuperSpeedSupport::Gen1,
            2 => UsbSuperSpeedSupport::Gen2,
            3 => UsbSuperSpeedSupport::BillboardOnly,
            x => UsbSuperSpeedSupport::Reserved(x),
        }
    }
}

bitfield! {
    /// The product type VDO of an alternate mode adapter.
    ///
    /// The superspeed direction flags are set for configurable lanes, and cleared for fixed ones.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct AlternateModeAdapterVDO(pub u32): FromStorage, IntoStorage {
        pub hardware_version: u8 @ 28..=31,
        pub firmware_version: u8 @ 24..=27,
        pub sstx1_configurable: bool @ 11,
        pub sstx2_configurable: bool @ 10,
        pub ssrx1_configurable: bool @ 9,
        pub ssrx2_configurable: bool @ 8,
        pub vconn_power: u8 [VconnPower] @ 5..=7,
        pub vconn_required: bool @ 4,
        pub vbus_required: bool @ 3,
        pub usb_superspeed_support: u8 [UsbSuperSpeedSupport] @ 0..=2,
    }
}

bitfield! {
    /// One entry of a discover SVIDs response, carrying two SVIDs.
    ///
    /// A zero SVID terminates the list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct SvidVDO(pub u32): FromStorage, IntoStorage {
        pub svid0: u16 @ 16..=31,
        pub svid1: u16 @ 0..=15,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_header() {
        let header = VdmHeaderStructured::new(PD_SID, VdmCommandType::ResponderACK, VdmCommand::DiscoverIdentity);

        assert_eq!(header.0, 0xff00_8041);
        assert_eq!(VdmHeader::from(header.0), VdmHeader::Structured(header));
        assert_eq!(VdmHeader::from(header.0).svid(), PD_SID);
    }

    #[test]
    fn test_unknown_command_does_not_panic() {
        let header = VdmHeaderStructured(0xff01_801f);

        assert_eq!(header.command(), VdmCommand::Other(0x1f));
        assert_eq!(header.command_type(), VdmCommandType::InitiatorREQ);
    }

    #[test]
    fn test_structured_header_fields() {
        for raw_command in 0..=0x1f_u8 {
            for raw_command_type in 0..=0b11_u8 {
                for position in 0..=7_u8 {
                    let command = VdmCommand::from(raw_command);
                    let command_type = VdmCommandType::from(raw_command_type);
                    let header =
                        VdmHeaderStructured::new(0xff01, command_type, command).with_object_position(position);

                    assert_eq!(header.command(), command);
                    assert_eq!(u8::from(header.command()), raw_command);
                    assert_eq!(header.command_type(), command_type);
                    assert_eq!(u8::from(header.command_type()), raw_command_type);
                    assert_eq!(header.object_position(), position);
                    assert_eq!(header.standard_or_vid(), 0xff01);
                    assert_eq!(VdmHeader::from(u32::from(header)), VdmHeader::Structured(header));
                }
            }
        }
    }

    #[test]
    fn test_unstructured_header() {
        let header = VdmHeader::from(0x18d1_1234);

        assert!(matches!(header, VdmHeader::Unstructured(_)));
        assert_eq!(header.svid(), 0x18d1);
        assert_eq!(u32::from(header), 0x18d1_1234);
    }

    #[test]
    fn test_alternate_mode_adapter_vdo() {
        let vdo = AlternateModeAdapterVDO(0)
            .with_vconn_power(VconnPower::W1p5)
            .with_vconn_required(true)
            .with_vbus_required(true)
            .with_usb_superspeed_support(UsbSuperSpeedSupport::BillboardOnly);

        assert_eq!(vdo.0, 0x3b);
        assert_eq!(vdo.vconn_power(), VconnPower::W1p5);
    }
}
