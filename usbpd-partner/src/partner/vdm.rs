//! Replies of the sink persona to structured VDM requests.
//!
//! The sink persona poses as a DisplayPort alternate mode adapter. It answers discover identity,
//! discover SVIDs and discover modes for DisplayPort. Everything else stays unanswered.
use heapless::Vec;

use crate::protocol_layer::message::data::Data;
use crate::protocol_layer::message::data::displayport::{
    DISPLAYPORT_SVID, DisplayPortCapabilities, PortCapability, pin_assignment, signaling,
};
use crate::protocol_layer::message::data::vendor_defined::{
    AlternateModeAdapterVDO, CertStatVDO, MAX_VDOS, PD_SID, ProductType, ProductVDO, SvidVDO, UsbSuperSpeedSupport,
    VconnPower, VdmCommand, VdmCommandType, VdmHeader, VdmHeaderStructured, VdmIdentityHeader,
};

/// The USB vendor ID that the adapter reports.
pub const VENDOR_ID: u16 = 0x2109;

/// The USB product ID that the adapter reports.
pub const PRODUCT_ID: u16 = 0x0101;

/// The device release number that the adapter reports.
pub const BCD_DEVICE: u16 = 0x0001;

/// What to do about a VDM request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Send this vendor defined message back.
    Reply(Data),
    /// Stay silent.
    NoResponse,
}

/// Build the reply to a VDM that the port manager sent.
pub fn respond(header: &VdmHeader, _vdos: &[u32]) -> Response {
    let VdmHeader::Structured(header) = header else {
        debug!("Ignoring unstructured VDM for SVID {:#x}", header.svid());
        return Response::NoResponse;
    };

    if header.command_type() != VdmCommandType::InitiatorREQ {
        debug!("Ignoring VDM {:?}", header.command_type());
        return Response::NoResponse;
    }

    let svid = header.standard_or_vid();
    let (reply_svid, vdos) = match (header.command(), svid) {
        (VdmCommand::DiscoverIdentity, _) => (PD_SID, objects(&identity())),
        (VdmCommand::DiscoverSVIDS, _) => (PD_SID, objects(&svids())),
        (VdmCommand::DiscoverModes, DISPLAYPORT_SVID) => (DISPLAYPORT_SVID, objects(&displayport_modes())),
        (command, svid) => {
            debug!("No reply to {:?} for SVID {:#x}", command, svid);
            return Response::NoResponse;
        }
    };

    let reply = VdmHeaderStructured::new(reply_svid, VdmCommandType::ResponderACK, header.command());
    Response::Reply(Data::VendorDefined((VdmHeader::Structured(reply), vdos)))
}

fn objects(vdos: &[u32]) -> Vec<u32, MAX_VDOS> {
    vdos.iter().copied().take(MAX_VDOS).collect()
}

fn identity() -> [u32; 4] {
    let id_header = VdmIdentityHeader(0)
        .with_device_data(true)
        .with_product_type(ProductType::AlternateModeAdapter)
        .with_modal_supported(true)
        .with_vid(VENDOR_ID);
    let product = ProductVDO(0).with_pid(PRODUCT_ID).with_bcd_device(BCD_DEVICE);
    let adapter = AlternateModeAdapterVDO(0)
        .with_vconn_power(VconnPower::W1p5)
        .with_vconn_required(true)
        .with_vbus_required(true)
        .with_usb_superspeed_support(UsbSuperSpeedSupport::BillboardOnly);

    [id_header.0, CertStatVDO(0).0, product.0, adapter.0]
}

fn svids() -> [u32; 1] {
    [SvidVDO(0).with_svid0(DISPLAYPORT_SVID).0]
}

fn displayport_modes() -> [u32; 1] {
    let capabilities = DisplayPortCapabilities(0)
        .with_dfp_d_pin_assignments(pin_assignment::C)
        .with_receptacle(true)
        .with_signaling(signaling::DP_V13)
        .with_capability(PortCapability::SinkOnly);

    [capabilities.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(svid: u16, command: VdmCommand) -> VdmHeader {
        VdmHeader::Structured(VdmHeaderStructured::new(svid, VdmCommandType::InitiatorREQ, command))
    }

    fn reply_objects(response: Response) -> (u32, Vec<u32, MAX_VDOS>) {
        match response {
            Response::Reply(Data::VendorDefined((header, vdos))) => (header.into(), vdos),
            other => panic!("Expected a VDM reply, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_identity() {
        let (header, vdos) = reply_objects(respond(&request(PD_SID, VdmCommand::DiscoverIdentity), &[]));

        assert_eq!(header, 0xff00_8041);
        assert_eq!(vdos.as_slice(), &[0x6c00_2109, 0, 0x0101_0001, 0x3b]);
    }

    #[test]
    fn test_discover_svids() {
        let (header, vdos) = reply_objects(respond(&request(PD_SID, VdmCommand::DiscoverSVIDS), &[]));

        assert_eq!(header, 0xff00_8042);
        assert_eq!(vdos.as_slice(), &[0xff01_0000]);
    }

    #[test]
    fn test_discover_displayport_modes() {
        let (header, vdos) = reply_objects(respond(&request(DISPLAYPORT_SVID, VdmCommand::DiscoverModes), &[]));

        assert_eq!(header, 0xff01_8043);
        assert_eq!(vdos.as_slice(), &[0x445]);
    }

    #[test]
    fn test_no_response() {
        // Modes of other SVIDs are not offered.
        assert_eq!(
            respond(&request(0x18d1, VdmCommand::DiscoverModes), &[]),
            Response::NoResponse
        );
        assert_eq!(
            respond(&request(DISPLAYPORT_SVID, VdmCommand::EnterMode), &[]),
            Response::NoResponse
        );

        let ack = VdmHeader::Structured(VdmHeaderStructured::new(
            PD_SID,
            VdmCommandType::ResponderACK,
            VdmCommand::DiscoverIdentity,
        ));
        assert_eq!(respond(&ack, &[]), Response::NoResponse);
    }
}
