use rosc::{OscMessage, OscPacket, OscType};

use super::sample::FrameRecord;

pub const VISAGE_ADDR: &str = "/visage";

pub trait FrameMessage {
    fn from_record(record: &FrameRecord) -> Self;
    fn serialize(self) -> Option<Vec<u8>>;
}

impl FrameMessage for OscMessage {
    fn from_record(record: &FrameRecord) -> OscMessage {
        OscMessage {
            addr: VISAGE_ADDR.to_string(),
            args: record.values().iter().copied().map(OscType::Float).collect(),
        }
    }

    fn serialize(self) -> Option<Vec<u8>> {
        rosc::encoder::encode(&OscPacket::Message(self))
            .map_err(|e| log::debug!("Could not encode frame: {:?}", e))
            .ok()
    }
}
