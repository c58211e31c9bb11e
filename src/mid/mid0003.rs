//! MID 0003, application communication stop.

use super::{MidCodec, MidError, MidPayload};
use crate::message::{Message, Payload};

pub(super) struct CommunicationStopCodec;

impl MidCodec for CommunicationStopCodec {
    fn mid(&self) -> u16 { 3 }

    fn supported_revisions(&self) -> &'static [u16] { &[1] }

    fn parse(&self, message: &mut Message) -> Result<(), MidError> {
        message.payload = Payload::Decoded(MidPayload::CommunicationStop);
        Ok(())
    }

    fn serialize(&self, message: &mut Message) -> Result<(), MidError> {
        match &message.payload {
            Payload::Empty | Payload::Raw(_) | Payload::Text(_) => Ok(()),
            Payload::Decoded(MidPayload::CommunicationStop) => {
                message.payload = Payload::Empty;
                Ok(())
            }
            Payload::Decoded(_) => Err(MidError::UnexpectedPayload { mid: message.mid }),
        }
    }
}
