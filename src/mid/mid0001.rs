//! MID 0001, application communication start.
//!
//! The request carries no body in any revision this client speaks; the
//! controller answers with MID 0002 or MID 0004.

use super::{MidCodec, MidError, MidPayload};
use crate::message::{Message, Payload};

pub(super) struct CommunicationStartCodec;

impl MidCodec for CommunicationStartCodec {
    fn mid(&self) -> u16 { 1 }

    fn supported_revisions(&self) -> &'static [u16] { &[1, 2, 3, 4, 5, 6] }

    fn parse(&self, message: &mut Message) -> Result<(), MidError> {
        message.payload = Payload::Decoded(MidPayload::CommunicationStart);
        Ok(())
    }

    fn serialize(&self, message: &mut Message) -> Result<(), MidError> {
        match &message.payload {
            Payload::Empty | Payload::Raw(_) | Payload::Text(_) => Ok(()),
            Payload::Decoded(MidPayload::CommunicationStart) => {
                message.payload = Payload::Empty;
                Ok(())
            }
            Payload::Decoded(_) => Err(MidError::UnexpectedPayload { mid: message.mid }),
        }
    }
}
