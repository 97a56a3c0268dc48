//  Copyright 2022, The Tari Project
//
//  Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
//  following conditions are met:
//
//  1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
//  disclaimer.
//
//  2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
//  following disclaimer in the documentation and/or other materials provided with the distribution.
//
//  3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
//  products derived from this software without specific prior written permission.
//
//  THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
//  INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
//  DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
//  SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
//  SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
//  WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
//  USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::convert::{TryFrom, TryInto};

use super::{
    overlay::{overlay_envelope::Payload, OverlayEnvelope},
    ProtoConversionError,
};
use crate::message::OverlayMessage;

impl TryFrom<OverlayEnvelope> for OverlayMessage {
    type Error = ProtoConversionError;

    fn try_from(envelope: OverlayEnvelope) -> Result<Self, Self::Error> {
        let payload = envelope.payload.ok_or(ProtoConversionError::EmptyEnvelope)?;
        let msg = match payload {
            Payload::PeerExchangeRequest(req) => OverlayMessage::PeerExchangeRequest(req.try_into()?),
            Payload::PeerExchangeResponse(resp) => OverlayMessage::PeerExchangeResponse(resp.try_into()?),
            Payload::AddMailboxRequest(req) => OverlayMessage::AddMailboxRequest(req.try_into()?),
            Payload::RemoveMailboxRequest(req) => OverlayMessage::RemoveMailboxRequest(req.try_into()?),
        };
        Ok(msg)
    }
}

impl From<OverlayMessage> for OverlayEnvelope {
    fn from(msg: OverlayMessage) -> Self {
        let payload = match msg {
            OverlayMessage::PeerExchangeRequest(req) => Payload::PeerExchangeRequest(req.into()),
            OverlayMessage::PeerExchangeResponse(resp) => Payload::PeerExchangeResponse(resp.into()),
            OverlayMessage::AddMailboxRequest(req) => Payload::AddMailboxRequest(req.into()),
            OverlayMessage::RemoveMailboxRequest(req) => Payload::RemoveMailboxRequest(req.into()),
        };
        Self { payload: Some(payload) }
    }
}

impl OverlayMessage {
    /// Decodes an `OverlayEnvelope` from bytes received over a connection
    pub fn decode_envelope(bytes: &[u8]) -> Result<Self, ProtoConversionError> {
        let envelope = <OverlayEnvelope as prost::Message>::decode(bytes)
            .map_err(|err| ProtoConversionError::Decode(err.to_string()))?;
        Self::try_from(envelope)
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::{
        net_address::NetworkAddress,
        peer_exchange::{Peer, PeerExchangeRequest},
    };

    #[test]
    fn it_rejects_an_empty_envelope() {
        assert_eq!(
            OverlayMessage::try_from(OverlayEnvelope { payload: None }),
            Err(ProtoConversionError::EmptyEnvelope)
        );
    }

    #[test]
    fn it_decodes_an_encoded_request() {
        let msg = OverlayMessage::PeerExchangeRequest(PeerExchangeRequest::new(123, vec![Peer::new(
            NetworkAddress::new("abc.onion", 1234),
            Utc::now(),
        )]));
        let decoded = OverlayMessage::decode_envelope(&msg.to_encoded_bytes()).unwrap();
        match decoded {
            OverlayMessage::PeerExchangeRequest(req) => {
                assert_eq!(req.nonce, 123);
                assert_eq!(req.peers[0].address(), &NetworkAddress::new("abc.onion", 1234));
            },
            _ => panic!("Unexpected message type"),
        }
        assert!(OverlayMessage::decode_envelope(&[0xff, 0xff]).is_err());
    }
}
