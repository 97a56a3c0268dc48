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

use std::convert::TryFrom;

use chrono::{TimeZone, Utc};

use super::{overlay as proto, ProtoConversionError};
use crate::{
    net_address::NetworkAddress,
    peer_exchange::{Peer, PeerExchangeRequest, PeerExchangeResponse},
};

//---------------------------------- NetworkAddress --------------------------------------------//

impl TryFrom<proto::Address> for NetworkAddress {
    type Error = ProtoConversionError;

    fn try_from(address: proto::Address) -> Result<Self, Self::Error> {
        if address.host.is_empty() {
            return Err(ProtoConversionError::InvalidAddress("empty host".to_string()));
        }
        let port = u16::try_from(address.port)
            .map_err(|_| ProtoConversionError::InvalidAddress(format!("port {} out of range", address.port)))?;
        Ok(NetworkAddress::new(address.host, port))
    }
}

impl From<NetworkAddress> for proto::Address {
    fn from(address: NetworkAddress) -> Self {
        Self {
            host: address.host().to_string(),
            port: u32::from(address.port()),
        }
    }
}

//---------------------------------- Peer --------------------------------------------//

impl TryFrom<proto::Peer> for Peer {
    type Error = ProtoConversionError;

    fn try_from(peer: proto::Peer) -> Result<Self, Self::Error> {
        let address = peer.address.ok_or(ProtoConversionError::MissingField("address"))?;
        let last_seen = Utc
            .timestamp_millis_opt(peer.last_seen_millis)
            .single()
            .ok_or(ProtoConversionError::InvalidTimestamp(peer.last_seen_millis))?;
        Ok(Peer::new(NetworkAddress::try_from(address)?, last_seen))
    }
}

impl From<Peer> for proto::Peer {
    fn from(peer: Peer) -> Self {
        Self {
            last_seen_millis: peer.last_seen().timestamp_millis(),
            address: Some(peer.address().clone().into()),
        }
    }
}

//---------------------------------- PeerExchange --------------------------------------------//

fn peers_from_proto(peers: Vec<proto::Peer>) -> Result<Vec<Peer>, ProtoConversionError> {
    peers.into_iter().map(Peer::try_from).collect()
}

impl TryFrom<proto::PeerExchangeRequest> for PeerExchangeRequest {
    type Error = ProtoConversionError;

    fn try_from(request: proto::PeerExchangeRequest) -> Result<Self, Self::Error> {
        Ok(PeerExchangeRequest::new(request.nonce, peers_from_proto(request.peers)?))
    }
}

impl From<PeerExchangeRequest> for proto::PeerExchangeRequest {
    fn from(request: PeerExchangeRequest) -> Self {
        Self {
            nonce: request.nonce,
            peers: request.peers.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<proto::PeerExchangeResponse> for PeerExchangeResponse {
    type Error = ProtoConversionError;

    fn try_from(response: proto::PeerExchangeResponse) -> Result<Self, Self::Error> {
        // Re-sort on receipt so that the domain type always upholds its ordering
        Ok(PeerExchangeResponse::new(response.nonce, peers_from_proto(response.peers)?))
    }
}

impl From<PeerExchangeResponse> for proto::PeerExchangeResponse {
    fn from(response: PeerExchangeResponse) -> Self {
        Self {
            nonce: response.nonce,
            peers: response.peers.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_rejects_malformed_peers() {
        let missing_address = proto::Peer {
            address: None,
            last_seen_millis: 0,
        };
        assert_eq!(
            Peer::try_from(missing_address),
            Err(ProtoConversionError::MissingField("address"))
        );

        let bad_port = proto::Peer {
            address: Some(proto::Address {
                host: "abc.onion".to_string(),
                port: 70_000,
            }),
            last_seen_millis: 0,
        };
        assert!(matches!(
            Peer::try_from(bad_port),
            Err(ProtoConversionError::InvalidAddress(_))
        ));

        let bad_timestamp = proto::Peer {
            address: Some(proto::Address {
                host: "abc.onion".to_string(),
                port: 1,
            }),
            last_seen_millis: i64::MAX,
        };
        assert_eq!(
            Peer::try_from(bad_timestamp),
            Err(ProtoConversionError::InvalidTimestamp(i64::MAX))
        );
    }

    #[test]
    fn it_keeps_millisecond_precision() {
        let last_seen = Utc.timestamp_millis_opt(1_650_000_000_123).single().unwrap();
        let peer = Peer::new(NetworkAddress::new("abc.onion", 18141), last_seen);
        let converted = Peer::try_from(proto::Peer::from(peer.clone())).unwrap();
        assert_eq!(converted.address(), peer.address());
        assert_eq!(converted.last_seen(), last_seen);
    }
}
