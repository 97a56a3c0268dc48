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

use prost::Message;

use super::peer::Peer;
use crate::proto;

/// Sent to a candidate peer, carrying the peers we are willing to report to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerExchangeRequest {
    pub nonce: i32,
    pub peers: Vec<Peer>,
}

impl PeerExchangeRequest {
    pub fn new(nonce: i32, peers: Vec<Peer>) -> Self {
        Self { nonce, peers }
    }
}

/// The reply to a `PeerExchangeRequest`. The nonce echoes the request nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerExchangeResponse {
    pub nonce: i32,
    pub peers: Vec<Peer>,
}

impl PeerExchangeResponse {
    /// Creates a response with peers sorted by their encoded bytes, so that two responses built from the same set of
    /// peers are byte-for-byte identical.
    pub fn new(nonce: i32, peers: Vec<Peer>) -> Self {
        let mut keyed = peers
            .into_iter()
            .map(|peer| (proto::Peer::from(peer.clone()).encode_to_vec(), peer))
            .collect::<Vec<_>>();
        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        Self {
            nonce,
            peers: keyed.into_iter().map(|(_, peer)| peer).collect(),
        }
    }
}
