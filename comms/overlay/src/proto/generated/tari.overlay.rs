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

/// The host and port of an overlay node
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Address {
    #[prost(string, tag = "1")]
    pub host: ::prost::alloc::string::String,
    #[prost(uint32, tag = "2")]
    pub port: u32,
}
/// A peer and the time (unix millis) it was last seen or reported
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Peer {
    #[prost(message, optional, tag = "1")]
    pub address: ::core::option::Option<Address>,
    #[prost(int64, tag = "2")]
    pub last_seen_millis: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PeerExchangeRequest {
    #[prost(int32, tag = "1")]
    pub nonce: i32,
    #[prost(message, repeated, tag = "2")]
    pub peers: ::prost::alloc::vec::Vec<Peer>,
}
/// The response to a PeerExchangeRequest. The nonce echoes the request nonce and peers are sorted by their encoded
/// bytes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PeerExchangeResponse {
    #[prost(int32, tag = "1")]
    pub nonce: i32,
    #[prost(message, repeated, tag = "2")]
    pub peers: ::prost::alloc::vec::Vec<Peer>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MailboxPayload {
    #[prost(bytes = "vec", tag = "1")]
    pub ciphertext: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub ttl_millis: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MailboxData {
    #[prost(message, optional, tag = "1")]
    pub payload: ::core::option::Option<MailboxPayload>,
    #[prost(uint32, tag = "2")]
    pub sequence_number: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub sender_public_key_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub receiver_public_key_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub receiver_public_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag = "6")]
    pub created_at_millis: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddMailboxRequest {
    #[prost(message, optional, tag = "1")]
    pub data: ::core::option::Option<MailboxData>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub sender_public_key: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RemoveMailboxRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub owner_public_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub sequence_number: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub signature: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag = "5")]
    pub created_at_millis: i64,
}
/// Wraps every message sent over an overlay connection
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OverlayEnvelope {
    #[prost(oneof = "overlay_envelope::Payload", tags = "1, 2, 3, 4")]
    pub payload: ::core::option::Option<overlay_envelope::Payload>,
}
/// Nested message and enum types in `OverlayEnvelope`.
pub mod overlay_envelope {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "1")]
        PeerExchangeRequest(super::PeerExchangeRequest),
        #[prost(message, tag = "2")]
        PeerExchangeResponse(super::PeerExchangeResponse),
        #[prost(message, tag = "3")]
        AddMailboxRequest(super::AddMailboxRequest),
        #[prost(message, tag = "4")]
        RemoveMailboxRequest(super::RemoveMailboxRequest),
    }
}
