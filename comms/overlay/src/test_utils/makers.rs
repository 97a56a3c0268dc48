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

use std::time::Duration;

use chrono::Utc;
use rand::{rngs::OsRng, RngCore};

use crate::{
    crypto::DefaultCrypto,
    mailbox::{AddMailboxRequest, MailboxData, MailboxPayload, RemoveMailboxRequest},
    net_address::NetworkAddress,
    peer_exchange::Peer,
};

pub fn make_address(n: u16) -> NetworkAddress {
    NetworkAddress::new(format!("peer{:05}.onion", n), n)
}

/// A peer last seen `secs_ago` seconds ago
pub fn make_peer(n: u16, secs_ago: i64) -> Peer {
    Peer::new(make_address(n), Utc::now() - chrono::Duration::seconds(secs_ago))
}

/// Returns a random (secret, public) Ed25519 key pair
pub fn make_keypair() -> (Vec<u8>, Vec<u8>) {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    let public = DefaultCrypto.public_key_from_secret(&secret).unwrap();
    (secret.to_vec(), public)
}

pub fn make_ciphertext(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Mailbox data with a random payload from a random sender to a random receiver
pub fn make_mailbox_data(sequence_number: u32) -> MailboxData {
    MailboxFixture::new().data(sequence_number)
}

/// A sender/receiver pair with one payload, for building signed mailbox requests
pub struct MailboxFixture {
    pub sender: (Vec<u8>, Vec<u8>),
    pub receiver: (Vec<u8>, Vec<u8>),
    pub payload: MailboxPayload,
}

impl MailboxFixture {
    pub fn new() -> Self {
        Self {
            sender: make_keypair(),
            receiver: make_keypair(),
            payload: MailboxPayload::new(make_ciphertext(64), Duration::from_secs(24 * 60 * 60)),
        }
    }

    pub fn data(&self, sequence_number: u32) -> MailboxData {
        MailboxData::new(
            self.payload.clone(),
            sequence_number,
            &self.sender.1,
            self.receiver.1.clone(),
            &DefaultCrypto,
        )
    }

    pub fn add_request(&self, sequence_number: u32) -> AddMailboxRequest {
        self.sign_add(self.data(sequence_number))
    }

    pub fn sign_add(&self, data: MailboxData) -> AddMailboxRequest {
        AddMailboxRequest::new_signed(data, self.sender.1.clone(), &self.sender.0, &DefaultCrypto).unwrap()
    }

    /// A remove request signed by the receiver
    pub fn remove_request(&self) -> RemoveMailboxRequest {
        RemoveMailboxRequest::new_signed(&self.data(0), self.receiver.1.clone(), &self.receiver.0, &DefaultCrypto)
            .unwrap()
    }
}

impl Default for MailboxFixture {
    fn default() -> Self {
        Self::new()
    }
}
