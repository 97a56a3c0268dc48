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

use std::{fmt, time::Duration};

use chrono::Utc;
use prost::Message;

use crate::{
    crypto::{CryptoError, OverlayCrypto},
    proto,
};

/// The reserved sequence number of a remove request. Once stored, no add for the same hash is accepted again.
pub const MAX_SEQUENCE_NUMBER: u32 = u32::MAX;

/// Content address of a mailbox entry, the hash of its encoded payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MailboxHash(Vec<u8>);

impl MailboxHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for MailboxHash {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for MailboxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// The encrypted message body and how long it should be kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxPayload {
    pub ciphertext: Vec<u8>,
    pub time_to_live: Duration,
}

impl MailboxPayload {
    pub fn new(ciphertext: Vec<u8>, time_to_live: Duration) -> Self {
        Self {
            ciphertext,
            time_to_live,
        }
    }

    pub fn to_encoded_bytes(&self) -> Vec<u8> {
        proto::MailboxPayload::from(self.clone()).encode_to_vec()
    }

    pub fn hash<C: OverlayCrypto + ?Sized>(&self, crypto: &C) -> MailboxHash {
        crypto.hash(&self.to_encoded_bytes()).into()
    }
}

/// A mailbox entry as created by the sender. The signature of an add request covers the canonical encoding of this
/// struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxData {
    pub payload: MailboxPayload,
    pub sequence_number: u32,
    pub sender_public_key_hash: Vec<u8>,
    pub receiver_public_key_hash: Vec<u8>,
    pub receiver_public_key: Vec<u8>,
    /// Creation time in milliseconds since the unix epoch
    pub created_at: i64,
}

impl MailboxData {
    pub fn new<C: OverlayCrypto + ?Sized>(
        payload: MailboxPayload,
        sequence_number: u32,
        sender_public_key: &[u8],
        receiver_public_key: Vec<u8>,
        crypto: &C,
    ) -> Self {
        Self {
            payload,
            sequence_number,
            sender_public_key_hash: crypto.hash(sender_public_key),
            receiver_public_key_hash: crypto.hash(&receiver_public_key),
            receiver_public_key,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn hash<C: OverlayCrypto + ?Sized>(&self, crypto: &C) -> MailboxHash {
        self.payload.hash(crypto)
    }

    pub fn to_encoded_bytes(&self) -> Vec<u8> {
        proto::MailboxData::from(self.clone()).encode_to_vec()
    }

    pub fn is_expired(&self, now_millis: i64) -> bool {
        let ttl = i64::try_from(self.payload.time_to_live.as_millis()).unwrap_or(i64::MAX);
        now_millis.saturating_sub(self.created_at) > ttl
    }

    /// A stored sequence number blocks this data unless it is strictly lower than ours. The tombstone value blocks
    /// unconditionally.
    pub fn is_sequence_nr_invalid(&self, sequence_number_from_map: u32) -> bool {
        sequence_number_from_map == MAX_SEQUENCE_NUMBER || sequence_number_from_map >= self.sequence_number
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMailboxRequest {
    pub data: MailboxData,
    pub signature: Vec<u8>,
    pub sender_public_key: Vec<u8>,
}

impl AddMailboxRequest {
    /// Signs the canonical encoding of `data` with the sender's secret key
    pub fn new_signed<C: OverlayCrypto + ?Sized>(
        data: MailboxData,
        sender_public_key: Vec<u8>,
        sender_secret_key: &[u8],
        crypto: &C,
    ) -> Result<Self, CryptoError> {
        let signature = crypto.sign(&data.to_encoded_bytes(), sender_secret_key)?;
        Ok(Self {
            data,
            signature,
            sender_public_key,
        })
    }

    pub fn is_public_key_invalid<C: OverlayCrypto + ?Sized>(&self, crypto: &C) -> bool {
        crypto.hash(&self.sender_public_key) != self.data.sender_public_key_hash
    }

    pub fn is_signature_invalid<C: OverlayCrypto + ?Sized>(&self, crypto: &C) -> bool {
        !crypto.verify(&self.data.to_encoded_bytes(), &self.signature, &self.sender_public_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveMailboxRequest {
    pub hash: MailboxHash,
    pub owner_public_key: Vec<u8>,
    pub sequence_number: u32,
    pub signature: Vec<u8>,
    /// Creation time in milliseconds since the unix epoch
    pub created_at: i64,
}

impl RemoveMailboxRequest {
    /// Creates a remove request for `data`, signed by the receiver (the only party allowed to remove a mailbox entry).
    pub fn new_signed<C: OverlayCrypto + ?Sized>(
        data: &MailboxData,
        owner_public_key: Vec<u8>,
        owner_secret_key: &[u8],
        crypto: &C,
    ) -> Result<Self, CryptoError> {
        let hash = data.hash(crypto);
        let signature = crypto.sign(hash.as_bytes(), owner_secret_key)?;
        Ok(Self {
            hash,
            owner_public_key,
            sequence_number: MAX_SEQUENCE_NUMBER,
            signature,
            created_at: Utc::now().timestamp_millis(),
        })
    }

    pub fn is_sequence_nr_invalid(&self, sequence_number_from_map: u32) -> bool {
        self.sequence_number <= sequence_number_from_map
    }

    pub fn is_public_key_hash_invalid<C: OverlayCrypto + ?Sized>(&self, stored: &MailboxData, crypto: &C) -> bool {
        crypto.hash(&self.owner_public_key) != stored.receiver_public_key_hash
    }

    pub fn is_signature_invalid<C: OverlayCrypto + ?Sized>(&self, crypto: &C) -> bool {
        !crypto.verify(self.hash.as_bytes(), &self.signature, &self.owner_public_key)
    }
}

/// The last accepted request for a hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxRequest {
    Add(AddMailboxRequest),
    Remove(RemoveMailboxRequest),
}

impl MailboxRequest {
    pub fn sequence_number(&self) -> u32 {
        match self {
            MailboxRequest::Add(req) => req.data.sequence_number,
            MailboxRequest::Remove(req) => req.sequence_number,
        }
    }

    pub fn created_at(&self) -> i64 {
        match self {
            MailboxRequest::Add(req) => req.data.created_at,
            MailboxRequest::Remove(req) => req.created_at,
        }
    }

    /// Remove requests carry no payload and never expire
    pub fn is_expired(&self, now_millis: i64) -> bool {
        match self {
            MailboxRequest::Add(req) => req.data.is_expired(now_millis),
            MailboxRequest::Remove(_) => false,
        }
    }

    /// The key the request is stored under
    pub fn hash<C: OverlayCrypto + ?Sized>(&self, crypto: &C) -> MailboxHash {
        match self {
            MailboxRequest::Add(req) => req.data.hash(crypto),
            MailboxRequest::Remove(req) => req.hash.clone(),
        }
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, MailboxRequest::Remove(_))
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            MailboxRequest::Add(req) => proto::AddMailboxRequest::from(req.clone()).encoded_len(),
            MailboxRequest::Remove(req) => proto::RemoveMailboxRequest::from(req.clone()).encoded_len(),
        }
    }
}

impl From<AddMailboxRequest> for MailboxRequest {
    fn from(req: AddMailboxRequest) -> Self {
        MailboxRequest::Add(req)
    }
}

impl From<RemoveMailboxRequest> for MailboxRequest {
    fn from(req: RemoveMailboxRequest) -> Self {
        MailboxRequest::Remove(req)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{make_keypair, make_mailbox_data};

    #[test]
    fn hash_ignores_sequence_number_and_creation_time() {
        let crypto = crate::crypto::DefaultCrypto;
        let data = make_mailbox_data(1);
        let mut bumped = data.clone();
        bumped.sequence_number = 2;
        bumped.created_at += 1000;
        assert_eq!(data.hash(&crypto), bumped.hash(&crypto));
        assert_ne!(data.to_encoded_bytes(), bumped.to_encoded_bytes());
    }

    #[test]
    fn it_expires_after_time_to_live() {
        let mut data = make_mailbox_data(1);
        data.payload.time_to_live = Duration::from_secs(10);
        assert!(!data.is_expired(data.created_at + 10_000));
        assert!(data.is_expired(data.created_at + 10_001));
    }

    #[test]
    fn sequence_numbers_must_increase() {
        let data = make_mailbox_data(5);
        assert!(!data.is_sequence_nr_invalid(0));
        assert!(!data.is_sequence_nr_invalid(4));
        assert!(data.is_sequence_nr_invalid(5));
        assert!(data.is_sequence_nr_invalid(6));
        assert!(data.is_sequence_nr_invalid(MAX_SEQUENCE_NUMBER));
    }

    #[test]
    fn remove_request_is_signed_by_the_receiver() {
        let crypto = crate::crypto::DefaultCrypto;
        let (receiver_secret, receiver_public) = make_keypair();
        let (other_secret, _) = make_keypair();
        let data = make_mailbox_data(1);
        let remove =
            RemoveMailboxRequest::new_signed(&data, receiver_public.clone(), &receiver_secret, &crypto).unwrap();
        assert_eq!(remove.sequence_number, MAX_SEQUENCE_NUMBER);
        assert!(!remove.is_signature_invalid(&crypto));

        let forged = RemoveMailboxRequest::new_signed(&data, receiver_public, &other_secret, &crypto).unwrap();
        assert!(forged.is_signature_invalid(&crypto));
    }
}
