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

use std::{convert::TryFrom, time::Duration};

use super::{overlay as proto, ProtoConversionError};
use crate::mailbox::{AddMailboxRequest, MailboxData, MailboxHash, MailboxPayload, RemoveMailboxRequest};

//---------------------------------- MailboxPayload --------------------------------------------//

impl From<proto::MailboxPayload> for MailboxPayload {
    fn from(payload: proto::MailboxPayload) -> Self {
        MailboxPayload::new(payload.ciphertext, Duration::from_millis(payload.ttl_millis))
    }
}

impl From<MailboxPayload> for proto::MailboxPayload {
    fn from(payload: MailboxPayload) -> Self {
        Self {
            ciphertext: payload.ciphertext,
            ttl_millis: u64::try_from(payload.time_to_live.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

//---------------------------------- MailboxData --------------------------------------------//

impl TryFrom<proto::MailboxData> for MailboxData {
    type Error = ProtoConversionError;

    fn try_from(data: proto::MailboxData) -> Result<Self, Self::Error> {
        let payload = data.payload.ok_or(ProtoConversionError::MissingField("payload"))?;
        Ok(Self {
            payload: payload.into(),
            sequence_number: data.sequence_number,
            sender_public_key_hash: data.sender_public_key_hash,
            receiver_public_key_hash: data.receiver_public_key_hash,
            receiver_public_key: data.receiver_public_key,
            created_at: data.created_at_millis,
        })
    }
}

impl From<MailboxData> for proto::MailboxData {
    fn from(data: MailboxData) -> Self {
        Self {
            payload: Some(data.payload.into()),
            sequence_number: data.sequence_number,
            sender_public_key_hash: data.sender_public_key_hash,
            receiver_public_key_hash: data.receiver_public_key_hash,
            receiver_public_key: data.receiver_public_key,
            created_at_millis: data.created_at,
        }
    }
}

//---------------------------------- Requests --------------------------------------------//

impl TryFrom<proto::AddMailboxRequest> for AddMailboxRequest {
    type Error = ProtoConversionError;

    fn try_from(request: proto::AddMailboxRequest) -> Result<Self, Self::Error> {
        let data = request.data.ok_or(ProtoConversionError::MissingField("data"))?;
        Ok(Self {
            data: MailboxData::try_from(data)?,
            signature: request.signature,
            sender_public_key: request.sender_public_key,
        })
    }
}

impl From<AddMailboxRequest> for proto::AddMailboxRequest {
    fn from(request: AddMailboxRequest) -> Self {
        Self {
            data: Some(request.data.into()),
            signature: request.signature,
            sender_public_key: request.sender_public_key,
        }
    }
}

impl TryFrom<proto::RemoveMailboxRequest> for RemoveMailboxRequest {
    type Error = ProtoConversionError;

    fn try_from(request: proto::RemoveMailboxRequest) -> Result<Self, Self::Error> {
        if request.hash.is_empty() {
            return Err(ProtoConversionError::MissingField("hash"));
        }
        Ok(Self {
            hash: MailboxHash::from(request.hash),
            owner_public_key: request.owner_public_key,
            sequence_number: request.sequence_number,
            signature: request.signature,
            created_at: request.created_at_millis,
        })
    }
}

impl From<RemoveMailboxRequest> for proto::RemoveMailboxRequest {
    fn from(request: RemoveMailboxRequest) -> Self {
        Self {
            hash: request.hash.into_vec(),
            owner_public_key: request.owner_public_key,
            sequence_number: request.sequence_number,
            signature: request.signature,
            created_at_millis: request.created_at,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_requires_mailbox_data() {
        let request = proto::AddMailboxRequest {
            data: None,
            signature: vec![1; 64],
            sender_public_key: vec![2; 32],
        };
        assert_eq!(
            AddMailboxRequest::try_from(request),
            Err(ProtoConversionError::MissingField("data"))
        );
    }

    #[test]
    fn it_requires_a_payload() {
        let data = proto::MailboxData {
            payload: None,
            sequence_number: 1,
            ..Default::default()
        };
        assert_eq!(
            MailboxData::try_from(data),
            Err(ProtoConversionError::MissingField("payload"))
        );
    }

    #[test]
    fn it_rejects_a_remove_without_a_hash() {
        let request = proto::RemoveMailboxRequest::default();
        assert_eq!(
            RemoveMailboxRequest::try_from(request),
            Err(ProtoConversionError::MissingField("hash"))
        );
    }
}
