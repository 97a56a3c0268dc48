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

use std::fmt;

use super::data::MailboxData;

/// Why a mailbox request was not stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxRejection {
    /// The stored sequence number is not lower than the request's, or the hash has been removed
    SequenceNrInvalid,
    /// The payload's time-to-live has elapsed
    Expired,
    /// The entry is structurally invalid
    DataInvalid,
    /// The public key does not hash to the key hash embedded in the entry
    PublicKeyInvalid,
    SignatureInvalid,
    /// The store is full and the request is for a new hash
    MaxMapSizeReached,
}

impl fmt::Display for MailboxRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MailboxRejection::*;
        let s = match self {
            SequenceNrInvalid => "sequence number invalid",
            Expired => "expired",
            DataInvalid => "data invalid",
            PublicKeyInvalid => "public key invalid",
            SignatureInvalid => "signature invalid",
            MaxMapSizeReached => "max map size reached",
        };
        f.write_str(s)
    }
}

/// The outcome of an add or remove. Validation failures are a value, not an error: callers branch on the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxStoreResult {
    Added,
    /// The entry was removed. Contains the data that was stored.
    Removed(MailboxData),
    /// Nothing was stored for the hash. The remove request has been recorded so that a late add cannot resurrect it.
    NoEntry,
    /// The hash was already removed
    AlreadyRemoved,
    Rejected(MailboxRejection),
}

impl MailboxStoreResult {
    /// True unless the request was rejected. `NoEntry` and `AlreadyRemoved` leave the hash removed, which is what the
    /// requester asked for.
    pub fn is_success(&self) -> bool {
        !matches!(self, MailboxStoreResult::Rejected(_))
    }

    pub fn rejection(&self) -> Option<MailboxRejection> {
        match self {
            MailboxStoreResult::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<MailboxRejection> for MailboxStoreResult {
    fn from(reason: MailboxRejection) -> Self {
        MailboxStoreResult::Rejected(reason)
    }
}

impl fmt::Display for MailboxStoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailboxStoreResult::Added => write!(f, "added"),
            MailboxStoreResult::Removed(_) => write!(f, "removed"),
            MailboxStoreResult::NoEntry => write!(f, "no entry"),
            MailboxStoreResult::AlreadyRemoved => write!(f, "already removed"),
            MailboxStoreResult::Rejected(reason) => write!(f, "rejected ({})", reason),
        }
    }
}
