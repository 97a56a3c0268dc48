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

//! # Mailbox
//!
//! Store-and-forward storage for messages addressed to offline peers. Entries are keyed by the hash of their
//! encrypted payload and signed by the sender. Every node keeps the last accepted add or remove request per hash, so
//! that nodes which do not trust each other can replicate the store by exchanging inventories. Sequence numbers
//! strictly increase per hash and only the receiver of an entry can remove it.

mod config;
pub use config::MailboxConfig;

mod data;
pub use data::{
    AddMailboxRequest,
    MailboxData,
    MailboxHash,
    MailboxPayload,
    MailboxRequest,
    RemoveMailboxRequest,
    MAX_SEQUENCE_NUMBER,
};

mod event;
pub use event::MailboxEvent;

mod inventory;
pub use inventory::{InventoryFilter, MailboxInventory};

mod result;
pub use result::{MailboxRejection, MailboxStoreResult};

mod service;
pub use service::MailboxService;

mod store;
pub use store::{MailboxSnapshot, MailboxStore};
