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

//! # Tari Comms Overlay
//!
//! Topology maintenance and store-and-forward storage for a Tor-routed overlay network.
//!
//! ## Modules
//!
//! - `peer_exchange` - Selects which peers to contact (`PeerExchangeStrategy`) and runs the peer exchange protocol
//!   against them (`PeerExchangeService`), retrying with backoff until the node is well connected.
//! - `mailbox` - An authenticated, sequence-numbered, content-addressed store for mailbox messages destined for
//!   offline recipients, with inventory (delta) sync and bounded storage.
//! - `transport` - The connection/transport seam used by the peer exchange service.
//! - `crypto` - The hash/sign/verify seam used by the mailbox store.

#[macro_use]
mod macros;

pub mod config;
pub use config::OverlayConfig;

pub mod crypto;
pub mod mailbox;
pub mod message;
pub mod net_address;
pub mod peer_exchange;
pub mod persistence;
pub mod proto;
pub mod serializers;
pub mod transport;

#[cfg(any(test, feature = "test-mocks"))]
pub mod test_utils;
