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

//! # Peer Exchange
//!
//! Keeps the node connected to enough live peers. The `PeerExchangeStrategy` owns the known peer pools (seed,
//! connected, reported, persisted) and decides which addresses to contact. The `PeerExchangeService` runs the
//! request/response exchange of peer lists against those addresses and repeats the initial exchange with a doubling
//! delay while the node has too few connections or reported peers.

mod backoff;
pub use backoff::{Backoff, DoublingBackoff, RetrySchedule, RetryState};

mod config;
pub use config::PeerExchangeConfig;

mod error;
pub use error::PeerExchangeError;

mod handler;
pub use handler::PeerExchangeHandler;

mod messages;
pub use messages::{PeerExchangeRequest, PeerExchangeResponse};

mod peer;
pub use peer::Peer;

mod peer_group;

mod service;
pub use service::{PeerExchangeEvent, PeerExchangeRoundInfo, PeerExchangeService, RoundKind};

mod strategy;
pub use strategy::PeerExchangeStrategy;
