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

//! The connection seam consumed by the peer exchange service. Connection establishment (typically over Tor) and framing
//! are the responsibility of the implementor. Inbound messages are delivered to the services by the implementor, along
//! with the `Connection` they arrived on.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::{message::OverlayMessage, net_address::NetworkAddress};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to connect to `{address}`: {details}")]
    ConnectFailed { address: NetworkAddress, details: String },
    #[error("Connection {0} is closed")]
    ConnectionClosed(ConnectionId),
    #[error("Failed to send message: {0}")]
    SendFailed(String),
    #[error("Transport has shut down")]
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A handle to an established connection with a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    id: ConnectionId,
    peer_address: NetworkAddress,
}

impl Connection {
    pub fn new(id: ConnectionId, peer_address: NetworkAddress) -> Self {
        Self { id, peer_address }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The address of the remote peer
    pub fn peer_address(&self) -> &NetworkAddress {
        &self.peer_address
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection {} to {}", self.id, self.peer_address)
    }
}

/// Connection lifecycle notifications fed to the peer exchange service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    PeerConnected(NetworkAddress),
    PeerDisconnected(NetworkAddress),
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Returns an existing connection to `address`, or opens a new one
    async fn get_or_open_connection(&self, address: &NetworkAddress) -> Result<Connection, TransportError>;

    /// Sends a message on the given connection. Returns once the message has been handed to the connection, not once
    /// it is received.
    async fn send(&self, message: OverlayMessage, connection: &Connection) -> Result<(), TransportError>;
}
