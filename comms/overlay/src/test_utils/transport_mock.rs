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

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        RwLock,
    },
};

use async_trait::async_trait;
use tokio::{sync::mpsc, task};

use crate::{
    message::OverlayMessage,
    net_address::NetworkAddress,
    peer_exchange::{Peer, PeerExchangeResponse, PeerExchangeService},
    transport::{Connection, ConnectionId, Transport, TransportError},
};

pub type InboundMessages = mpsc::UnboundedReceiver<(OverlayMessage, Connection)>;

/// How a mocked remote peer reacts to a peer exchange request
#[derive(Debug, Clone)]
pub enum MockPeerBehaviour {
    /// Replies with the given peers
    Respond(Vec<Peer>),
    /// Connection attempts fail
    FailToConnect,
    /// Accepts the request but never replies
    NoResponse,
}

pub fn create_transport_mock() -> (MockTransport, InboundMessages) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let transport = MockTransport {
        state: TransportMockState::new(),
        inbound_tx,
    };
    (transport, inbound_rx)
}

#[derive(Debug, Clone)]
pub struct TransportMockState {
    behaviours: Arc<RwLock<HashMap<NetworkAddress, MockPeerBehaviour>>>,
    default_behaviour: Arc<RwLock<MockPeerBehaviour>>,
    connect_calls: Arc<RwLock<Vec<NetworkAddress>>>,
    sent_messages: Arc<RwLock<Vec<(Connection, OverlayMessage)>>>,
    next_connection_id: Arc<AtomicU64>,
}

impl TransportMockState {
    fn new() -> Self {
        Self {
            behaviours: Default::default(),
            default_behaviour: Arc::new(RwLock::new(MockPeerBehaviour::FailToConnect)),
            connect_calls: Default::default(),
            sent_messages: Default::default(),
            next_connection_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn set_behaviour(&self, address: NetworkAddress, behaviour: MockPeerBehaviour) -> &Self {
        self.behaviours.write().unwrap().insert(address, behaviour);
        self
    }

    /// The behaviour of every address without an explicit behaviour. Defaults to `FailToConnect`.
    pub fn set_default_behaviour(&self, behaviour: MockPeerBehaviour) -> &Self {
        *self.default_behaviour.write().unwrap() = behaviour;
        self
    }

    pub fn behaviour(&self, address: &NetworkAddress) -> MockPeerBehaviour {
        self.behaviours
            .read()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_else(|| self.default_behaviour.read().unwrap().clone())
    }

    pub fn connect_calls(&self) -> Vec<NetworkAddress> {
        self.connect_calls.read().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<(Connection, OverlayMessage)> {
        self.sent_messages.read().unwrap().clone()
    }

    pub fn num_sent(&self) -> usize {
        self.sent_messages.read().unwrap().len()
    }
}

#[derive(Debug, Clone)]
pub struct MockTransport {
    state: TransportMockState,
    inbound_tx: mpsc::UnboundedSender<(OverlayMessage, Connection)>,
}

impl MockTransport {
    pub fn get_shared_state(&self) -> TransportMockState {
        self.state.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_or_open_connection(&self, address: &NetworkAddress) -> Result<Connection, TransportError> {
        self.state.connect_calls.write().unwrap().push(address.clone());
        match self.state.behaviour(address) {
            MockPeerBehaviour::FailToConnect => Err(TransportError::ConnectFailed {
                address: address.clone(),
                details: "mock connection failure".to_string(),
            }),
            _ => {
                let id = self.state.next_connection_id.fetch_add(1, Ordering::SeqCst);
                Ok(Connection::new(ConnectionId(id), address.clone()))
            },
        }
    }

    async fn send(&self, message: OverlayMessage, connection: &Connection) -> Result<(), TransportError> {
        self.state
            .sent_messages
            .write()
            .unwrap()
            .push((connection.clone(), message.clone()));
        if let OverlayMessage::PeerExchangeRequest(request) = message {
            if let MockPeerBehaviour::Respond(peers) = self.state.behaviour(connection.peer_address()) {
                let response = PeerExchangeResponse::new(request.nonce, peers);
                let _result = self
                    .inbound_tx
                    .send((OverlayMessage::PeerExchangeResponse(response), connection.clone()));
            }
        }
        Ok(())
    }
}

/// Feeds messages "received" by the mock transport into the service
pub fn spawn_inbound_dispatcher<T: Transport>(service: PeerExchangeService<T>, mut inbound: InboundMessages) {
    task::spawn(async move {
        while let Some((msg, conn)) = inbound.recv().await {
            service.handle_message(msg, &conn);
        }
    });
}
