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

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        RwLock,
    },
    time::Duration,
};

use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use tari_comms_overlay::{
    crypto::DefaultCrypto,
    mailbox::{MailboxConfig, MailboxService, MailboxStore},
    message::OverlayMessage,
    net_address::NetworkAddress,
    peer_exchange::{Peer, PeerExchangeConfig, PeerExchangeService, PeerExchangeStrategy},
    persistence::{NoopPersistence, PersistenceHandler},
    transport::{Connection, ConnectionEvent, ConnectionId, Transport, TransportError},
    OverlayConfig,
};
use tokio::{sync::mpsc, task};
use tokio_util::sync::CancellationToken;

enum NodeInput {
    Message(Vec<u8>, Connection),
    Event(ConnectionEvent),
}

/// Routes encoded messages between in-process nodes
#[derive(Clone, Default)]
pub struct InMemoryNetwork {
    nodes: Arc<RwLock<HashMap<NetworkAddress, mpsc::UnboundedSender<NodeInput>>>>,
    next_connection_id: Arc<AtomicU64>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Default::default()
    }

    fn register(&self, address: NetworkAddress, inbound: mpsc::UnboundedSender<NodeInput>) {
        self.nodes.write().unwrap().insert(address, inbound);
    }

    fn get(&self, address: &NetworkAddress) -> Option<mpsc::UnboundedSender<NodeInput>> {
        self.nodes.read().unwrap().get(address).cloned()
    }

    fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_connection_id.fetch_add(1, Ordering::SeqCst))
    }
}

pub struct InMemoryTransport {
    local_address: NetworkAddress,
    network: InMemoryNetwork,
    self_inbound: mpsc::UnboundedSender<NodeInput>,
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn get_or_open_connection(&self, address: &NetworkAddress) -> Result<Connection, TransportError> {
        let remote = self.network.get(address).ok_or_else(|| TransportError::ConnectFailed {
            address: address.clone(),
            details: "no such node".to_string(),
        })?;
        let _ = remote.send(NodeInput::Event(ConnectionEvent::PeerConnected(self.local_address.clone())));
        let _ = self
            .self_inbound
            .send(NodeInput::Event(ConnectionEvent::PeerConnected(address.clone())));
        Ok(Connection::new(self.network.next_connection_id(), address.clone()))
    }

    async fn send(&self, message: OverlayMessage, connection: &Connection) -> Result<(), TransportError> {
        let remote = self
            .network
            .get(connection.peer_address())
            .ok_or(TransportError::ConnectionClosed(connection.id()))?;
        // The receiving side sees a connection to us
        let remote_conn = Connection::new(connection.id(), self.local_address.clone());
        remote
            .send(NodeInput::Message(message.to_encoded_bytes(), remote_conn))
            .map_err(|_| TransportError::ConnectionClosed(connection.id()))
    }
}

pub struct TestNode {
    pub address: NetworkAddress,
    pub peer_exchange: PeerExchangeService<SharedTransport>,
    pub mailbox: MailboxService<DefaultCrypto>,
    pub shutdown: CancellationToken,
    transport: Arc<InMemoryTransport>,
}

impl TestNode {
    pub fn strategy(&self) -> &Arc<PeerExchangeStrategy> {
        self.peer_exchange.strategy()
    }

    pub fn mailbox_store(&self) -> &Arc<MailboxStore<DefaultCrypto>> {
        self.mailbox.store()
    }

    /// Sends a message from this node to `address`
    pub async fn send_to(&self, address: &NetworkAddress, message: OverlayMessage) -> Result<(), TransportError> {
        let conn = self.transport.get_or_open_connection(address).await?;
        self.transport.send(message, &conn).await
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.peer_exchange.shutdown();
        self.shutdown.cancel();
    }
}

pub fn make_address(name: &str) -> NetworkAddress {
    NetworkAddress::new(format!("{}.onion", name), 18141)
}

pub fn peer_exchange_config(seed_nodes: Vec<NetworkAddress>) -> PeerExchangeConfig {
    PeerExchangeConfig {
        seed_nodes,
        ..OverlayConfig::default_local_test().peer_exchange
    }
}

pub fn mailbox_config() -> MailboxConfig {
    OverlayConfig::default_local_test().mailbox
}

pub fn make_node(
    network: &InMemoryNetwork,
    name: &str,
    peer_exchange_config: PeerExchangeConfig,
    mailbox_config: MailboxConfig,
) -> TestNode {
    make_node_with_persistence(network, name, peer_exchange_config, mailbox_config, Arc::new(NoopPersistence))
}

pub fn make_node_with_persistence(
    network: &InMemoryNetwork,
    name: &str,
    peer_exchange_config: PeerExchangeConfig,
    mailbox_config: MailboxConfig,
    mailbox_persistence: Arc<dyn PersistenceHandler<()>>,
) -> TestNode {
    let address = make_address(name);
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    network.register(address.clone(), inbound_tx.clone());
    let transport = Arc::new(InMemoryTransport {
        local_address: address.clone(),
        network: network.clone(),
        self_inbound: inbound_tx,
    });

    let shutdown = CancellationToken::new();
    let strategy = Arc::new(PeerExchangeStrategy::new(
        peer_exchange_config,
        address.clone(),
        Arc::new(NoopPersistence),
    ));
    let peer_exchange = PeerExchangeService::new(SharedTransport(transport.clone()), strategy, shutdown.clone());
    let store = Arc::new(MailboxStore::new(mailbox_config, DefaultCrypto, mailbox_persistence));
    let mailbox = MailboxService::new(store, shutdown.clone());

    let px = peer_exchange.clone();
    let mb = mailbox.clone();
    task::spawn(async move {
        while let Some(input) = inbound_rx.recv().await {
            match input {
                NodeInput::Message(bytes, conn) => match OverlayMessage::decode_envelope(&bytes) {
                    Ok(msg @ OverlayMessage::PeerExchangeRequest(_)) |
                    Ok(msg @ OverlayMessage::PeerExchangeResponse(_)) => px.handle_message(msg, &conn),
                    Ok(msg) => {
                        mb.handle_message(msg, &conn);
                    },
                    Err(err) => panic!("Received undecodable message: {}", err),
                },
                NodeInput::Event(event) => px.handle_connection_event(event),
            }
        }
    });

    TestNode {
        address,
        peer_exchange,
        mailbox,
        shutdown,
        transport,
    }
}

/// Lets the peer exchange service and the test share one transport
pub struct SharedTransport(Arc<InMemoryTransport>);

#[async_trait]
impl Transport for SharedTransport {
    async fn get_or_open_connection(&self, address: &NetworkAddress) -> Result<Connection, TransportError> {
        self.0.get_or_open_connection(address).await
    }

    async fn send(&self, message: OverlayMessage, connection: &Connection) -> Result<(), TransportError> {
        self.0.send(message, connection).await
    }
}

pub fn recent_peers(names: &[&str]) -> Vec<Peer> {
    names.iter().map(|name| Peer::seen_now(make_address(name))).collect()
}

/// Returns a random (secret, public) key pair
pub fn make_keypair() -> (Vec<u8>, Vec<u8>) {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    let public = DefaultCrypto.public_key_from_secret(&secret).unwrap();
    (secret.to_vec(), public)
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Polls `check` until it returns true or the timeout elapses
pub async fn wait_until<F: Fn() -> bool>(check: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
