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
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use futures::{stream::FuturesUnordered, StreamExt};
use log::*;
use rand::{rngs::OsRng, Rng};
use tokio::{
    sync::{broadcast, oneshot},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;

use super::{
    backoff::{DoublingBackoff, RetrySchedule, RetryState},
    error::PeerExchangeError,
    handler::PeerExchangeHandler,
    messages::{PeerExchangeRequest, PeerExchangeResponse},
    strategy::PeerExchangeStrategy,
};
use crate::{
    message::OverlayMessage,
    net_address::NetworkAddress,
    transport::{Connection, ConnectionEvent, Transport},
};

const LOG_TARGET: &str = "comms::overlay::peer_exchange::service";

const EVENT_CHANNEL_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundKind {
    /// Bootstrap round started by the caller
    Initial,
    /// Bootstrap round started by the retry schedule
    Retry,
    /// Round to grow the peer group after bootstrap. Never retried.
    Further,
}

impl fmt::Display for RoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundKind::Initial => write!(f, "initial"),
            RoundKind::Retry => write!(f, "retry"),
            RoundKind::Further => write!(f, "further"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerExchangeRoundInfo {
    pub kind: RoundKind,
    pub num_requests: usize,
    pub num_succeeded: usize,
    pub num_failed: usize,
}

impl PeerExchangeRoundInfo {
    fn new(kind: RoundKind, num_requests: usize) -> Self {
        Self {
            kind,
            num_requests,
            num_succeeded: 0,
            num_failed: 0,
        }
    }
}

impl fmt::Display for PeerExchangeRoundInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} round: {} request(s), {} succeeded, {} failed",
            self.kind, self.num_requests, self.num_succeeded, self.num_failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerExchangeEvent {
    RoundCompleted(PeerExchangeRoundInfo),
    RetryScheduled(Duration),
}

/// Runs the peer exchange protocol against candidates chosen by the `PeerExchangeStrategy`, repeating the initial
/// exchange with backoff until the node is well connected.
///
/// Inbound messages and connection events must be fed to the service with `handle_message` and
/// `handle_connection_event`.
pub struct PeerExchangeService<T> {
    inner: Arc<ServiceInner<T>>,
}

struct ServiceInner<T> {
    transport: T,
    strategy: Arc<PeerExchangeStrategy>,
    handlers: Mutex<HashMap<NetworkAddress, PeerExchangeHandler>>,
    retry: Mutex<RetrySchedule<DoublingBackoff>>,
    retry_task: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<Arc<PeerExchangeEvent>>,
    shutdown_signal: CancellationToken,
    is_stopped: AtomicBool,
    is_extending: AtomicBool,
}

impl<T> Clone for PeerExchangeService<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> PeerExchangeService<T> {
    /// Creates the service. Cancelling `shutdown_signal` stops all rounds and pending retries, but `shutdown` should be
    /// called to release in-flight handlers.
    pub fn new(transport: T, strategy: Arc<PeerExchangeStrategy>, shutdown_signal: CancellationToken) -> Self {
        let config = strategy.config();
        let backoff = DoublingBackoff::new(config.initial_retry_delay, config.max_retry_delay);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(ServiceInner {
                transport,
                retry: Mutex::new(RetrySchedule::new(backoff)),
                strategy,
                handlers: Mutex::new(HashMap::new()),
                retry_task: Mutex::new(None),
                events,
                shutdown_signal: shutdown_signal.child_token(),
                is_stopped: AtomicBool::new(false),
                is_extending: AtomicBool::new(false),
            }),
        }
    }

    pub fn strategy(&self) -> &Arc<PeerExchangeStrategy> {
        &self.inner.strategy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Arc<PeerExchangeEvent>> {
        self.inner.events.subscribe()
    }

    pub fn retry_state(&self) -> RetryState {
        acquire_lock!(self.inner.retry).state()
    }

    pub fn num_pending_exchanges(&self) -> usize {
        acquire_lock!(self.inner.handlers).len()
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.is_stopped.load(Ordering::SeqCst)
    }

    /// Runs an initial exchange round. Resolves to true as soon as the first exchange succeeds, or to false once every
    /// exchange has failed. The remaining exchanges continue in the background. Once all exchanges have resolved, a
    /// repeat is scheduled if the strategy's redo policy asks for one.
    pub async fn start_initial_peer_exchange(&self) -> bool {
        self.start_round(RoundKind::Initial).await
    }

    /// Runs a round against reported and persisted peers only, to grow the peer group after bootstrap. This round is
    /// never repeated. Resolves to false without contacting anyone while another further round is in progress.
    pub async fn start_further_peer_exchange(&self) -> bool {
        if self.is_stopped() {
            debug!(target: LOG_TARGET, "Service stopped. Not starting further round");
            return false;
        }
        if self
            .inner
            .is_extending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!(target: LOG_TARGET, "A further peer exchange round is already in progress");
            return false;
        }
        self.start_round(RoundKind::Further).await
    }

    pub fn is_extending(&self) -> bool {
        self.inner.is_extending.load(Ordering::SeqCst)
    }

    async fn start_round(&self, kind: RoundKind) -> bool {
        if self.is_stopped() {
            debug!(target: LOG_TARGET, "Service stopped. Not starting {} round", kind);
            return false;
        }
        let candidates = match kind {
            RoundKind::Initial => self.inner.strategy.get_addresses_for_initial_peer_exchange(),
            RoundKind::Retry => self.inner.strategy.get_addresses_for_retry_peer_exchange(),
            RoundKind::Further => self.inner.strategy.get_addresses_for_further_peer_exchange(),
        };
        info!(
            target: LOG_TARGET,
            "Starting {} peer exchange round with {} candidate(s)",
            kind,
            candidates.len()
        );

        let (first_success_tx, first_success_rx) = oneshot::channel();
        let service = self.clone();
        tokio::spawn(service.run_round(kind, candidates, first_success_tx));
        first_success_rx.await.unwrap_or(false)
    }

    async fn run_round(self, kind: RoundKind, candidates: Vec<NetworkAddress>, first_success_tx: oneshot::Sender<bool>) {
        let mut info = PeerExchangeRoundInfo::new(kind, candidates.len());
        let mut first_success_tx = Some(first_success_tx);
        // A small first round means only seeds were known. Reported peers from the first response seed a further round.
        let mut should_extend =
            kind == RoundKind::Initial && candidates.len() < self.inner.strategy.config().extend_peer_group_threshold;
        let mut exchanges = candidates
            .into_iter()
            .map(|address| {
                let service = self.clone();
                async move {
                    let result = service.exchange_with(&address).await;
                    (address, result)
                }
            })
            .collect::<FuturesUnordered<_>>();

        loop {
            tokio::select! {
                _ = self.inner.shutdown_signal.cancelled() => {
                    debug!(target: LOG_TARGET, "{} round cancelled by shutdown", kind);
                    return;
                },
                next = exchanges.next() => match next {
                    Some((address, Ok(()))) => {
                        info.num_succeeded += 1;
                        debug!(target: LOG_TARGET, "Peer exchange with {} succeeded", address);
                        if let Some(tx) = first_success_tx.take() {
                            let _result = tx.send(true);
                        }
                        if should_extend {
                            should_extend = false;
                            self.extend_peer_group();
                        }
                    },
                    Some((address, Err(err))) => {
                        info.num_failed += 1;
                        debug!(target: LOG_TARGET, "Peer exchange with {} failed: {}", address, err);
                    },
                    None => break,
                },
            }
        }

        if let Some(tx) = first_success_tx.take() {
            let _result = tx.send(false);
        }
        self.on_round_complete(info);
    }

    fn on_round_complete(&self, info: PeerExchangeRoundInfo) {
        info!(target: LOG_TARGET, "Peer exchange {}", info);
        let kind = info.kind;
        let num_succeeded = info.num_succeeded;
        let num_failed = info.num_failed;
        if kind == RoundKind::Further {
            self.inner.is_extending.store(false, Ordering::SeqCst);
        }
        self.publish_event(PeerExchangeEvent::RoundCompleted(info));

        if self.is_stopped() || kind == RoundKind::Further {
            return;
        }
        if self
            .inner
            .strategy
            .should_redo_initial_peer_exchange(num_succeeded, num_failed)
        {
            self.schedule_retry();
        } else {
            self.cancel_retry();
        }
    }

    fn extend_peer_group(&self) {
        info!(target: LOG_TARGET, "First exchange succeeded. Starting a further round to extend the peer group");
        let service = self.clone();
        tokio::spawn(async move {
            service.start_further_peer_exchange().await;
        });
    }

    fn schedule_retry(&self) {
        let delay = match acquire_lock!(self.inner.retry).schedule() {
            Some(delay) => delay,
            None => {
                debug!(target: LOG_TARGET, "A repeat of the initial peer exchange is already scheduled");
                return;
            },
        };
        info!(
            target: LOG_TARGET,
            "Repeating initial peer exchange in {:.2?}", delay
        );
        self.publish_event(PeerExchangeEvent::RetryScheduled(delay));

        let service = self.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = service.inner.shutdown_signal.cancelled() => return,
                _ = time::sleep(delay) => {},
            }
            let should_run = acquire_lock!(service.inner.retry).fire();
            if !should_run {
                debug!(target: LOG_TARGET, "Repeat of the initial peer exchange was cancelled");
                return;
            }
            service.start_round(RoundKind::Retry).await;
        });
        *acquire_lock!(self.inner.retry_task) = Some(task);
    }

    fn cancel_retry(&self) {
        acquire_lock!(self.inner.retry).cancel();
        if let Some(task) = acquire_lock!(self.inner.retry_task).take() {
            task.abort();
        }
    }

    async fn exchange_with(&self, address: &NetworkAddress) -> Result<(), PeerExchangeError> {
        if self.is_stopped() {
            return Err(PeerExchangeError::Shutdown);
        }
        let connection = match self.inner.transport.get_or_open_connection(address).await {
            Ok(conn) => conn,
            Err(err) => {
                self.remove_handler(address, None);
                return Err(err.into());
            },
        };

        let nonce = OsRng.gen::<i32>();
        let reply_rx = self.register_handler(address, nonce)?;
        let result = self.request_peers(&connection, nonce, reply_rx).await;
        self.remove_handler(address, Some(nonce));
        result
    }

    async fn request_peers(
        &self,
        connection: &Connection,
        nonce: i32,
        reply_rx: oneshot::Receiver<PeerExchangeResponse>,
    ) -> Result<(), PeerExchangeError> {
        let address = connection.peer_address();
        let peers = self.inner.strategy.get_peers_for_reporting(address);
        debug!(
            target: LOG_TARGET,
            "Sending PeerExchangeRequest (nonce = {}) with {} peer(s) to {}",
            nonce,
            peers.len(),
            address
        );
        let request = OverlayMessage::PeerExchangeRequest(PeerExchangeRequest::new(nonce, peers));
        self.inner.transport.send(request, connection).await?;

        let timeout = self.inner.strategy.config().request_timeout;
        let response = time::timeout(timeout, reply_rx)
            .await
            .map_err(|_| PeerExchangeError::Timeout)?
            .map_err(|_| PeerExchangeError::Cancelled)?;
        debug!(
            target: LOG_TARGET,
            "Received {} peer(s) from {}",
            response.peers.len(),
            address
        );
        self.inner.strategy.add_reported_peers(response.peers, address);
        Ok(())
    }

    fn register_handler(
        &self,
        address: &NetworkAddress,
        nonce: i32,
    ) -> Result<oneshot::Receiver<PeerExchangeResponse>, PeerExchangeError> {
        let mut handlers = acquire_lock!(self.inner.handlers);
        // Checked under the handlers lock so that no handler is registered after shutdown has cleared them
        if self.is_stopped() {
            return Err(PeerExchangeError::Shutdown);
        }
        let (handler, reply_rx) = PeerExchangeHandler::new(nonce);
        if let Some(mut stale) = handlers.insert(address.clone(), handler) {
            debug!(
                target: LOG_TARGET,
                "Replacing in-flight peer exchange with {} (nonce = {})",
                address,
                stale.nonce()
            );
            stale.dispose();
        }
        Ok(reply_rx)
    }

    /// Disposes and removes the handler for `address`. If a nonce is given, the handler is only removed if it belongs
    /// to that exchange.
    fn remove_handler(&self, address: &NetworkAddress, nonce: Option<i32>) {
        let mut handlers = acquire_lock!(self.inner.handlers);
        let is_match = handlers
            .get(address)
            .map(|handler| nonce.map(|n| handler.nonce() == n).unwrap_or(true))
            .unwrap_or(false);
        if is_match {
            if let Some(mut handler) = handlers.remove(address) {
                handler.dispose();
            }
        }
    }

    //---------------------------------- Inbound --------------------------------------------//

    /// Handles a message received on `connection`. Messages other than peer exchange messages are ignored.
    pub fn handle_message(&self, message: OverlayMessage, connection: &Connection) {
        match message {
            OverlayMessage::PeerExchangeRequest(request) => self.handle_request(request, connection),
            OverlayMessage::PeerExchangeResponse(response) => self.handle_response(response, connection),
            msg => trace!(
                target: LOG_TARGET,
                "Ignoring {} from {}",
                msg.as_type_str(),
                connection.peer_address()
            ),
        }
    }

    fn handle_request(&self, request: PeerExchangeRequest, connection: &Connection) {
        if self.is_stopped() {
            debug!(target: LOG_TARGET, "Service stopped. Ignoring PeerExchangeRequest");
            return;
        }
        let requester = connection.peer_address();
        let peers = self.inner.strategy.get_peers_for_reporting(requester);
        self.inner.strategy.add_reported_peers(request.peers, requester);
        let response = PeerExchangeResponse::new(request.nonce, peers);
        debug!(
            target: LOG_TARGET,
            "Responding to PeerExchangeRequest from {} with {} peer(s)",
            requester,
            response.peers.len()
        );

        let inner = self.inner.clone();
        let connection = connection.clone();
        tokio::spawn(async move {
            let msg = OverlayMessage::PeerExchangeResponse(response);
            log_if_error!(
                target: LOG_TARGET,
                inner.transport.send(msg, &connection).await,
                "Failed to send PeerExchangeResponse to {}",
                connection.peer_address()
            );
        });
    }

    fn handle_response(&self, response: PeerExchangeResponse, connection: &Connection) {
        let address = connection.peer_address();
        let mut handlers = acquire_lock!(self.inner.handlers);
        let handler = match handlers.get_mut(address) {
            Some(handler) => handler,
            None => {
                warn!(
                    target: LOG_TARGET,
                    "Received unsolicited PeerExchangeResponse from {}", address
                );
                return;
            },
        };
        match handler.complete(response) {
            Ok(()) => {},
            Err(err @ PeerExchangeError::HandlerDisposed) => {
                error!(target: LOG_TARGET, "PeerExchangeResponse from {}: {}", address, err);
            },
            Err(err) => {
                warn!(target: LOG_TARGET, "Invalid PeerExchangeResponse from {}: {}", address, err);
            },
        }
    }

    pub fn handle_connection_event(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::PeerConnected(address) => self.inner.strategy.on_peer_connected(address),
            ConnectionEvent::PeerDisconnected(address) => {
                self.inner.strategy.on_peer_disconnected(&address);
                self.remove_handler(&address, None);
            },
        }
    }

    //---------------------------------- Shutdown --------------------------------------------//

    /// Stops the service: no further rounds are started, a pending retry is cancelled and every in-flight exchange is
    /// disposed.
    pub fn shutdown(&self) {
        if self.inner.is_stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(target: LOG_TARGET, "Peer exchange service shutting down");
        self.inner.shutdown_signal.cancel();
        self.cancel_retry();
        let mut handlers = acquire_lock!(self.inner.handlers);
        for (_, mut handler) in handlers.drain() {
            handler.dispose();
        }
        drop(handlers);
        self.inner.is_extending.store(false, Ordering::SeqCst);
        self.inner.strategy.shutdown();
    }

    fn publish_event(&self, event: PeerExchangeEvent) {
        // No subscribers is not an error
        let _result = self.inner.events.send(Arc::new(event));
    }
}
