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

use std::sync::Arc;

use log::*;
use tokio::{
    sync::watch,
    task::{self, JoinHandle},
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{
    result::MailboxStoreResult,
    store::{MailboxSnapshot, MailboxStore},
};
use crate::{crypto::OverlayCrypto, message::OverlayMessage, transport::Connection};

const LOG_TARGET: &str = "comms::overlay::mailbox::service";

/// Routes inbound mailbox messages to the `MailboxStore` and prunes the store periodically until shut down
pub struct MailboxService<C> {
    store: Arc<MailboxStore<C>>,
    shutdown_signal: CancellationToken,
}

impl<C> Clone for MailboxService<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            shutdown_signal: self.shutdown_signal.clone(),
        }
    }
}

impl<C: OverlayCrypto> MailboxService<C> {
    pub fn new(store: Arc<MailboxStore<C>>, shutdown_signal: CancellationToken) -> Self {
        Self {
            store,
            shutdown_signal,
        }
    }

    pub fn store(&self) -> &Arc<MailboxStore<C>> {
        &self.store
    }

    /// Spawns the pruning task. The store is flushed to persistence once the shutdown signal is triggered.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(target: LOG_TARGET, "Mailbox service started");
        task::spawn(self.run())
    }

    async fn run(self) {
        let mut prune_ticker = time::interval(self.store.config().prune_interval);
        prune_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = prune_ticker.tick() => {
                    let num_pruned = self.store.prune();
                    trace!(target: LOG_TARGET, "Prune pass dropped {} entries", num_pruned);
                },

                _ = self.shutdown_signal.cancelled() => {
                    info!(target: LOG_TARGET, "Mailbox service is shutting down because the shutdown signal was triggered");
                    break;
                }
            }
        }
        self.store.shutdown();
    }

    /// Spawns a task that calls `write` with a snapshot of the store whenever `changes` signals a change. Changes made
    /// while a write is in progress result in a single further snapshot. A final snapshot is written once the shutdown
    /// signal is triggered. `changes` is usually the receiver of a `WatchPersistence<()>` passed to the store.
    pub fn spawn_snapshot_writer<F>(&self, mut changes: watch::Receiver<()>, mut write: F) -> JoinHandle<()>
    where F: FnMut(MailboxSnapshot) + Send + 'static {
        let store = self.store.clone();
        let shutdown_signal = self.shutdown_signal.clone();
        task::spawn(async move {
            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            debug!(target: LOG_TARGET, "Mailbox persistence handler dropped. Snapshot writer stopped.");
                            break;
                        }
                        let snapshot = store.snapshot();
                        trace!(target: LOG_TARGET, "Writing mailbox snapshot of {} entries", snapshot.len());
                        write(snapshot);
                    },

                    _ = shutdown_signal.cancelled() => {
                        write(store.snapshot());
                        break;
                    }
                }
            }
        })
    }

    /// Applies an inbound mailbox request. Returns `None` for messages that are not mailbox requests.
    pub fn handle_message(&self, message: OverlayMessage, connection: &Connection) -> Option<MailboxStoreResult> {
        let result = match message {
            OverlayMessage::AddMailboxRequest(request) => self.store.add(request),
            OverlayMessage::RemoveMailboxRequest(request) => self.store.remove(request),
            msg => {
                trace!(
                    target: LOG_TARGET,
                    "Ignoring {} from {}",
                    msg.as_type_str(),
                    connection.peer_address()
                );
                return None;
            },
        };
        debug!(
            target: LOG_TARGET,
            "Mailbox request from {}: {}",
            connection.peer_address(),
            result
        );
        Some(result)
    }
}
