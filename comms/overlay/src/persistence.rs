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

//! Persistence triggers. How and where state is written is left to the implementor; callers only signal and carry on.
//!
//! Small state (e.g. the persisted peers) is handed over as a snapshot. The mailbox store only signals that it has
//! changed (`PersistenceHandler<()>`) and the writer reads a snapshot when it gets round to it, so that a busy store is
//! not copied on every mutation.

use std::sync::Arc;

use tokio::sync::watch;

/// Receives snapshots (or change signals) to persist. Implementations must not block the caller; long-running writes
/// should be handed off to their own task.
pub trait PersistenceHandler<T>: Send + Sync + 'static {
    fn persist(&self, snapshot: T);
}

/// Discards every snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPersistence;

impl<T> PersistenceHandler<T> for NoopPersistence {
    fn persist(&self, _: T) {}
}

/// Keeps only the latest snapshot. A writer that falls behind skips the snapshots that were superseded in the meantime,
/// so memory use does not grow with the write backlog.
#[derive(Debug, Clone)]
pub struct WatchPersistence<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T: Default> WatchPersistence<T> {
    /// Returns the handler and the receiver to drain. The receiver's initial (default) value is marked as seen.
    pub fn new() -> (Self, watch::Receiver<T>) {
        let (sender, receiver) = watch::channel(T::default());
        (
            Self {
                sender: Arc::new(sender),
            },
            receiver,
        )
    }
}

impl<T: Send + Sync + 'static> PersistenceHandler<T> for WatchPersistence<T> {
    fn persist(&self, snapshot: T) {
        // Stored even if the receiver has been dropped
        self.sender.send_replace(snapshot);
    }
}
