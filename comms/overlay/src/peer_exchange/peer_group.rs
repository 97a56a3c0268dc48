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

use std::collections::{HashMap, HashSet};

use super::peer::Peer;
use crate::net_address::NetworkAddress;

/// The overlapping peer pools known to this node. Only the strategy holds a `PeerGroup`, so every mutation goes through
/// it.
#[derive(Debug, Default)]
pub(super) struct PeerGroup {
    seeds: Vec<NetworkAddress>,
    banned: HashSet<NetworkAddress>,
    connected: HashMap<NetworkAddress, Peer>,
    reported: HashMap<NetworkAddress, Peer>,
    persisted: HashMap<NetworkAddress, Peer>,
}

impl PeerGroup {
    pub fn new(seeds: Vec<NetworkAddress>) -> Self {
        Self {
            seeds,
            ..Default::default()
        }
    }

    pub fn seeds(&self) -> &[NetworkAddress] {
        &self.seeds
    }

    pub fn is_seed(&self, address: &NetworkAddress) -> bool {
        self.seeds.contains(address)
    }

    pub fn is_banned(&self, address: &NetworkAddress) -> bool {
        self.banned.contains(address)
    }

    /// Bans the address and forgets it as a reported or persisted peer. Returns true if the persisted set changed.
    pub fn ban(&mut self, address: NetworkAddress) -> bool {
        self.reported.remove(&address);
        let persisted_changed = self.persisted.remove(&address).is_some();
        self.banned.insert(address);
        persisted_changed
    }

    pub fn num_connected(&self) -> usize {
        self.connected.len()
    }

    pub fn num_reported(&self) -> usize {
        self.reported.len()
    }

    pub fn connected(&self) -> impl Iterator<Item = &Peer> {
        self.connected.values()
    }

    pub fn reported(&self) -> impl Iterator<Item = &Peer> {
        self.reported.values()
    }

    pub fn persisted(&self) -> impl Iterator<Item = &Peer> {
        self.persisted.values()
    }

    pub fn add_connected(&mut self, peer: Peer) {
        self.connected.insert(peer.address().clone(), peer);
    }

    pub fn remove_connected(&mut self, address: &NetworkAddress) -> Option<Peer> {
        self.connected.remove(address)
    }

    /// Merges `peers` into the reported set, keeping the newest `capacity` peers
    pub fn add_reported<'a, I: IntoIterator<Item = &'a Peer>>(&mut self, peers: I, capacity: usize) -> bool {
        merge_bounded(&mut self.reported, peers, capacity)
    }

    /// Merges `peers` into the persisted set, keeping the newest `capacity` peers. Returns true if the set changed.
    pub fn add_persisted<'a, I: IntoIterator<Item = &'a Peer>>(&mut self, peers: I, capacity: usize) -> bool {
        merge_bounded(&mut self.persisted, peers, capacity)
    }

    pub fn clear_reported(&mut self) {
        self.reported.clear();
    }

    pub fn clear_persisted(&mut self) {
        self.persisted.clear();
    }
}

/// Inserts each peer, replacing an existing entry only with a more recently seen one, then evicts the oldest peers
/// until at most `capacity` remain. Returns true if the set changed.
fn merge_bounded<'a, I: IntoIterator<Item = &'a Peer>>(
    set: &mut HashMap<NetworkAddress, Peer>,
    peers: I,
    capacity: usize,
) -> bool {
    let mut changed = false;
    for peer in peers {
        match set.get(peer.address()) {
            Some(existing) if !peer.is_newer_than(existing) => {},
            _ => {
                set.insert(peer.address().clone(), peer.clone());
                changed = true;
            },
        }
    }

    if set.len() > capacity {
        let mut newest_first = set.values().cloned().collect::<Vec<_>>();
        sort_newest_first(&mut newest_first);
        for evicted in newest_first.drain(capacity..) {
            set.remove(evicted.address());
        }
        changed = true;
    }

    changed
}

/// Sorts by `last_seen` descending, with the address as tie breaker so that the order is stable across calls
pub(super) fn sort_newest_first(peers: &mut [Peer]) {
    peers.sort_by(|a, b| {
        b.last_seen()
            .cmp(&a.last_seen())
            .then_with(|| a.address().cmp(b.address()))
    });
}

pub(super) fn sort_oldest_first(peers: &mut [Peer]) {
    peers.sort_by(|a, b| {
        a.last_seen()
            .cmp(&b.last_seen())
            .then_with(|| a.address().cmp(b.address()))
    });
}
