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
    collections::HashSet,
    fmt,
    sync::{Arc, RwLock},
};

use chrono::Utc;
use log::*;
use rand::{rngs::OsRng, seq::SliceRandom};

use super::{
    config::PeerExchangeConfig,
    peer::Peer,
    peer_group::{sort_newest_first, sort_oldest_first, PeerGroup},
};
use crate::{net_address::NetworkAddress, persistence::PersistenceHandler};

const LOG_TARGET: &str = "comms::overlay::peer_exchange::strategy";

/// Decides which addresses to contact next and which gossiped peers to keep. This is purely a selection algorithm and
/// performs no I/O apart from handing snapshots of the persisted peers to the persistence handler.
///
/// Malformed, stale or otherwise unwanted peers received from other nodes are silently filtered out.
pub struct PeerExchangeStrategy {
    config: PeerExchangeConfig,
    my_address: NetworkAddress,
    peer_group: RwLock<PeerGroup>,
    used_addresses: RwLock<HashSet<NetworkAddress>>,
    persistence: Arc<dyn PersistenceHandler<Vec<Peer>>>,
}

impl PeerExchangeStrategy {
    pub fn new(
        config: PeerExchangeConfig,
        my_address: NetworkAddress,
        persistence: Arc<dyn PersistenceHandler<Vec<Peer>>>,
    ) -> Self {
        Self {
            peer_group: RwLock::new(PeerGroup::new(config.seed_nodes.clone())),
            config,
            my_address,
            used_addresses: RwLock::new(HashSet::new()),
            persistence,
        }
    }

    pub fn config(&self) -> &PeerExchangeConfig {
        &self.config
    }

    pub fn my_address(&self) -> &NetworkAddress {
        &self.my_address
    }

    /// Restores peers persisted in a previous run. Invalid and outdated peers are dropped.
    pub fn load_persisted_peers(&self, peers: Vec<Peer>) {
        let now = Utc::now();
        let mut group = acquire_write_lock!(self.peer_group);
        let valid = peers
            .into_iter()
            .filter(|peer| self.is_valid_non_seed(&group, peer.address()) && self.is_not_outdated(peer, now))
            .collect::<Vec<_>>();
        debug!(target: LOG_TARGET, "Loaded {} persisted peer(s)", valid.len());
        group.add_persisted(&valid, self.config.max_persisted_peers);
    }

    //---------------------------------- Candidate selection --------------------------------------------//

    /// Returns the addresses to contact in an initial (bootstrap) exchange round: shuffled seeds, then reported peers
    /// (newest first), then persisted peers (oldest first), then all connected peers. Addresses already used in this
    /// bootstrap episode are skipped. If that leaves nothing, the used addresses are forgotten and selection is
    /// attempted once more.
    pub fn get_addresses_for_initial_peer_exchange(&self) -> Vec<NetworkAddress> {
        self.select_candidates(Self::priority_list_for_initial_peer_exchange, false)
    }

    /// Returns the addresses to contact when the initial exchange is repeated: shuffled seeds, then reported peers,
    /// then all connected peers. Persisted peers are skipped since the previous rounds already tried them.
    pub fn get_addresses_for_retry_peer_exchange(&self) -> Vec<NetworkAddress> {
        self.select_candidates(Self::priority_list_for_retry_peer_exchange, false)
    }

    /// Returns the addresses to contact to grow the peer group after bootstrap. Only reported and persisted peers are
    /// considered, so that seeds and existing connections are left alone. Seeds are added only if no other candidate
    /// remains after resetting the used addresses.
    pub fn get_addresses_for_further_peer_exchange(&self) -> Vec<NetworkAddress> {
        self.select_candidates(Self::priority_list_for_further_peer_exchange, true)
    }

    fn select_candidates<F>(&self, priority_list: F, fall_back_to_seeds: bool) -> Vec<NetworkAddress>
    where F: Fn(&Self) -> Vec<NetworkAddress> {
        let mut candidates = self.get_candidates(priority_list(self));
        if candidates.is_empty() {
            info!(
                target: LOG_TARGET,
                "No unused exchange candidates. Resetting used addresses and trying previously used peers again."
            );
            acquire_write_lock!(self.used_addresses).clear();
            candidates = self.get_candidates(priority_list(self));
            if fall_back_to_seeds {
                let group = acquire_read_lock!(self.peer_group);
                for seed in self.seed_addresses(&group) {
                    if !candidates.contains(&seed) {
                        candidates.push(seed);
                    }
                }
            }
        }
        acquire_write_lock!(self.used_addresses).extend(candidates.iter().cloned());
        candidates
    }

    fn get_candidates(&self, priority_list: Vec<NetworkAddress>) -> Vec<NetworkAddress> {
        let limit = self.peer_exchange_limit();
        let used = acquire_read_lock!(self.used_addresses);
        let mut seen = HashSet::new();
        priority_list
            .into_iter()
            .filter(|address| !used.contains(address))
            .filter(|address| seen.insert(address.clone()))
            .take(limit)
            .collect()
    }

    /// The number of candidates to contact in one round. At least a quarter of `min_num_connected_peers`, more if
    /// connections are missing, and half of `min_num_connected_peers` if few reported peers are known.
    fn peer_exchange_limit(&self) -> usize {
        let group = acquire_read_lock!(self.peer_group);
        let min_value = self.config.min_candidates();
        let missing = self
            .config
            .target_num_connected_peers
            .saturating_sub(group.num_connected());
        let limit = min_value.max(missing);
        if limit == min_value && group.num_reported() < self.config.num_reported_peers_at_bootstrap / 4 {
            return self.config.min_num_connected_peers / 2;
        }
        limit
    }

    fn priority_list_for_initial_peer_exchange(&self) -> Vec<NetworkAddress> {
        let group = acquire_read_lock!(self.peer_group);
        let mut list = self.seed_addresses(&group);
        list.extend(self.reported_addresses(&group));
        list.extend(self.persisted_addresses(&group));
        list.extend(self.connected_addresses(&group));
        list
    }

    fn priority_list_for_retry_peer_exchange(&self) -> Vec<NetworkAddress> {
        let group = acquire_read_lock!(self.peer_group);
        let mut list = self.seed_addresses(&group);
        list.extend(self.reported_addresses(&group));
        list.extend(self.connected_addresses(&group));
        list
    }

    fn priority_list_for_further_peer_exchange(&self) -> Vec<NetworkAddress> {
        let group = acquire_read_lock!(self.peer_group);
        let mut list = self.reported_addresses(&group);
        list.extend(self.persisted_addresses(&group));
        list
    }

    fn seed_addresses(&self, group: &PeerGroup) -> Vec<NetworkAddress> {
        let mut seeds = group.seeds().to_vec();
        seeds.shuffle(&mut OsRng);
        seeds
            .into_iter()
            .filter(|address| *address != self.my_address && !group.is_banned(address))
            .take(self.config.num_seed_nodes_at_bootstrap)
            .collect()
    }

    fn reported_addresses(&self, group: &PeerGroup) -> Vec<NetworkAddress> {
        self.sorted_reported_peers(group)
            .into_iter()
            .take(self.config.num_reported_peers_at_bootstrap)
            .map(|peer| peer.address().clone())
            .collect()
    }

    fn persisted_addresses(&self, group: &PeerGroup) -> Vec<NetworkAddress> {
        let now = Utc::now();
        let mut peers = group
            .persisted()
            .filter(|peer| self.is_valid_non_seed(group, peer.address()) && self.is_not_outdated(peer, now))
            .cloned()
            .collect::<Vec<_>>();
        sort_oldest_first(&mut peers);
        peers
            .into_iter()
            .take(self.config.num_persisted_peers_at_bootstrap)
            .map(|peer| peer.address().clone())
            .collect()
    }

    fn connected_addresses(&self, group: &PeerGroup) -> Vec<NetworkAddress> {
        self.sorted_connected_peers(group)
            .into_iter()
            .map(|peer| peer.address().clone())
            .collect()
    }

    //---------------------------------- Redo policy --------------------------------------------//

    /// True if the initial exchange should be repeated: more than half of the round's exchanges failed, there are
    /// fewer connections than `target_num_connected_peers` or fewer reported peers than `min_num_reported_peers`.
    pub fn should_redo_initial_peer_exchange(&self, num_success: usize, num_failures: usize) -> bool {
        let too_many_failures = num_failures > (num_success + num_failures) / 2;
        let group = acquire_read_lock!(self.peer_group);
        let needs_more_connections = group.num_connected() < self.config.target_num_connected_peers;
        let needs_more_reported_peers = group.num_reported() < self.config.min_num_reported_peers;
        debug!(
            target: LOG_TARGET,
            "Redo check: too_many_failures={}, connected={}/{}, reported={}/{}",
            too_many_failures,
            group.num_connected(),
            self.config.target_num_connected_peers,
            group.num_reported(),
            self.config.min_num_reported_peers
        );
        too_many_failures || needs_more_connections || needs_more_reported_peers
    }

    //---------------------------------- Reporting --------------------------------------------//

    /// Returns the peers to send to `requester`: up to three quarters of `max_reported_peers` from the connected
    /// peers, filled up with reported peers. The requester is never reported back to itself. Nothing is reported if
    /// `support_peer_reporting` is disabled.
    pub fn get_peers_for_reporting(&self, requester: &NetworkAddress) -> Vec<Peer> {
        if !self.config.support_peer_reporting {
            return Vec::new();
        }
        let group = acquire_read_lock!(self.peer_group);
        let mut peers = self
            .sorted_connected_peers(&group)
            .into_iter()
            .filter(|peer| peer.address() != requester)
            .take(self.config.max_connected_peers_for_reporting())
            .collect::<Vec<_>>();
        let mut included = peers.iter().map(|peer| peer.address().clone()).collect::<HashSet<_>>();
        let remaining = self.config.max_reported_peers.saturating_sub(peers.len());
        let reported = self
            .sorted_reported_peers(&group)
            .into_iter()
            .filter(|peer| peer.address() != requester && included.insert(peer.address().clone()))
            .take(remaining)
            .collect::<Vec<_>>();
        peers.extend(reported);
        peers
    }

    /// Accepts peers reported by `reporter`. The reporter itself, seeds, banned peers, this node and outdated peers are
    /// dropped. At most `max_reported_peers` of the newest remaining peers are merged into the reported and persisted
    /// sets.
    pub fn add_reported_peers(&self, peers: Vec<Peer>, reporter: &NetworkAddress) {
        let now = Utc::now();
        let num_received = peers.len();
        let (persisted_changed, snapshot) = {
            let mut group = acquire_write_lock!(self.peer_group);
            let mut accepted = peers
                .into_iter()
                .filter(|peer| peer.address() != reporter)
                .filter(|peer| self.is_valid_non_seed(&group, peer.address()))
                .filter(|peer| self.is_not_outdated(peer, now))
                .collect::<Vec<_>>();
            sort_newest_first(&mut accepted);
            accepted.truncate(self.config.max_reported_peers);
            debug!(
                target: LOG_TARGET,
                "Accepted {} of {} peer(s) reported by {}",
                accepted.len(),
                num_received,
                reporter
            );
            group.add_reported(&accepted, self.config.max_reported_peers);
            let changed = group.add_persisted(&accepted, self.config.max_persisted_peers);
            (changed, group.persisted().cloned().collect::<Vec<_>>())
        };
        if persisted_changed {
            self.persistence.persist(snapshot);
        }
    }

    //---------------------------------- Peer group mutators --------------------------------------------//

    pub fn on_peer_connected(&self, address: NetworkAddress) {
        trace!(target: LOG_TARGET, "Peer connected: {}", address);
        acquire_write_lock!(self.peer_group).add_connected(Peer::seen_now(address));
    }

    pub fn on_peer_disconnected(&self, address: &NetworkAddress) {
        trace!(target: LOG_TARGET, "Peer disconnected: {}", address);
        acquire_write_lock!(self.peer_group).remove_connected(address);
    }

    /// Bans an address. A banned address is never selected, reported or accepted.
    pub fn ban(&self, address: NetworkAddress) {
        info!(target: LOG_TARGET, "Banning peer {}", address);
        let snapshot = {
            let mut group = acquire_write_lock!(self.peer_group);
            group
                .ban(address)
                .then(|| group.persisted().cloned().collect::<Vec<_>>())
        };
        if let Some(snapshot) = snapshot {
            self.persistence.persist(snapshot);
        }
    }

    pub fn clear_reported_peers(&self) {
        acquire_write_lock!(self.peer_group).clear_reported();
    }

    pub fn clear_persisted_peers(&self) {
        acquire_write_lock!(self.peer_group).clear_persisted();
        self.persistence.persist(Vec::new());
    }

    /// Forgets the addresses used in the current bootstrap episode
    pub fn shutdown(&self) {
        acquire_write_lock!(self.used_addresses).clear();
    }

    //---------------------------------- Accessors --------------------------------------------//

    pub fn num_connected_peers(&self) -> usize {
        acquire_read_lock!(self.peer_group).num_connected()
    }

    pub fn num_reported_peers(&self) -> usize {
        acquire_read_lock!(self.peer_group).num_reported()
    }

    /// Reported peers, newest first
    pub fn reported_peers(&self) -> Vec<Peer> {
        let mut peers = acquire_read_lock!(self.peer_group).reported().cloned().collect::<Vec<_>>();
        sort_newest_first(&mut peers);
        peers
    }

    /// Persisted peers, newest first
    pub fn persisted_peers(&self) -> Vec<Peer> {
        let mut peers = acquire_read_lock!(self.peer_group).persisted().cloned().collect::<Vec<_>>();
        sort_newest_first(&mut peers);
        peers
    }

    pub fn connected_peers(&self) -> Vec<Peer> {
        let group = acquire_read_lock!(self.peer_group);
        self.sorted_connected_peers(&group)
    }

    pub fn is_used(&self, address: &NetworkAddress) -> bool {
        acquire_read_lock!(self.used_addresses).contains(address)
    }

    //---------------------------------- Helpers --------------------------------------------//

    fn is_valid_non_seed(&self, group: &PeerGroup, address: &NetworkAddress) -> bool {
        !group.is_seed(address) && !group.is_banned(address) && *address != self.my_address
    }

    fn is_not_outdated(&self, peer: &Peer, now: chrono::DateTime<Utc>) -> bool {
        peer.age(now) < self.config.max_peer_age
    }

    fn sorted_connected_peers(&self, group: &PeerGroup) -> Vec<Peer> {
        let mut peers = group
            .connected()
            .filter(|peer| self.is_valid_non_seed(group, peer.address()))
            .cloned()
            .collect::<Vec<_>>();
        sort_newest_first(&mut peers);
        peers
    }

    fn sorted_reported_peers(&self, group: &PeerGroup) -> Vec<Peer> {
        let now = Utc::now();
        let mut peers = group
            .reported()
            .filter(|peer| self.is_valid_non_seed(group, peer.address()) && self.is_not_outdated(peer, now))
            .cloned()
            .collect::<Vec<_>>();
        sort_newest_first(&mut peers);
        peers
    }
}

impl fmt::Debug for PeerExchangeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = acquire_read_lock!(self.peer_group);
        f.debug_struct("PeerExchangeStrategy")
            .field("my_address", &self.my_address)
            .field("num_connected", &group.num_connected())
            .field("num_reported", &group.num_reported())
            .field("num_used", &acquire_read_lock!(self.used_addresses).len())
            .finish()
    }
}
