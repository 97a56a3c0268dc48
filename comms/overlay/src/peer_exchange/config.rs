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

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{net_address::NetworkAddress, serializers};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeerExchangeConfig {
    /// Hard-coded bootstrap addresses. These are never stored as reported or persisted peers.
    /// Default: empty
    pub seed_nodes: Vec<NetworkAddress>,
    /// The maximum number of (shuffled) seed nodes to include in the initial exchange candidates.
    /// Default: 2
    pub num_seed_nodes_at_bootstrap: usize,
    /// The maximum number of persisted peers, oldest first, to include in exchange candidates.
    /// Default: 40
    pub num_persisted_peers_at_bootstrap: usize,
    /// The maximum number of reported peers, newest first, to include in exchange candidates. Also used to decide
    /// whether the node knows "enough" reported peers when calculating the candidate limit.
    /// Default: 20
    pub num_reported_peers_at_bootstrap: usize,
    /// A quarter of this value is the minimum number of candidates for each exchange round.
    /// Default: 8
    pub min_num_connected_peers: usize,
    /// The number of connections this node aims to have. While below this number the initial exchange is repeated.
    /// Default: 10
    pub target_num_connected_peers: usize,
    /// The initial exchange is repeated while fewer than this many reported peers are known.
    /// Default: 20
    pub min_num_reported_peers: usize,
    /// Capacity of the reported peer set and the maximum number of peers sent in or accepted from a single exchange.
    /// Default: 200
    pub max_reported_peers: usize,
    /// Capacity of the persisted peer set. The newest peers are kept.
    /// Default: 500
    pub max_persisted_peers: usize,
    /// If false, this node answers exchange requests with an empty peer list and sends none of its own peers. Nodes
    /// that serve clients outside the gossip network disable this so that those clients are not gossiped.
    /// Default: true
    pub support_peer_reporting: bool,
    /// An initial round with fewer candidates than this starts a further exchange round as soon as its first exchange
    /// succeeds. Set to 0 to disable.
    /// Default: 8
    pub extend_peer_group_threshold: usize,
    /// Peers last seen longer ago than this are neither reported nor accepted.
    /// Default: 5 days
    #[serde(with = "serializers::seconds")]
    pub max_peer_age: Duration,
    /// The time to wait for a peer exchange response before the exchange is counted as failed.
    /// Default: 30 seconds
    #[serde(with = "serializers::seconds")]
    pub request_timeout: Duration,
    /// The delay before the first repeated initial exchange. Doubled on each subsequent repeat.
    /// Default: 1 second
    #[serde(with = "serializers::seconds")]
    pub initial_retry_delay: Duration,
    /// The upper bound of the retry delay.
    /// Default: 60 seconds
    #[serde(with = "serializers::seconds")]
    pub max_retry_delay: Duration,
}

impl PeerExchangeConfig {
    /// The lower bound of the candidate limit for an exchange round
    pub(crate) fn min_candidates(&self) -> usize {
        self.min_num_connected_peers / 4
    }

    /// The share of `max_reported_peers` taken from connected peers when reporting. The remainder is filled with
    /// reported peers.
    pub(crate) fn max_connected_peers_for_reporting(&self) -> usize {
        self.max_reported_peers * 3 / 4
    }
}

impl Default for PeerExchangeConfig {
    fn default() -> Self {
        Self {
            seed_nodes: Vec::new(),
            num_seed_nodes_at_bootstrap: 2,
            num_persisted_peers_at_bootstrap: 40,
            num_reported_peers_at_bootstrap: 20,
            min_num_connected_peers: 8,
            target_num_connected_peers: 10,
            min_num_reported_peers: 20,
            max_reported_peers: 200,
            max_persisted_peers: 500,
            support_peer_reporting: true,
            extend_peer_group_threshold: 8,
            max_peer_age: Duration::from_secs(5 * 24 * 60 * 60),
            request_timeout: Duration::from_secs(30),
            initial_retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(60),
        }
    }
}
