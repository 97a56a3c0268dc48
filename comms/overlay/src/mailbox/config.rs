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

use crate::serializers;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailboxConfig {
    /// Entries created longer ago than this are pruned, whether or not they have been removed.
    /// Default: 10 days
    #[serde(with = "serializers::seconds")]
    pub max_age: Duration,
    /// The maximum number of entries held. Pruning keeps the newest entries and adds of new hashes are rejected once
    /// this size is reached.
    /// Default: 10,000
    pub max_map_size: usize,
    /// The approximate byte budget of a single inventory response.
    /// Default: 2 MiB
    pub max_inventory_bytes: usize,
    /// The largest accepted payload ciphertext.
    /// Default: 1 MiB
    pub max_payload_bytes: usize,
    /// How far in the future an entry's creation time may be before it is considered invalid.
    /// Default: 2 minutes
    #[serde(with = "serializers::seconds")]
    pub max_clock_skew: Duration,
    /// How often the pruning task runs.
    /// Default: 60 seconds
    #[serde(with = "serializers::seconds")]
    pub prune_interval: Duration,
    /// The capacity of the mailbox event channel. Slow subscribers that fall further behind than this miss events.
    /// Default: 100
    pub event_channel_size: usize,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(10 * 24 * 60 * 60),
            max_map_size: 10_000,
            max_inventory_bytes: 2 * 1024 * 1024,
            max_payload_bytes: 1024 * 1024,
            max_clock_skew: Duration::from_secs(2 * 60),
            prune_interval: Duration::from_secs(60),
            event_channel_size: 100,
        }
    }
}
