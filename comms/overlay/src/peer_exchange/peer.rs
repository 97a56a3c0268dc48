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
    fmt,
    hash::{Hash, Hasher},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::net_address::NetworkAddress;

/// A remote overlay participant. Two peers are equal if they share an address, regardless of when they were last seen
/// or reported.
#[derive(Debug, Clone)]
pub struct Peer {
    address: NetworkAddress,
    last_seen: DateTime<Utc>,
}

impl Peer {
    pub fn new(address: NetworkAddress, last_seen: DateTime<Utc>) -> Self {
        Self { address, last_seen }
    }

    /// Constructs a peer seen just now
    pub fn seen_now(address: NetworkAddress) -> Self {
        Self::new(address, Utc::now())
    }

    pub fn address(&self) -> &NetworkAddress {
        &self.address
    }

    /// The time this peer was last seen or reported to us
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// The time elapsed since `last_seen`. Peers reported with a future timestamp have an age of zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_seen).to_std().unwrap_or_default()
    }

    pub(crate) fn is_newer_than(&self, other: &Peer) -> bool {
        self.last_seen > other.last_seen
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Peer {}

impl Hash for Peer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (last seen {})", self.address, self.last_seen)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use chrono::Duration as ChronoDuration;

    use super::*;

    #[test]
    fn it_is_identified_by_address() {
        let address = NetworkAddress::new("abc.onion", 1000);
        let now = Utc::now();
        let a = Peer::new(address.clone(), now);
        let b = Peer::new(address, now - ChronoDuration::days(3));
        assert_eq!(a, b);
        let set = vec![a, b].into_iter().collect::<HashSet<_>>();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn it_calculates_age() {
        let now = Utc::now();
        let peer = Peer::new(NetworkAddress::new("abc.onion", 1000), now - ChronoDuration::seconds(90));
        assert_eq!(peer.age(now), Duration::from_secs(90));

        let future_peer = Peer::new(NetworkAddress::new("abc.onion", 1000), now + ChronoDuration::seconds(90));
        assert_eq!(future_peer.age(now), Duration::ZERO);
    }
}
