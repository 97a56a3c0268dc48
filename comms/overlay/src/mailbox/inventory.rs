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

use std::collections::HashMap;

use super::data::{MailboxHash, MailboxRequest};

/// The highest sequence number a requester holds for each hash
pub type InventoryFilter = HashMap<MailboxHash, u32>;

/// The entries a requester is missing, bounded by the inventory byte budget
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxInventory {
    pub entries: Vec<MailboxRequest>,
    /// The number of missing entries left out of this inventory. A follow-up request with a larger offset fetches
    /// them.
    pub num_dropped: usize,
}

impl MailboxInventory {
    pub fn is_complete(&self) -> bool {
        self.num_dropped == 0
    }
}

/// True if the requester does not have the entry, or only an older version of it
pub(super) fn is_missing(filter: &InventoryFilter, hash: &MailboxHash, request: &MailboxRequest) -> bool {
    filter
        .get(hash)
        .map(|seq| request.sequence_number() > *seq)
        .unwrap_or(true)
}

/// How many entries of the average stored size fit in the byte budget. Never less than one.
pub(super) fn max_items(max_inventory_bytes: usize, total_bytes: usize, num_entries: usize) -> usize {
    if num_entries == 0 {
        return 0;
    }
    let average = (total_bytes / num_entries).max(1);
    (max_inventory_bytes / average).max(1)
}

/// Orders `missing` by hash and returns at most `max_items` entries starting at `offset`
pub(super) fn select_page(
    mut missing: Vec<(MailboxHash, MailboxRequest)>,
    offset: usize,
    max_items: usize,
) -> MailboxInventory {
    let num_missing = missing.len();
    missing.sort_by(|(a, _), (b, _)| a.cmp(b));
    if num_missing <= max_items {
        return MailboxInventory {
            entries: missing.into_iter().map(|(_, req)| req).collect(),
            num_dropped: 0,
        };
    }
    let entries = missing
        .into_iter()
        .skip(offset)
        .take(max_items)
        .map(|(_, req)| req)
        .collect::<Vec<_>>();
    MailboxInventory {
        num_dropped: num_missing - entries.len(),
        entries,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{crypto::DefaultCrypto, test_utils::MailboxFixture};

    fn entry(seq: u32) -> (MailboxHash, MailboxRequest) {
        let fixture = MailboxFixture::new();
        let req = fixture.add_request(seq);
        (req.data.hash(&DefaultCrypto), req.into())
    }

    #[test]
    fn it_includes_unknown_and_newer_entries() {
        let (hash, req) = entry(3);
        let mut filter = InventoryFilter::new();
        assert!(is_missing(&filter, &hash, &req));
        filter.insert(hash.clone(), 2);
        assert!(is_missing(&filter, &hash, &req));
        filter.insert(hash.clone(), 3);
        assert!(!is_missing(&filter, &hash, &req));
    }

    #[test]
    fn it_derives_max_items_from_the_average_size() {
        assert_eq!(max_items(1000, 0, 0), 0);
        assert_eq!(max_items(1000, 1000, 10), 10);
        assert_eq!(max_items(10, 1000, 1), 1);
    }

    #[test]
    fn it_pages_through_missing_entries() {
        let missing = (1..=5).map(entry).collect::<Vec<_>>();
        let mut sorted = missing.iter().map(|(h, _)| h.clone()).collect::<Vec<_>>();
        sorted.sort();

        let page = select_page(missing.clone(), 0, 2);
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.num_dropped, 3);

        let last = select_page(missing.clone(), 4, 2);
        assert_eq!(last.entries.len(), 1);
        assert_eq!(last.num_dropped, 4);

        let all = select_page(missing, 0, 5);
        assert!(all.is_complete());
        let hashes = all.entries.iter().map(|req| req.hash(&DefaultCrypto)).collect::<Vec<_>>();
        assert_eq!(hashes, sorted);
    }
}
