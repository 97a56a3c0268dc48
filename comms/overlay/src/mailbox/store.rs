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

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use log::*;
use tokio::sync::broadcast;

use super::{
    config::MailboxConfig,
    data::{AddMailboxRequest, MailboxData, MailboxHash, MailboxRequest, RemoveMailboxRequest, MAX_SEQUENCE_NUMBER},
    event::MailboxEvent,
    inventory::{self, InventoryFilter, MailboxInventory},
    result::{MailboxRejection, MailboxStoreResult},
};
use crate::{crypto::OverlayCrypto, persistence::PersistenceHandler};

const LOG_TARGET: &str = "comms::overlay::mailbox::store";

/// The persisted form of the store: the last accepted request for every hash
pub type MailboxSnapshot = HashMap<MailboxHash, MailboxRequest>;

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// A content-addressed store of signed mailbox entries. Each hash maps to the last accepted add or remove request.
/// Sequence numbers strictly increase per hash and a remove permanently blocks further adds for that hash.
///
/// Adds and removes for the same hash are serialised by the map's entry lock, so the sequence number comparison is
/// always against the currently stored request. Inventory reads only lock one shard at a time.
///
/// The persistence handler is signalled after every change. It is expected to read `snapshot()` from its own task.
pub struct MailboxStore<C> {
    config: MailboxConfig,
    crypto: C,
    map: DashMap<MailboxHash, MailboxRequest>,
    events: broadcast::Sender<Arc<MailboxEvent>>,
    persistence: Arc<dyn PersistenceHandler<()>>,
    clock: Clock,
}

impl<C: OverlayCrypto> MailboxStore<C> {
    pub fn new(config: MailboxConfig, crypto: C, persistence: Arc<dyn PersistenceHandler<()>>) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_size.max(1));
        Self {
            config,
            crypto,
            map: DashMap::new(),
            events,
            persistence,
            clock: Arc::new(|| Utc::now().timestamp_millis()),
        }
    }

    /// Replaces the wall clock (milliseconds since the unix epoch) used for expiry, clock skew and pruning
    #[cfg(test)]
    pub(crate) fn with_clock<F>(mut self, clock: F) -> Self
    where F: Fn() -> i64 + Send + Sync + 'static {
        self.clock = Arc::new(clock);
        self
    }

    /// Restores a store from a persisted snapshot. Outdated and expired entries are pruned straight away.
    pub fn from_persisted(
        config: MailboxConfig,
        crypto: C,
        persistence: Arc<dyn PersistenceHandler<()>>,
        snapshot: MailboxSnapshot,
    ) -> Self {
        let store = Self::new(config, crypto, persistence);
        let num_loaded = snapshot.len();
        for (hash, request) in snapshot {
            store.map.insert(hash, request);
        }
        let num_pruned = store.prune();
        info!(
            target: LOG_TARGET,
            "Loaded {} persisted mailbox entries ({} pruned)", num_loaded, num_pruned
        );
        store
    }

    pub fn config(&self) -> &MailboxConfig {
        &self.config
    }

    pub fn crypto(&self) -> &C {
        &self.crypto
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<MailboxEvent>> {
        self.events.subscribe()
    }

    //---------------------------------- Add --------------------------------------------//

    pub fn add(&self, request: AddMailboxRequest) -> MailboxStoreResult {
        self.add_at(request, self.now_millis())
    }

    fn add_at(&self, request: AddMailboxRequest, now_millis: i64) -> MailboxStoreResult {
        let hash = request.data.hash(&self.crypto);
        // Must be checked before taking the entry lock. DashMap::len locks every shard.
        let is_full = self.map.len() >= self.config.max_map_size;

        let data = {
            let entry = self.map.entry(hash.clone());
            if let Entry::Occupied(ref occupied) = entry {
                if request.data.is_sequence_nr_invalid(occupied.get().sequence_number()) {
                    return self.reject(&hash, MailboxRejection::SequenceNrInvalid);
                }
            }
            if is_full && matches!(entry, Entry::Vacant(_)) {
                return self.reject(&hash, MailboxRejection::MaxMapSizeReached);
            }
            if request.data.is_expired(now_millis) {
                return self.reject(&hash, MailboxRejection::Expired);
            }
            if self.is_data_invalid(&request.data, now_millis) {
                return self.reject(&hash, MailboxRejection::DataInvalid);
            }
            if request.is_public_key_invalid(&self.crypto) {
                return self.reject(&hash, MailboxRejection::PublicKeyInvalid);
            }
            if request.is_signature_invalid(&self.crypto) {
                return self.reject(&hash, MailboxRejection::SignatureInvalid);
            }

            let data = request.data.clone();
            entry.insert(request.into());
            data
        };

        debug!(
            target: LOG_TARGET,
            "Added mailbox entry {} (seq = {})", hash, data.sequence_number
        );
        self.persist();
        self.publish_event(MailboxEvent::Added(data));
        MailboxStoreResult::Added
    }

    fn is_data_invalid(&self, data: &MailboxData, now_millis: i64) -> bool {
        let ciphertext_len = data.payload.ciphertext.len();
        ciphertext_len == 0 ||
            ciphertext_len > self.config.max_payload_bytes ||
            data.sender_public_key_hash.is_empty() ||
            data.receiver_public_key_hash.is_empty() ||
            self.crypto.hash(&data.receiver_public_key) != data.receiver_public_key_hash ||
            self.is_from_the_future(data.created_at, now_millis)
    }

    /// The creation time of a remove is not signed. Bounding it keeps unauthenticated removes within `max_age` of
    /// pruning.
    fn is_from_the_future(&self, created_at: i64, now_millis: i64) -> bool {
        let max_skew_millis = i64::try_from(self.config.max_clock_skew.as_millis()).unwrap_or(i64::MAX);
        created_at > now_millis.saturating_add(max_skew_millis)
    }

    //---------------------------------- Remove --------------------------------------------//

    /// Removes the entry for the request's hash. Only the receiver of the entry may remove it.
    pub fn remove(&self, request: RemoveMailboxRequest) -> MailboxStoreResult {
        self.remove_at(request, self.now_millis())
    }

    fn remove_at(&self, request: RemoveMailboxRequest, now_millis: i64) -> MailboxStoreResult {
        let hash = request.hash.clone();
        if request.hash.as_bytes().is_empty() || self.is_from_the_future(request.created_at, now_millis) {
            return self.reject(&hash, MailboxRejection::DataInvalid);
        }
        let is_full = self.map.len() >= self.config.max_map_size;

        let removed = match self.map.entry(hash.clone()) {
            Entry::Vacant(vacant) => {
                if is_full {
                    debug!(
                        target: LOG_TARGET,
                        "Remove for unknown mailbox entry {} not recorded. Store is full.", hash
                    );
                    return MailboxStoreResult::NoEntry;
                }
                // Remember the sequence number so that a late add cannot resurrect the entry
                vacant.insert(request.into());
                debug!(target: LOG_TARGET, "Recorded remove for unknown mailbox entry {}", hash);
                self.persist();
                return MailboxStoreResult::NoEntry;
            },
            Entry::Occupied(mut occupied) => match occupied.get().clone() {
                MailboxRequest::Remove(stored) => {
                    let is_newer = !request.is_sequence_nr_invalid(stored.sequence_number);
                    if is_newer {
                        occupied.insert(request.into());
                    }
                    drop(occupied);
                    if is_newer {
                        self.persist();
                    }
                    return MailboxStoreResult::AlreadyRemoved;
                },
                MailboxRequest::Add(stored) => {
                    if request.is_sequence_nr_invalid(stored.data.sequence_number) {
                        return self.reject(&hash, MailboxRejection::SequenceNrInvalid);
                    }
                    if request.is_public_key_hash_invalid(&stored.data, &self.crypto) {
                        return self.reject(&hash, MailboxRejection::PublicKeyInvalid);
                    }
                    if request.is_signature_invalid(&self.crypto) {
                        return self.reject(&hash, MailboxRejection::SignatureInvalid);
                    }
                    occupied.insert(request.into());
                    stored.data
                },
            },
        };

        debug!(target: LOG_TARGET, "Removed mailbox entry {}", hash);
        self.persist();
        self.publish_event(MailboxEvent::Removed(removed.clone()));
        MailboxStoreResult::Removed(removed)
    }

    /// Applies an add or remove request, e.g. one received in an inventory
    pub fn process(&self, request: MailboxRequest) -> MailboxStoreResult {
        match request {
            MailboxRequest::Add(req) => self.add(req),
            MailboxRequest::Remove(req) => self.remove(req),
        }
    }

    //---------------------------------- Inventory --------------------------------------------//

    /// Returns every entry the requester is missing: entries whose hash is not in `filter`, or whose sequence number is
    /// higher than the one in `filter`. If these exceed the byte budget, a page of them starting at `offset` (in hash
    /// order) is returned and the rest are counted in `num_dropped`.
    pub fn inventory(&self, filter: &InventoryFilter, offset: usize) -> MailboxInventory {
        let mut total_bytes = 0usize;
        let mut num_entries = 0usize;
        let mut missing = Vec::new();
        for entry in self.map.iter() {
            total_bytes = total_bytes.saturating_add(entry.value().encoded_len());
            num_entries += 1;
            if inventory::is_missing(filter, entry.key(), entry.value()) {
                missing.push((entry.key().clone(), entry.value().clone()));
            }
        }
        let max_items = inventory::max_items(self.config.max_inventory_bytes, total_bytes, num_entries);
        let inventory = inventory::select_page(missing, offset, max_items);
        debug!(
            target: LOG_TARGET,
            "Inventory of {} entries for a filter of {} ({} dropped)",
            inventory.entries.len(),
            filter.len(),
            inventory.num_dropped
        );
        inventory
    }

    /// The filter describing this store's contents, for requesting an inventory from another node
    pub fn inventory_filter(&self) -> InventoryFilter {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().sequence_number()))
            .collect()
    }

    //---------------------------------- Pruning --------------------------------------------//

    /// Drops entries older than `max_age` and adds whose payload has expired, then keeps the newest `max_map_size`
    /// entries. Returns the number of entries dropped.
    pub fn prune(&self) -> usize {
        self.prune_at(self.now_millis())
    }

    pub(crate) fn prune_at(&self, now_millis: i64) -> usize {
        let max_age_millis = i64::try_from(self.config.max_age.as_millis()).unwrap_or(i64::MAX);
        let mut candidates = self
            .map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().sequence_number(), entry.value().created_at(), {
                let req = entry.value();
                now_millis.saturating_sub(req.created_at()) > max_age_millis || req.is_expired(now_millis)
            }))
            .collect::<Vec<_>>();

        // Newest first. Outdated entries sort last so that they never count towards the capacity.
        candidates.sort_by(|(_, _, created_a, outdated_a), (_, _, created_b, outdated_b)| {
            outdated_a.cmp(outdated_b).then(created_b.cmp(created_a))
        });
        let to_remove = candidates
            .into_iter()
            .enumerate()
            .filter(|(i, (_, _, _, outdated))| *outdated || *i >= self.config.max_map_size)
            .map(|(_, (hash, seq, _, _))| (hash, seq))
            .collect::<Vec<_>>();

        let mut num_removed = 0;
        for (hash, seq) in to_remove {
            // Skip entries that were replaced since they were inspected
            if self
                .map
                .remove_if(&hash, |_, req| req.sequence_number() == seq)
                .is_some()
            {
                num_removed += 1;
            }
        }

        if num_removed > 0 {
            info!(
                target: LOG_TARGET,
                "Pruned {} mailbox entries. {} remaining.",
                num_removed,
                self.map.len()
            );
            self.persist();
        }
        num_removed
    }

    //---------------------------------- Accessors --------------------------------------------//

    /// The sequence number stored for `hash`, or 0 if nothing is stored
    pub fn get_sequence_number(&self, hash: &MailboxHash) -> u32 {
        self.map.get(hash).map(|req| req.sequence_number()).unwrap_or(0)
    }

    pub fn contains(&self, hash: &MailboxHash) -> bool {
        self.map.contains_key(hash)
    }

    /// False once the hash of `data` has been removed
    pub fn can_add_mailbox_message(&self, data: &MailboxData) -> bool {
        self.get_sequence_number(&data.hash(&self.crypto)) < MAX_SEQUENCE_NUMBER
    }

    pub fn get(&self, hash: &MailboxHash) -> Option<MailboxRequest> {
        self.map.get(hash).map(|req| req.value().clone())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn snapshot(&self) -> MailboxSnapshot {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Signals persistence one last time so that the writer flushes the final state
    pub fn shutdown(&self) {
        info!(
            target: LOG_TARGET,
            "Mailbox store shutting down with {} entries",
            self.map.len()
        );
        self.persist();
    }

    //---------------------------------- Helpers --------------------------------------------//

    fn now_millis(&self) -> i64 {
        (self.clock)()
    }

    fn reject(&self, hash: &MailboxHash, reason: MailboxRejection) -> MailboxStoreResult {
        debug!(target: LOG_TARGET, "Rejected mailbox request for {}: {}", hash, reason);
        MailboxStoreResult::Rejected(reason)
    }

    fn persist(&self) {
        self.persistence.persist(());
    }

    fn publish_event(&self, event: MailboxEvent) {
        trace!(target: LOG_TARGET, "Publishing mailbox event {}", event);
        // No subscribers is not an error
        let _result = self.events.send(Arc::new(event));
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::{
        crypto::DefaultCrypto,
        mailbox::MailboxPayload,
        test_utils::{make_ciphertext, make_keypair, MailboxFixture, MockPersistence},
    };

    const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

    fn make_store(config: MailboxConfig) -> (MailboxStore<DefaultCrypto>, MockPersistence<()>) {
        let persistence = MockPersistence::new();
        let store = MailboxStore::new(config, DefaultCrypto, Arc::new(persistence.clone()));
        (store, persistence)
    }

    fn rejected(reason: MailboxRejection) -> MailboxStoreResult {
        MailboxStoreResult::Rejected(reason)
    }

    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    mod add {
        use super::*;

        #[test]
        fn it_requires_increasing_sequence_numbers() {
            let (store, persistence) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            assert_eq!(store.add(fixture.add_request(1)), MailboxStoreResult::Added);
            assert_eq!(
                store.add(fixture.add_request(1)),
                rejected(MailboxRejection::SequenceNrInvalid)
            );
            assert_eq!(store.add(fixture.add_request(2)), MailboxStoreResult::Added);
            assert_eq!(
                store.add(fixture.add_request(1)),
                rejected(MailboxRejection::SequenceNrInvalid)
            );

            let hash = fixture.data(0).hash(&DefaultCrypto);
            assert_eq!(store.len(), 1);
            assert_eq!(store.get_sequence_number(&hash), 2);
            assert_eq!(persistence.call_count(), 2);
            assert_eq!(store.snapshot().len(), 1);
        }

        #[test]
        fn it_rejects_expired_entries() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            let mut data = fixture.data(1);
            data.payload.time_to_live = Duration::from_secs(60);
            data.created_at = now_millis() - 61_000;
            assert_eq!(store.add(fixture.sign_add(data)), rejected(MailboxRejection::Expired));
            assert!(store.is_empty());
        }

        #[test]
        fn it_rejects_invalid_data() {
            let (store, _) = make_store(MailboxConfig {
                max_payload_bytes: 100,
                ..Default::default()
            });
            let fixture = MailboxFixture::new();

            let mut empty = fixture.data(1);
            empty.payload = MailboxPayload::new(vec![], Duration::from_secs(60));
            assert_eq!(store.add(fixture.sign_add(empty)), rejected(MailboxRejection::DataInvalid));

            let mut too_large = fixture.data(1);
            too_large.payload = MailboxPayload::new(make_ciphertext(101), Duration::from_secs(60));
            assert_eq!(
                store.add(fixture.sign_add(too_large)),
                rejected(MailboxRejection::DataInvalid)
            );

            let mut from_the_future = fixture.data(1);
            from_the_future.created_at = now_millis() + 10 * 60 * 1000;
            assert_eq!(
                store.add(fixture.sign_add(from_the_future)),
                rejected(MailboxRejection::DataInvalid)
            );

            let mut wrong_receiver_hash = fixture.data(1);
            wrong_receiver_hash.receiver_public_key = make_keypair().1;
            assert_eq!(
                store.add(fixture.sign_add(wrong_receiver_hash)),
                rejected(MailboxRejection::DataInvalid)
            );
            assert!(store.is_empty());
        }

        #[test]
        fn it_rejects_a_mismatched_sender_key() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            let mut request = fixture.add_request(1);
            request.sender_public_key = make_keypair().1;
            assert_eq!(store.add(request), rejected(MailboxRejection::PublicKeyInvalid));
        }

        #[test]
        fn it_rejects_an_invalid_signature() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            let mut request = fixture.add_request(1);
            request.data.sequence_number = 2;
            assert_eq!(store.add(request), rejected(MailboxRejection::SignatureInvalid));
        }

        #[test]
        fn it_rejects_new_hashes_when_full() {
            let (store, _) = make_store(MailboxConfig {
                max_map_size: 2,
                ..Default::default()
            });
            let first = MailboxFixture::new();
            assert!(store.add(first.add_request(1)).is_success());
            assert!(store.add(MailboxFixture::new().add_request(1)).is_success());
            assert_eq!(
                store.add(MailboxFixture::new().add_request(1)),
                rejected(MailboxRejection::MaxMapSizeReached)
            );
            // Existing hashes may still be updated
            assert_eq!(store.add(first.add_request(2)), MailboxStoreResult::Added);
        }

        #[test]
        fn it_never_accepts_a_stale_update_under_contention() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            let requests = (1..=30).map(|seq| fixture.add_request(seq)).collect::<Vec<_>>();
            let mut events = store.subscribe();

            std::thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        for req in requests.iter().cloned() {
                            store.add(req);
                        }
                    });
                }
            });

            let hash = fixture.data(0).hash(&DefaultCrypto);
            assert_eq!(store.get_sequence_number(&hash), 30);
            // Each sequence number is accepted at most once
            let mut accepted = Vec::new();
            while let Ok(event) = events.try_recv() {
                match &*event {
                    MailboxEvent::Added(data) => accepted.push(data.sequence_number),
                    MailboxEvent::Removed(_) => panic!("unexpected remove"),
                }
            }
            let num_accepted = accepted.len();
            accepted.sort_unstable();
            accepted.dedup();
            assert_eq!(accepted.len(), num_accepted);
            assert_eq!(accepted.last(), Some(&30));
        }
    }

    mod remove {
        use super::*;

        #[test]
        fn it_removes_when_signed_by_the_receiver() {
            let (store, _) = make_store(Default::default());
            let mut events = store.subscribe();
            let fixture = MailboxFixture::new();
            let request = fixture.add_request(1);
            let data = request.data.clone();
            store.add(request);

            assert_eq!(
                store.remove(fixture.remove_request()),
                MailboxStoreResult::Removed(data.clone())
            );
            assert_eq!(*events.try_recv().unwrap(), MailboxEvent::Added(data.clone()));
            assert_eq!(*events.try_recv().unwrap(), MailboxEvent::Removed(data.clone()));

            let hash = data.hash(&DefaultCrypto);
            assert_eq!(store.get_sequence_number(&hash), MAX_SEQUENCE_NUMBER);
            assert!(store.get(&hash).unwrap().is_remove());
            assert!(!store.can_add_mailbox_message(&data));
            assert_eq!(store.remove(fixture.remove_request()), MailboxStoreResult::AlreadyRemoved);
        }

        #[test]
        fn it_never_accepts_an_add_after_removal() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            store.add(fixture.add_request(1));
            assert!(store.remove(fixture.remove_request()).is_success());
            assert_eq!(
                store.add(fixture.add_request(MAX_SEQUENCE_NUMBER - 1)),
                rejected(MailboxRejection::SequenceNrInvalid)
            );
            assert_eq!(
                store.add(fixture.add_request(MAX_SEQUENCE_NUMBER)),
                rejected(MailboxRejection::SequenceNrInvalid)
            );
        }

        #[test]
        fn it_records_removes_of_unknown_entries() {
            let (store, persistence) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            assert_eq!(store.remove(fixture.remove_request()), MailboxStoreResult::NoEntry);
            let hash = fixture.data(0).hash(&DefaultCrypto);
            assert!(store.contains(&hash));
            assert_eq!(persistence.call_count(), 1);
            assert_eq!(
                store.add(fixture.add_request(1)),
                rejected(MailboxRejection::SequenceNrInvalid)
            );
        }

        #[test]
        fn it_allows_a_late_add_over_a_low_phantom_remove() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            let mut remove = fixture.remove_request();
            remove.sequence_number = 0;
            assert_eq!(store.remove(remove), MailboxStoreResult::NoEntry);
            assert_eq!(store.add(fixture.add_request(1)), MailboxStoreResult::Added);
        }

        #[test]
        fn it_keeps_the_highest_sequence_number_of_repeated_removes() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            let hash = fixture.data(0).hash(&DefaultCrypto);
            let mut low = fixture.remove_request();
            low.sequence_number = 5;
            store.remove(low);
            assert_eq!(store.remove(fixture.remove_request()), MailboxStoreResult::AlreadyRemoved);
            assert_eq!(store.get_sequence_number(&hash), MAX_SEQUENCE_NUMBER);

            let mut lower = fixture.remove_request();
            lower.sequence_number = 7;
            assert_eq!(store.remove(lower), MailboxStoreResult::AlreadyRemoved);
            assert_eq!(store.get_sequence_number(&hash), MAX_SEQUENCE_NUMBER);
        }

        #[test]
        fn it_rejects_removes_from_the_future() {
            let (store, persistence) = make_store(MailboxConfig {
                max_map_size: 3,
                ..Default::default()
            });
            for _ in 0..3 {
                let fixture = MailboxFixture::new();
                let mut remove = fixture.remove_request();
                remove.created_at = i64::MAX;
                remove.signature = vec![0u8; 64];
                assert_eq!(store.remove(remove), rejected(MailboxRejection::DataInvalid));
            }
            let fixture = MailboxFixture::new();
            let mut remove = fixture.remove_request();
            remove.created_at = now_millis() + 10 * 60 * 1000;
            assert_eq!(store.remove(remove), rejected(MailboxRejection::DataInvalid));
            assert!(store.is_empty());
            assert_eq!(persistence.call_count(), 0);

            assert_eq!(store.add(MailboxFixture::new().add_request(1)), MailboxStoreResult::Added);
        }

        #[test]
        fn it_rejects_a_future_remove_of_a_stored_entry() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            store.add(fixture.add_request(1));
            let mut remove = fixture.remove_request();
            remove.created_at = i64::MAX;
            assert_eq!(store.remove(remove), rejected(MailboxRejection::DataInvalid));
            assert!(!store.get(&fixture.data(0).hash(&DefaultCrypto)).unwrap().is_remove());
        }

        #[test]
        fn unknown_removes_age_out_and_free_capacity() {
            let (store, _) = make_store(MailboxConfig {
                max_map_size: 3,
                ..Default::default()
            });
            let now = now_millis();
            for _ in 0..3 {
                let mut remove = MailboxFixture::new().remove_request();
                remove.signature = vec![0u8; 64];
                assert_eq!(store.remove_at(remove, now), MailboxStoreResult::NoEntry);
            }
            assert_eq!(
                store.add(MailboxFixture::new().add_request(1)),
                rejected(MailboxRejection::MaxMapSizeReached)
            );

            let after_max_age = now + 10 * DAY_MILLIS + 60_000;
            assert_eq!(store.prune_at(after_max_age), 3);
            let fixture = MailboxFixture::new();
            let mut data = fixture.data(1);
            data.created_at = after_max_age;
            assert_eq!(
                store.add_at(fixture.sign_add(data), after_max_age),
                MailboxStoreResult::Added
            );
        }

        #[test]
        fn only_the_receiver_may_remove() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            store.add(fixture.add_request(1));
            let data = fixture.data(0);

            let by_sender =
                RemoveMailboxRequest::new_signed(&data, fixture.sender.1.clone(), &fixture.sender.0, &DefaultCrypto)
                    .unwrap();
            assert_eq!(store.remove(by_sender), rejected(MailboxRejection::PublicKeyInvalid));

            let (other_secret, _) = make_keypair();
            let forged =
                RemoveMailboxRequest::new_signed(&data, fixture.receiver.1.clone(), &other_secret, &DefaultCrypto)
                    .unwrap();
            assert_eq!(store.remove(forged), rejected(MailboxRejection::SignatureInvalid));

            let mut stale = fixture.remove_request();
            stale.sequence_number = 1;
            assert_eq!(store.remove(stale), rejected(MailboxRejection::SequenceNrInvalid));
            assert!(!store.get(&data.hash(&DefaultCrypto)).unwrap().is_remove());
        }
    }

    mod inventory {
        use super::*;

        #[test]
        fn it_returns_missing_and_newer_entries() {
            let (store, _) = make_store(Default::default());
            let fixtures = (0..4).map(|_| MailboxFixture::new()).collect::<Vec<_>>();
            for f in &fixtures {
                store.add(f.add_request(2));
            }
            let hash = |i: usize| fixtures[i].data(0).hash(&DefaultCrypto);
            let mut filter = InventoryFilter::new();
            filter.insert(hash(0), 2);
            filter.insert(hash(1), 3);
            filter.insert(hash(2), 1);

            let inventory = store.inventory(&filter, 0);
            assert!(inventory.is_complete());
            let mut hashes = inventory
                .entries
                .iter()
                .map(|req| req.hash(&DefaultCrypto))
                .collect::<Vec<_>>();
            hashes.sort();
            let mut expected = vec![hash(2), hash(3)];
            expected.sort();
            assert_eq!(hashes, expected);
        }

        #[test]
        fn it_reports_dropped_entries_beyond_the_byte_budget() {
            let (store, _) = make_store(MailboxConfig {
                max_inventory_bytes: 1,
                ..Default::default()
            });
            for _ in 0..3 {
                store.add(MailboxFixture::new().add_request(1));
            }
            let filter = InventoryFilter::new();
            let first = store.inventory(&filter, 0);
            assert_eq!(first.entries.len(), 1);
            assert_eq!(first.num_dropped, 2);

            let pages = (0..3)
                .flat_map(|offset| store.inventory(&filter, offset).entries)
                .map(|req| req.hash(&DefaultCrypto))
                .collect::<std::collections::HashSet<_>>();
            assert_eq!(pages.len(), 3);
        }

        #[test]
        fn inventory_filter_describes_the_store() {
            let (store, _) = make_store(Default::default());
            let fixture = MailboxFixture::new();
            store.add(fixture.add_request(4));
            let filter = store.inventory_filter();
            assert_eq!(filter.get(&fixture.data(0).hash(&DefaultCrypto)), Some(&4));
            assert!(store.inventory(&filter, 0).entries.is_empty());
        }
    }

    mod prune {
        use super::*;

        fn long_lived(fixture: &MailboxFixture, created_at: i64) -> AddMailboxRequest {
            let mut data = fixture.data(1);
            data.payload.time_to_live = Duration::from_secs(30 * 24 * 60 * 60);
            data.created_at = created_at;
            fixture.sign_add(data)
        }

        #[test]
        fn it_prunes_at_the_max_age_boundary() {
            let (store, persistence) = make_store(Default::default());
            let now = now_millis();
            let max_age = 10 * DAY_MILLIS;
            let old = long_lived(&MailboxFixture::new(), now - max_age - 1);
            let young = long_lived(&MailboxFixture::new(), now - max_age + 1);
            let old_hash = old.data.hash(&DefaultCrypto);
            let young_hash = young.data.hash(&DefaultCrypto);
            assert!(store.add_at(old, now).is_success());
            assert!(store.add_at(young, now).is_success());
            let num_persisted = persistence.call_count();

            assert_eq!(store.prune_at(now), 1);
            assert!(!store.contains(&old_hash));
            assert!(store.contains(&young_hash));
            assert_eq!(persistence.call_count(), num_persisted + 1);
            assert_eq!(store.prune_at(now), 0);
        }

        #[test]
        fn it_prunes_expired_adds_but_not_removes() {
            let (store, _) = make_store(Default::default());
            let now = now_millis();
            let fixture = MailboxFixture::new();
            let mut data = fixture.data(1);
            data.payload.time_to_live = Duration::from_secs(60);
            store.add(fixture.sign_add(data));

            let removed = MailboxFixture::new();
            let mut remove = removed.remove_request();
            remove.created_at = now - DAY_MILLIS;
            store.remove(remove);

            assert_eq!(store.prune_at(now + 61_000), 1);
            assert_eq!(store.len(), 1);
            assert!(store.contains(&removed.data(0).hash(&DefaultCrypto)));
        }

        #[test]
        fn it_restores_and_keeps_the_newest_entries() {
            let config = MailboxConfig {
                max_map_size: 3,
                ..Default::default()
            };
            let now = now_millis();
            // Newest first
            let requests = (0..5)
                .map(|i| long_lived(&MailboxFixture::new(), now - (i + 1) * 1000))
                .collect::<Vec<_>>();
            let hashes = requests
                .iter()
                .map(|req| req.data.hash(&DefaultCrypto))
                .collect::<Vec<_>>();
            let snapshot = requests
                .into_iter()
                .map(|req| (req.data.hash(&DefaultCrypto), MailboxRequest::from(req)))
                .collect::<MailboxSnapshot>();
            let persistence = MockPersistence::new();
            let store = MailboxStore::from_persisted(config, DefaultCrypto, Arc::new(persistence.clone()), snapshot);

            assert_eq!(store.len(), 3);
            for (i, hash) in hashes.iter().enumerate() {
                assert_eq!(store.contains(hash), i < 3);
            }
            assert_eq!(persistence.call_count(), 1);

            store.shutdown();
            assert_eq!(persistence.call_count(), 2);
            assert_eq!(store.snapshot().len(), 3);
        }
    }
}
