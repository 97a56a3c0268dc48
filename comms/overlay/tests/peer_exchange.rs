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

mod harness;

use std::time::Duration;

use harness::*;
use tari_comms_overlay::peer_exchange::{PeerExchangeEvent, RetryState, RoundKind};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_bootstraps_from_a_seed_node() {
    let _ = env_logger::try_init();
    let network = InMemoryNetwork::new();
    let seed = make_node(&network, "seed", peer_exchange_config(vec![]), mailbox_config());
    seed.strategy()
        .add_reported_peers(recent_peers(&["alice", "bob", "carol"]), &make_address("dave"));

    let node = make_node(
        &network,
        "node",
        peer_exchange_config(vec![seed.address.clone()]),
        mailbox_config(),
    );
    assert!(node.peer_exchange.start_initial_peer_exchange().await);

    let reported = node.strategy().reported_peers();
    let mut names = reported.iter().map(|p| p.address().host().to_string()).collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["alice.onion", "bob.onion", "carol.onion"]);

    // The seed learns about the node through its connection
    let node_address = node.address.clone();
    assert!(
        wait_until(
            || seed
                .strategy()
                .connected_peers()
                .iter()
                .any(|p| p.address() == &node_address),
            Duration::from_secs(5)
        )
        .await
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn peers_learn_from_each_others_requests() {
    let network = InMemoryNetwork::new();
    let seed = make_node(&network, "seed", peer_exchange_config(vec![]), mailbox_config());
    let first = make_node(
        &network,
        "first",
        peer_exchange_config(vec![seed.address.clone()]),
        mailbox_config(),
    );
    first
        .strategy()
        .add_reported_peers(recent_peers(&["erin"]), &make_address("frank"));
    assert!(first.peer_exchange.start_initial_peer_exchange().await);

    // The seed accepted the peers reported in first's request and passes them on
    assert!(
        wait_until(
            || seed
                .strategy()
                .reported_peers()
                .iter()
                .any(|p| p.address() == &make_address("erin")),
            Duration::from_secs(5)
        )
        .await
    );
    let second = make_node(
        &network,
        "second",
        peer_exchange_config(vec![seed.address.clone()]),
        mailbox_config(),
    );
    assert!(second.peer_exchange.start_initial_peer_exchange().await);
    let reported = second.strategy().reported_peers();
    assert!(reported.iter().any(|p| p.address() == &make_address("erin")));
    assert!(reported.iter().all(|p| p.address() != &second.address));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_succeeds_if_any_seed_is_reachable() {
    let network = InMemoryNetwork::new();
    let seed = make_node(&network, "seed", peer_exchange_config(vec![]), mailbox_config());
    let node = make_node(
        &network,
        "node",
        peer_exchange_config(vec![make_address("offline"), seed.address.clone()]),
        mailbox_config(),
    );
    let mut events = node.peer_exchange.subscribe_events();
    assert!(node.peer_exchange.start_initial_peer_exchange().await);

    let info = loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        // The successful first exchange may also start a further round
        match &*event {
            PeerExchangeEvent::RoundCompleted(info) if info.kind == RoundKind::Initial => break info.clone(),
            _ => {},
        }
    };
    assert_eq!(info.kind, RoundKind::Initial);
    assert_eq!(info.num_succeeded, 1);
    assert_eq!(info.num_failed, 1);
    // Poorly connected, so the exchange is repeated
    assert!(
        wait_until(
            || node.peer_exchange.retry_state() != RetryState::Idle,
            Duration::from_secs(5)
        )
        .await
    );

    node.peer_exchange.shutdown();
    assert_eq!(node.peer_exchange.retry_state(), RetryState::Idle);
}
