//! End-to-end message flows across in-process nodes.
//!
//! Each node runs a real TCP listener on an ephemeral port; leadership
//! state is staged directly so the tests drive exactly one protocol flow.

use async_trait::async_trait;
use peershare_consensus::ConsensusRound;
use peershare_election::{partition_groups, sorted_by_id};
use peershare_ledger::{MembershipBlock, TransactionBlock};
use peershare_messages::Message;
use peershare_network::{broadcast, Discovery};
use peershare_node::{
    dispatcher, server, transfer, Clock, Collaborators, NodeConfig, NodeContext,
    ShutdownController,
};
use peershare_nullables::{MemoryBlobStore, MemoryKeyStore, NullEncryptor, NullSigner};
use peershare_types::{FileRecord, FileTransaction, ParticipantRecord, PeerInfo, Timestamp};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

struct FixedDiscovery;

#[async_trait]
impl Discovery for FixedDiscovery {
    async fn discover(&self) -> Vec<PeerInfo> {
        Vec::new()
    }
}

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(1_700_000_000_000)
    }
}

struct TestNode {
    ctx: Arc<NodeContext>,
    _shutdown: ShutdownController,
}

async fn spawn_node(id: &str) -> TestNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = NodeConfig::default();
    config.node_id = id.to_string();
    config.port = port;
    config.connect_timeout_ms = 500;
    config.files_dir = std::env::temp_dir().join(format!("peershare-test-{id}-{port}"));

    let ctx = NodeContext::new(
        config,
        Collaborators {
            signer: Arc::new(NullSigner),
            encryptor: Arc::new(NullEncryptor::new()),
            key_store: Arc::new(MemoryKeyStore),
            blob_store: Arc::new(MemoryBlobStore::new()),
            discovery: Arc::new(FixedDiscovery),
            clock: Arc::new(FixedClock),
        },
    );

    let shutdown = ShutdownController::new();
    let server_ctx = Arc::clone(&ctx);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server::run(server_ctx, listener, rx).await;
    });

    TestNode {
        ctx,
        _shutdown: shutdown,
    }
}

/// Install the same leadership view on every node.
async fn stage_leadership(nodes: &[&TestNode], leaders: &[PeerInfo], current: &PeerInfo) {
    let all: Vec<PeerInfo> = nodes.iter().map(|n| n.ctx.config.self_peer()).collect();
    let groups = partition_groups(&sorted_by_id(leaders), &all);
    for node in nodes {
        let mut state = node.ctx.state.lock().await;
        state.registry.reset();
        for peer in &all {
            state.registry.insert(peer.clone());
        }
        state.leaders = leaders.to_vec();
        state.current_leader = Some(current.clone());
        state.groups = groups.clone();
    }
}

/// Poll until every node's chain has `expected` blocks.
async fn wait_for_chain_len(nodes: &[&TestNode], chain: ChainKind, expected: usize) {
    timeout(Duration::from_secs(5), async {
        loop {
            let mut done = true;
            for node in nodes {
                let state = node.ctx.state.lock().await;
                let len = match chain {
                    ChainKind::Membership => state.membership_chain.len(),
                    ChainKind::Transaction => state.transaction_chain.len(),
                };
                if len != expected {
                    done = false;
                    break;
                }
            }
            if done {
                return;
            }
            sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("chains did not converge in time");
}

#[derive(Clone, Copy)]
enum ChainKind {
    Membership,
    Transaction,
}

#[tokio::test]
async fn membership_block_commits_across_three_leaders() {
    let a = spawn_node("a").await;
    let b = spawn_node("b").await;
    let c = spawn_node("c").await;
    let nodes = [&a, &b, &c];

    let leaders: Vec<PeerInfo> = nodes.iter().map(|n| n.ctx.config.self_peer()).collect();
    let current = a.ctx.config.self_peer();
    stage_leadership(&nodes, &leaders, &current).await;

    // Leader a proposes a membership block to its co-leaders.
    let (block, targets) = {
        let mut state = a.ctx.state.lock().await;
        let groups = state.groups.clone();
        let block = MembershipBlock::new(
            state.membership_chain.next_index(),
            Timestamp::new(1_700_000_000_000),
            groups,
            state.vote_box.votes().to_vec(),
            state.membership_chain.last().hash.clone(),
        );
        let scope: BTreeSet<String> = leaders.iter().map(|l| l.id.clone()).collect();
        let mut round = ConsensusRound::new(block.clone(), "a", scope);
        round.mark_pre_prepared();
        state.membership_round = Some(round);
        (block, state.registry.others("a"))
    };
    let co_leaders: Vec<PeerInfo> = targets
        .into_iter()
        .filter(|p| leaders.iter().any(|l| l.id == p.id))
        .collect();
    broadcast(
        &co_leaders,
        &Message::PrePrepare(block),
        Duration::from_millis(500),
    )
    .await;

    // Prepare floods among b and c, both commit to a. Two received
    // commits meet ceil(2*3/3) = 2, a finalizes and floods NewBlock;
    // every chain ends up at length 2.
    wait_for_chain_len(&nodes, ChainKind::Membership, 2).await;

    let state = b.ctx.state.lock().await;
    assert_eq!(state.membership_chain.last().index, 1);
    assert_eq!(state.membership_chain.validate(), Ok(()));
    assert_eq!(state.groups.len(), 3);
}

#[tokio::test]
async fn upload_commits_in_a_three_member_group_and_share_follows() {
    let a = spawn_node("leader").await;
    let b = spawn_node("m1").await;
    let c = spawn_node("m2").await;
    let nodes = [&a, &b, &c];

    let leaders = vec![a.ctx.config.self_peer()];
    let current = a.ctx.config.self_peer();
    stage_leadership(&nodes, &leaders, &current).await;

    // A member uploads a file. The leader relays UploadPrepare to its
    // group; both members commit, meeting ceil(2*3/3) = 2.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    tokio::fs::write(&path, b"hello peershare").await.unwrap();
    let index = transfer::upload(&b.ctx, &path).await.unwrap();
    assert_eq!(index, 1);

    wait_for_chain_len(&nodes, ChainKind::Transaction, 2).await;

    {
        let state = b.ctx.state.lock().await;
        let block = state.transaction_chain.last();
        assert_eq!(block.file.name, "notes.txt");
        assert_eq!(block.participants.len(), 1);
        assert_eq!(state.transaction_chain.validate(), Ok(()));
    }

    // The member shares the uploaded file with the leader.
    let share_index = transfer::share(&b.ctx, 1, "leader").await.unwrap();
    assert_eq!(share_index, 2);

    wait_for_chain_len(&nodes, ChainKind::Transaction, 3).await;

    let state = a.ctx.state.lock().await;
    let block = state.transaction_chain.last();
    assert_eq!(block.participants.len(), 2);
    assert_eq!(
        block.transaction.receiver.as_ref().map(|r| r.id.as_str()),
        Some("leader")
    );
}

#[tokio::test]
async fn four_member_group_stays_short_of_quorum_at_two_commits() {
    let a = spawn_node("leader").await;

    // Group of 4: the leader plus three members that never answer.
    let leader = a.ctx.config.self_peer();
    let members: Vec<PeerInfo> = (1..=3)
        .map(|i| PeerInfo::new(format!("m{i}"), "127.0.0.1:1", 0.5, 0.5))
        .collect();
    {
        let mut state = a.ctx.state.lock().await;
        state.registry.reset();
        state.registry.insert(leader.clone());
        for member in &members {
            state.registry.insert(member.clone());
        }
        state.leaders = vec![leader.clone()];
        state.current_leader = Some(leader.clone());
        let mut group = vec![leader.clone()];
        group.extend(members);
        state.groups = vec![group];
    }

    let block = {
        let state = a.ctx.state.lock().await;
        TransactionBlock::new(
            state.transaction_chain.next_index(),
            Timestamp::new(1_700_000_000_000),
            FileRecord {
                name: "notes.txt".into(),
                content_id: "cid-1".into(),
                encrypted_key: "sealed".into(),
            },
            vec![ParticipantRecord {
                public_key: "pk-leader".into(),
                encrypted_key: "sealed".into(),
            }],
            FileTransaction::upload(leader, "notes.txt", "cid-1", "pk-leader", "sealed"),
            state.transaction_chain.last().hash.clone(),
        )
    };

    dispatcher::dispatch(&a.ctx, Message::UploadPrePrepare(block.clone()))
        .await
        .unwrap();
    dispatcher::dispatch(&a.ctx, Message::UploadCommit(block.clone()))
        .await
        .unwrap();
    dispatcher::dispatch(&a.ctx, Message::UploadCommit(block.clone()))
        .await
        .unwrap();
    {
        let state = a.ctx.state.lock().await;
        // Two commits are short of ceil(2*4/3) = 3: no finalization.
        assert_eq!(state.transaction_chain.len(), 1);
        assert!(state.transaction_round.is_some());
    }

    // The third commit reaches quorum.
    dispatcher::dispatch(&a.ctx, Message::UploadCommit(block))
        .await
        .unwrap();
    let state = a.ctx.state.lock().await;
    assert_eq!(state.transaction_chain.len(), 2);
    assert!(state.transaction_round.is_none());
}
