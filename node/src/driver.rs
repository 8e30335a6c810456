//! The periodic cycle driver.
//!
//! Once per tick interval the driver either starts a fresh election (no
//! leaders yet, or a current leader is installed while the rotation count
//! is stale or has walked the whole set) or rotates the leader role one
//! step. All nodes tick on interval boundaries measured from the epoch, so
//! their cycles line up without coordination.

use crate::clock::next_tick_delay;
use crate::context::NodeContext;
use crate::error::NodeError;
use peershare_consensus::ConsensusRound;
use peershare_election::{
    candidate_count, partition_groups, peer_weight, rank_candidates, select_current_leader,
    sorted_by_id, tally, ScoreWeights,
};
use peershare_ledger::MembershipBlock;
use peershare_messages::Message;
use peershare_network::broadcast;
use peershare_types::Vote;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Drive cycles until shutdown.
pub async fn run(ctx: Arc<NodeContext>, mut shutdown: Receiver<()>) {
    loop {
        let delay = next_tick_delay(ctx.clock.now(), ctx.config.tick_interval());
        tokio::select! {
            _ = shutdown.recv() => {
                info!("driver stopping");
                return;
            }
            _ = sleep(delay) => {}
        }
        if let Err(e) = run_cycle(&ctx).await {
            warn!(error = %e, "cycle failed");
        }
    }
}

/// One cycle: election when there is no leader set, or when the rotation
/// counter shows a stale (0) or exhausted (>= len) cycle while a current
/// leader is installed; otherwise one rotation step.
pub async fn run_cycle(ctx: &NodeContext) -> Result<(), NodeError> {
    let needs_election = {
        let state = ctx.state.lock().await;
        let len = state.leaders.len() as u64;
        state.leaders.is_empty()
            || ((state.rotation_count == 0 || state.rotation_count >= len)
                && state.current_leader.is_some())
    };
    if needs_election {
        run_election(ctx).await
    } else {
        run_rotation(ctx).await
    }
}

async fn run_election(ctx: &NodeContext) -> Result<(), NodeError> {
    // Tell the old registry we are starting over, then clear local state.
    let stale = {
        let mut state = ctx.state.lock().await;
        let stale = if state.current_leader.is_some() {
            state.registry.others(ctx.node_id())
        } else {
            Vec::new()
        };
        state.reset_leadership();
        stale
    };
    if !stale.is_empty() {
        broadcast(&stale, &Message::Reset, ctx.config.connect_timeout()).await;
    }

    let others = ctx.discovery.discover().await;
    if others.is_empty() {
        debug!("no peers discovered; cycle aborted");
        return Ok(());
    }

    let self_peer = ctx.config.self_peer();
    let (own_vote, targets) = {
        let mut state = ctx.state.lock().await;
        state.registry.reset();
        state.registry.insert(self_peer.clone());
        for peer in others {
            state.registry.insert(peer);
        }
        let candidates = rank_candidates(state.registry.peers());
        let own_vote = Vote::new(
            ctx.node_id(),
            candidates.iter().map(|c| c.id.clone()).collect(),
            peer_weight(&self_peer, ScoreWeights::default()),
        );
        state.vote_box.clear();
        state.vote_box.insert(own_vote.clone());
        (own_vote, state.registry.others(ctx.node_id()))
    };
    broadcast(
        &targets,
        &Message::VotingResult(own_vote),
        ctx.config.connect_timeout(),
    )
    .await;

    // Leave the vote box open while ballots arrive.
    sleep(ctx.config.vote_wait()).await;

    let (in_leader_set, is_current) = {
        let mut state = ctx.state.lock().await;
        let count = candidate_count(state.registry.len());
        let leaders = tally(state.vote_box.votes(), state.registry.peers(), count);
        if leaders.is_empty() {
            debug!("tally produced no leaders; cycle aborted");
            return Ok(());
        }
        info!(leaders = leaders.len(), "election complete");
        state.rotation_count = 0;
        let current = select_current_leader(&leaders, 0);
        let in_set = leaders.iter().any(|l| l.id == ctx.node_id());
        state.leaders = leaders;
        state.current_leader = current.clone();
        (in_set, current.is_some_and(|c| c.id == ctx.node_id()))
    };
    if in_leader_set {
        advance_rotation(ctx).await;
    }
    if is_current {
        leader_duties(ctx).await?;
    }
    Ok(())
}

async fn run_rotation(ctx: &NodeContext) -> Result<(), NodeError> {
    let (in_leader_set, is_current) = {
        let mut state = ctx.state.lock().await;
        let current = select_current_leader(&state.leaders, state.rotation_count);
        state.current_leader = current.clone();
        let is_current = current.is_some_and(|c| {
            info!(leader = %c, count = state.rotation_count, "leader rotated");
            c.id == ctx.node_id()
        });
        (state.is_leader(ctx.node_id()), is_current)
    };
    if in_leader_set {
        advance_rotation(ctx).await;
    }
    if is_current {
        leader_duties(ctx).await?;
    }
    Ok(())
}

/// Every leader-set member advances the shared counter after selecting the
/// current leader and broadcasts the new value. Counters drift apart only
/// when broadcasts are lost; receivers reconcile through the
/// adopt-only-greater rule.
async fn advance_rotation(ctx: &NodeContext) {
    let (count, targets) = {
        let mut state = ctx.state.lock().await;
        state.rotation_count += 1;
        (state.rotation_count, state.registry.others(ctx.node_id()))
    };
    broadcast(
        &targets,
        &Message::RotationCount(count),
        ctx.config.connect_timeout(),
    )
    .await;
}

enum MembershipProposal {
    /// Single-leader scope: finalized and appended on the spot.
    Finalized(MembershipBlock),
    /// Multi-leader scope: round opened, PrePrepare goes out.
    Open(MembershipBlock),
}

/// What the freshly selected current leader does: announce itself,
/// partition the network and propose a membership block.
async fn leader_duties(ctx: &NodeContext) -> Result<(), NodeError> {
    let self_peer = ctx.config.self_peer();
    let (others, other_leaders, proposal) = {
        let mut state = ctx.state.lock().await;
        let others = state.registry.others(ctx.node_id());
        let leaders = sorted_by_id(&state.leaders);
        let groups = partition_groups(&leaders, state.registry.peers());
        state.groups = groups.clone();

        let block = MembershipBlock::new(
            state.membership_chain.next_index(),
            ctx.clock.now(),
            groups,
            state.vote_box.votes().to_vec(),
            state.membership_chain.last().hash.clone(),
        );
        let scope: BTreeSet<String> = leaders.iter().map(|l| l.id.clone()).collect();
        let mut round = ConsensusRound::new(block.clone(), ctx.node_id(), scope);
        round.mark_pre_prepared();

        if round.has_quorum() {
            let finalized = round.finalize()?;
            state.membership_chain.append(finalized.clone())?;
            state.adopt_groups(&finalized);
            info!(index = finalized.index, "membership block finalized (single leader)");
            (others, Vec::new(), MembershipProposal::Finalized(finalized))
        } else {
            state.membership_round = Some(round);
            let other_leaders = leaders
                .into_iter()
                .filter(|l| l.id != ctx.node_id())
                .collect();
            (others, other_leaders, MembershipProposal::Open(block))
        }
    };

    broadcast(
        &others,
        &Message::CurrentLeader(self_peer),
        ctx.config.connect_timeout(),
    )
    .await;
    match proposal {
        MembershipProposal::Finalized(block) => {
            broadcast(&others, &Message::NewBlock(block), ctx.config.connect_timeout()).await;
        }
        MembershipProposal::Open(block) => {
            broadcast(
                &other_leaders,
                &Message::PrePrepare(block),
                ctx.config.connect_timeout(),
            )
            .await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::config::NodeConfig;
    use crate::context::Collaborators;
    use async_trait::async_trait;
    use peershare_network::Discovery;
    use peershare_nullables::{MemoryBlobStore, MemoryKeyStore, NullEncryptor, NullSigner};
    use peershare_types::{PeerInfo, Timestamp};

    struct FixedDiscovery(Vec<PeerInfo>);

    #[async_trait]
    impl Discovery for FixedDiscovery {
        async fn discover(&self) -> Vec<PeerInfo> {
            self.0.clone()
        }
    }

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0)
        }
    }

    fn test_ctx(discovered: Vec<PeerInfo>) -> Arc<NodeContext> {
        let mut config = NodeConfig::default();
        config.node_id = "self".into();
        config.port = 1; // nothing listens; broadcasts fail harmlessly
        config.efficiency_score = Some(0.95);
        config.reputation_score = Some(0.95);
        config.vote_wait_ms = 10;
        config.connect_timeout_ms = 50;
        NodeContext::new(
            config,
            Collaborators {
                signer: Arc::new(NullSigner),
                encryptor: Arc::new(NullEncryptor::new()),
                key_store: Arc::new(MemoryKeyStore),
                blob_store: Arc::new(MemoryBlobStore::new()),
                discovery: Arc::new(FixedDiscovery(discovered)),
                clock: Arc::new(FixedClock(1_000_000)),
            },
        )
    }

    #[tokio::test]
    async fn empty_discovery_aborts_the_cycle() {
        let ctx = test_ctx(Vec::new());
        run_cycle(&ctx).await.unwrap();
        let state = ctx.state.lock().await;
        assert!(state.leaders.is_empty());
        assert_eq!(state.membership_chain.len(), 1);
    }

    #[tokio::test]
    async fn highest_scorer_elects_itself_and_finalizes_alone() {
        // One other peer with lower scores, unreachable on the wire. The
        // self vote alone elects this node; a single-leader scope
        // finalizes the membership block immediately.
        let other = PeerInfo::new("other", "127.0.0.1:1", 0.1, 0.1);
        let ctx = test_ctx(vec![other]);
        run_cycle(&ctx).await.unwrap();

        let state = ctx.state.lock().await;
        assert_eq!(state.leaders.len(), 1);
        assert_eq!(state.leaders[0].id, "self");
        assert!(state.is_current_leader("self"));
        assert_eq!(state.rotation_count, 1);
        assert_eq!(state.membership_chain.len(), 2);
        let block = state.membership_chain.last();
        assert_eq!(block.grouped_peers[0][0].id, "self");
        assert!(state.membership_round.is_none());
    }

    #[tokio::test]
    async fn stale_zero_count_with_a_leader_forces_re_election() {
        // A node that adopted a leader set but never saw a RotationCount
        // broadcast sits at count 0. The next cycle must re-elect, not
        // rotate forever on the stale counter.
        let ctx = test_ctx(Vec::new());
        let other = PeerInfo::new("other", "127.0.0.1:1", 0.9, 0.9);
        {
            let mut state = ctx.state.lock().await;
            state.leaders = vec![other.clone()];
            state.current_leader = Some(other);
            state.rotation_count = 0;
        }

        run_cycle(&ctx).await.unwrap();
        let state = ctx.state.lock().await;
        // The election path ran: leadership was cleared, then the empty
        // discovery aborted the cycle.
        assert!(state.leaders.is_empty());
        assert!(state.current_leader.is_none());
        assert_eq!(state.rotation_count, 0);
    }

    #[tokio::test]
    async fn co_leaders_advance_the_rotation_count() {
        // Every leader-set member increments and broadcasts the counter
        // after selecting the current leader, not just the leader itself.
        let ctx = test_ctx(Vec::new());
        {
            let mut state = ctx.state.lock().await;
            state.leaders = vec![
                PeerInfo::new("aaa", "127.0.0.1:1", 0.9, 0.9),
                PeerInfo::new("bbb", "127.0.0.1:1", 0.8, 0.8),
                ctx.config.self_peer(),
            ];
            state.current_leader = Some(PeerInfo::new("aaa", "127.0.0.1:1", 0.9, 0.9));
            state.rotation_count = 1;
        }

        run_cycle(&ctx).await.unwrap();
        let state = ctx.state.lock().await;
        assert_eq!(state.current_leader.as_ref().unwrap().id, "bbb");
        assert_eq!(state.rotation_count, 2);
        // Not the current leader, so no membership proposal was made.
        assert_eq!(state.membership_chain.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_rotation_triggers_re_election() {
        let other = PeerInfo::new("other", "127.0.0.1:1", 0.1, 0.1);
        let ctx = test_ctx(vec![other]);
        run_cycle(&ctx).await.unwrap();
        assert_eq!(ctx.state.lock().await.rotation_count, 1);

        // One leader, rotation_count 1 >= 1: the next cycle re-elects.
        run_cycle(&ctx).await.unwrap();
        let state = ctx.state.lock().await;
        assert_eq!(state.rotation_count, 1);
        assert_eq!(state.membership_chain.len(), 3);
    }
}
