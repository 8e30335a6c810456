//! Wire message dispatch.
//!
//! One inbound message, one handler. Handlers take the state lock, decide,
//! collect targets, then release the lock before any network write. Messages
//! that arrive out of phase for this node's role are dropped with a debug
//! log; only `GetNodeInfo` produces a reply on the same connection.

use crate::context::NodeContext;
use crate::error::NodeError;
use peershare_consensus::ConsensusRound;
use peershare_ledger::{MembershipBlock, TransactionBlock};
use peershare_messages::Message;
use peershare_network::{broadcast, send_message};
use peershare_types::{FileTransaction, PeerInfo, Vote};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Handle one inbound message. The returned message, if any, is written back
/// on the connection the request arrived on.
pub async fn dispatch(ctx: &NodeContext, message: Message) -> Result<Option<Message>, NodeError> {
    match message {
        Message::GetNodeInfo => Ok(Some(Message::NodeInfo(ctx.config.self_peer()))),
        Message::NodeInfo(peer) => {
            ctx.state.lock().await.registry.insert(peer);
            Ok(None)
        }
        Message::VotingResult(vote) => on_vote(ctx, vote).await,
        Message::CurrentLeader(leader) => on_current_leader(ctx, leader).await,
        Message::RotationCount(count) => on_rotation_count(ctx, count).await,
        Message::Reset => on_reset(ctx).await,
        Message::PrePrepare(block) => on_pre_prepare(ctx, block).await,
        Message::Prepare(block) => on_prepare(ctx, block).await,
        Message::Commit(block) => on_commit(ctx, block).await,
        Message::NewBlock(block) => on_new_block(ctx, block).await,
        Message::UploadPrePrepare(block) => on_upload_pre_prepare(ctx, block).await,
        Message::UploadPrepare(block) => on_upload_prepare(ctx, block).await,
        Message::UploadCommit(block) => on_upload_commit(ctx, block).await,
        Message::UploadNewBlock(block) => on_upload_new_block(ctx, block).await,
        Message::Share(tx) => on_share(ctx, tx).await,
    }
}

async fn on_vote(ctx: &NodeContext, vote: Vote) -> Result<Option<Message>, NodeError> {
    let mut state = ctx.state.lock().await;
    if state.vote_box.insert(vote) {
        debug!(votes = state.vote_box.len(), "vote recorded");
    }
    Ok(None)
}

async fn on_current_leader(
    ctx: &NodeContext,
    leader: PeerInfo,
) -> Result<Option<Message>, NodeError> {
    let mut state = ctx.state.lock().await;
    info!(leader = %leader, "current leader announced");
    state.current_leader = Some(leader);
    Ok(None)
}

async fn on_rotation_count(ctx: &NodeContext, count: u64) -> Result<Option<Message>, NodeError> {
    let mut state = ctx.state.lock().await;
    let adopt = peershare_election::should_adopt_rotation(
        count,
        state.rotation_count,
        state.current_leader.as_ref(),
        ctx.node_id(),
    );
    if adopt {
        debug!(from = state.rotation_count, to = count, "rotation count adopted");
        state.rotation_count = count;
    } else {
        debug!(received = count, local = state.rotation_count, "rotation count ignored");
    }
    Ok(None)
}

async fn on_reset(ctx: &NodeContext) -> Result<Option<Message>, NodeError> {
    let mut state = ctx.state.lock().await;
    info!("leadership state reset");
    state.reset_leadership();
    Ok(None)
}

/// Leader-set member echoing a membership proposal to the full scope.
async fn on_pre_prepare(
    ctx: &NodeContext,
    block: MembershipBlock,
) -> Result<Option<Message>, NodeError> {
    let targets = {
        let state = ctx.state.lock().await;
        if state.current_leader.is_none()
            || !state.is_leader(ctx.node_id())
            || state.is_current_leader(ctx.node_id())
        {
            debug!(index = block.index, "pre-prepare dropped: not a co-leader");
            return Ok(None);
        }
        state
            .leaders
            .iter()
            .filter(|l| l.id != ctx.node_id())
            .cloned()
            .collect::<Vec<_>>()
    };
    broadcast(&targets, &Message::Prepare(block), ctx.config.connect_timeout()).await;
    Ok(None)
}

/// Leader-set member committing to the proposal, towards the current leader.
async fn on_prepare(
    ctx: &NodeContext,
    block: MembershipBlock,
) -> Result<Option<Message>, NodeError> {
    let leader_addr = {
        let mut state = ctx.state.lock().await;
        let Some(leader) = state.current_leader.clone() else {
            debug!(index = block.index, "prepare dropped: no current leader");
            return Ok(None);
        };
        if !state.is_leader(ctx.node_id()) || leader.id == ctx.node_id() {
            debug!(index = block.index, "prepare dropped: not a co-leader");
            return Ok(None);
        }
        // Prepare floods through the scope; commit only once per block.
        if state.last_membership_commit.as_deref() == Some(block.hash.as_str()) {
            return Ok(None);
        }
        state.last_membership_commit = Some(block.hash.clone());
        leader.addr
    };
    if let Err(e) = send_message(
        &leader_addr,
        &Message::Commit(block),
        ctx.config.connect_timeout(),
    )
    .await
    {
        debug!(error = %e, "commit could not reach the leader");
    }
    Ok(None)
}

/// Current leader accumulating commits for its membership proposal.
async fn on_commit(
    ctx: &NodeContext,
    block: MembershipBlock,
) -> Result<Option<Message>, NodeError> {
    let finalized = {
        let mut state = ctx.state.lock().await;
        if !state.is_current_leader(ctx.node_id()) {
            debug!(index = block.index, "commit dropped: not the current leader");
            return Ok(None);
        }
        let Some(mut round) = state.membership_round.take() else {
            debug!(index = block.index, "commit dropped: no open round");
            return Ok(None);
        };
        match round.record_commit(&block.hash) {
            Ok(true) => {
                let finalized = round.finalize()?;
                state.membership_chain.append(finalized.clone())?;
                state.adopt_groups(&finalized);
                info!(
                    index = finalized.index,
                    groups = finalized.grouped_peers.len(),
                    "membership block finalized"
                );
                Some((finalized, state.registry.others(ctx.node_id())))
            }
            Ok(false) => {
                state.membership_round = Some(round);
                None
            }
            Err(e) => {
                debug!(error = %e, "commit rejected");
                state.membership_round = Some(round);
                None
            }
        }
    };
    if let Some((block, targets)) = finalized {
        broadcast(&targets, &Message::NewBlock(block), ctx.config.connect_timeout()).await;
    }
    Ok(None)
}

/// Everyone else appending a finalized membership block.
async fn on_new_block(
    ctx: &NodeContext,
    block: MembershipBlock,
) -> Result<Option<Message>, NodeError> {
    let mut state = ctx.state.lock().await;
    if state.is_current_leader(ctx.node_id()) {
        // We appended at finalization.
        return Ok(None);
    }
    match state.membership_chain.append(block.clone()) {
        Ok(()) => {
            state.adopt_groups(&block);
            info!(index = block.index, "membership block appended");
        }
        Err(e) => warn!(index = block.index, error = %e, "membership block rejected"),
    }
    Ok(None)
}

/// Current leader opening a group round for an uploaded transaction.
async fn on_upload_pre_prepare(
    ctx: &NodeContext,
    block: TransactionBlock,
) -> Result<Option<Message>, NodeError> {
    let action = {
        let mut state = ctx.state.lock().await;
        if !state.is_current_leader(ctx.node_id()) {
            debug!(index = block.index, "upload pre-prepare dropped: not the current leader");
            return Ok(None);
        }
        if block.prev_hash != state.transaction_chain.last().hash {
            warn!(index = block.index, "upload proposal does not link to the chain head");
            return Ok(None);
        }
        let Some(group) = state.group_of_leader(ctx.node_id()).cloned() else {
            debug!("upload pre-prepare dropped: no group headed by this node");
            return Ok(None);
        };
        let scope: BTreeSet<String> = group.iter().map(|p| p.id.clone()).collect();
        let mut round = ConsensusRound::new(block.clone(), ctx.node_id(), scope);
        round.mark_pre_prepared();
        if round.has_quorum() {
            // A leader alone in its group finalizes on the spot.
            let finalized = round.finalize()?;
            state.append_transaction_block(finalized.clone())?;
            info!(index = finalized.index, "transaction block finalized (single-member group)");
            UploadAction::Flood(finalized, state.registry.others(ctx.node_id()))
        } else {
            state.transaction_round = Some(round);
            let members: Vec<PeerInfo> =
                group.into_iter().filter(|p| p.id != ctx.node_id()).collect();
            UploadAction::Relay(members)
        }
    };
    match action {
        UploadAction::Flood(finalized, targets) => {
            broadcast(
                &targets,
                &Message::UploadNewBlock(finalized),
                ctx.config.connect_timeout(),
            )
            .await;
        }
        UploadAction::Relay(members) => {
            broadcast(
                &members,
                &Message::UploadPrepare(block),
                ctx.config.connect_timeout(),
            )
            .await;
        }
    }
    Ok(None)
}

enum UploadAction {
    Flood(TransactionBlock, Vec<PeerInfo>),
    Relay(Vec<PeerInfo>),
}

/// Group member committing to a relayed transaction proposal.
async fn on_upload_prepare(
    ctx: &NodeContext,
    block: TransactionBlock,
) -> Result<Option<Message>, NodeError> {
    let leader_addr = {
        let mut state = ctx.state.lock().await;
        let Some(leader) = state.current_leader.clone() else {
            debug!(index = block.index, "upload prepare dropped: no current leader");
            return Ok(None);
        };
        if leader.id == ctx.node_id() {
            debug!(index = block.index, "upload prepare dropped: we are the leader");
            return Ok(None);
        }
        let in_group = state
            .group_of_leader(&leader.id)
            .is_some_and(|g| g.iter().any(|p| p.id == ctx.node_id()));
        if !in_group {
            debug!(index = block.index, "upload prepare dropped: not in the leader's group");
            return Ok(None);
        }
        if state.last_transaction_commit.as_deref() == Some(block.hash.as_str()) {
            return Ok(None);
        }
        state.last_transaction_commit = Some(block.hash.clone());
        leader.addr
    };
    if let Err(e) = send_message(
        &leader_addr,
        &Message::UploadCommit(block),
        ctx.config.connect_timeout(),
    )
    .await
    {
        debug!(error = %e, "upload commit could not reach the leader");
    }
    Ok(None)
}

/// Current leader accumulating group commits for a transaction proposal.
async fn on_upload_commit(
    ctx: &NodeContext,
    block: TransactionBlock,
) -> Result<Option<Message>, NodeError> {
    let finalized = {
        let mut state = ctx.state.lock().await;
        if !state.is_current_leader(ctx.node_id()) {
            debug!(index = block.index, "upload commit dropped: not the current leader");
            return Ok(None);
        }
        let Some(mut round) = state.transaction_round.take() else {
            debug!(index = block.index, "upload commit dropped: no open round");
            return Ok(None);
        };
        match round.record_commit(&block.hash) {
            Ok(true) => {
                let finalized = round.finalize()?;
                state.append_transaction_block(finalized.clone())?;
                info!(
                    index = finalized.index,
                    file = %finalized.file.name,
                    "transaction block finalized"
                );
                Some((finalized, state.registry.others(ctx.node_id())))
            }
            Ok(false) => {
                state.transaction_round = Some(round);
                None
            }
            Err(e) => {
                debug!(error = %e, "upload commit rejected");
                state.transaction_round = Some(round);
                None
            }
        }
    };
    if let Some((block, targets)) = finalized {
        broadcast(
            &targets,
            &Message::UploadNewBlock(block),
            ctx.config.connect_timeout(),
        )
        .await;
    }
    Ok(None)
}

/// Everyone else appending a finalized transaction block.
async fn on_upload_new_block(
    ctx: &NodeContext,
    block: TransactionBlock,
) -> Result<Option<Message>, NodeError> {
    let mut state = ctx.state.lock().await;
    if state.is_current_leader(ctx.node_id()) {
        return Ok(None);
    }
    match state.append_transaction_block(block.clone()) {
        Ok(true) => info!(index = block.index, file = %block.file.name, "transaction block appended"),
        Ok(false) => debug!(index = block.index, "transaction block already held"),
        Err(e) => warn!(index = block.index, error = %e, "transaction block rejected"),
    }
    Ok(None)
}

/// Receiver of a direct share notification.
async fn on_share(ctx: &NodeContext, tx: FileTransaction) -> Result<Option<Message>, NodeError> {
    let valid = ctx
        .signer
        .verify(
            &tx.signing_bytes(),
            tx.creator_signature.as_deref().unwrap_or(""),
            &tx.sender_public_key,
        )
        .unwrap_or(false);
    if valid {
        info!(file = %tx.file_name, from = %tx.sender.id, "file shared with this node");
    } else {
        warn!(file = %tx.file_name, from = %tx.sender.id, "share with bad signature ignored");
    }
    Ok(None)
}
