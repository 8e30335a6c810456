//! User-initiated file flows: upload and share.
//!
//! Both flows stage the crypto work through the collaborator traits, build a
//! signed transaction block and hand it to the current leader for group
//! consensus. A collaborator failure aborts only the action that triggered
//! it; nothing here touches consensus state directly.

use crate::context::NodeContext;
use crate::dispatcher;
use crate::error::NodeError;
use peershare_ledger::TransactionBlock;
use peershare_messages::Message;
use peershare_network::send_message;
use peershare_types::{FileRecord, FileTransaction, ParticipantRecord};
use std::path::Path;
use tracing::info;

/// Encrypt, store and propose a file upload.
///
/// Returns the proposed block's index.
pub async fn upload(ctx: &NodeContext, path: &Path) -> Result<u64, NodeError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| NodeError::Config(format!("not a file path: {}", path.display())))?;

    let key_pair = ctx.key_store.load_key_pair(ctx.node_id())?;
    let file_key = ctx.encryptor.generate_file_key()?;

    tokio::fs::create_dir_all(&ctx.config.files_dir).await?;
    let staged = ctx.config.files_dir.join(format!("{file_name}.enc"));
    ctx.encryptor.encrypt_file(path, &staged, &file_key)?;

    let ciphertext = tokio::fs::read(&staged).await?;
    let content_id = ctx.blob_store.put(&ciphertext)?;
    let sealed_key = ctx.encryptor.seal_key(&file_key, &key_pair.public_key)?;

    let mut tx = FileTransaction::upload(
        ctx.config.self_peer(),
        file_name.clone(),
        content_id.clone(),
        key_pair.public_key.clone(),
        sealed_key.clone(),
    );
    tx.creator_signature = Some(ctx.signer.sign(&tx.signing_bytes(), &key_pair.private_key)?);

    let file = FileRecord {
        name: file_name.clone(),
        content_id,
        encrypted_key: sealed_key.clone(),
    };
    let participants = vec![ParticipantRecord {
        public_key: key_pair.public_key,
        encrypted_key: sealed_key,
    }];

    let block = build_block(ctx, file, participants, tx).await?;
    let index = block.index;
    info!(file = %file_name, index, "upload proposed");
    submit_to_leader(ctx, block).await?;
    Ok(index)
}

/// Re-seal an uploaded file's key to another peer and propose the share.
///
/// `index` names the transaction block the file was uploaded in.
pub async fn share(ctx: &NodeContext, index: u64, receiver_id: &str) -> Result<u64, NodeError> {
    let (source, receiver) = {
        let state = ctx.state.lock().await;
        let source = state
            .transaction_chain
            .get(index)
            .cloned()
            .ok_or(NodeError::BlockNotFound { index })?;
        let receiver = state
            .registry
            .get(receiver_id)
            .cloned()
            .ok_or_else(|| NodeError::PeerNotFound {
                id: receiver_id.to_string(),
            })?;
        (source, receiver)
    };

    let own = ctx.key_store.load_key_pair(ctx.node_id())?;
    let receiver_key = ctx.key_store.load_key_pair(receiver_id)?;

    let file_key = ctx
        .encryptor
        .open_key(&source.file.encrypted_key, &own.private_key)?;
    let resealed = ctx.encryptor.seal_key(&file_key, &receiver_key.public_key)?;

    let mut tx = FileTransaction::share(
        ctx.config.self_peer(),
        receiver.clone(),
        source.file.name.clone(),
        source.file.content_id.clone(),
        own.public_key.clone(),
        receiver_key.public_key.clone(),
        resealed.clone(),
    );
    tx.creator_signature = Some(ctx.signer.sign(&tx.signing_bytes(), &own.private_key)?);

    let file = source.file.clone();
    let mut participants = source.participants.clone();
    participants.push(ParticipantRecord {
        public_key: receiver_key.public_key,
        encrypted_key: resealed,
    });

    let block = build_block(ctx, file, participants, tx.clone()).await?;
    let new_index = block.index;
    info!(file = %source.file.name, to = %receiver, index = new_index, "share proposed");
    submit_to_leader(ctx, block).await?;

    // Tell the receiver directly, outside consensus.
    if let Err(e) = send_message(
        &receiver.addr,
        &Message::Share(tx),
        ctx.config.connect_timeout(),
    )
    .await
    {
        info!(to = %receiver, error = %e, "receiver unreachable for direct share notice");
    }
    Ok(new_index)
}

async fn build_block(
    ctx: &NodeContext,
    file: FileRecord,
    participants: Vec<ParticipantRecord>,
    tx: FileTransaction,
) -> Result<TransactionBlock, NodeError> {
    let state = ctx.state.lock().await;
    Ok(TransactionBlock::new(
        state.transaction_chain.next_index(),
        ctx.clock.now(),
        file,
        participants,
        tx,
        state.transaction_chain.last().hash.clone(),
    ))
}

/// Hand the proposal to the current leader; a leader node handles it locally.
async fn submit_to_leader(ctx: &NodeContext, block: TransactionBlock) -> Result<(), NodeError> {
    let leader = {
        let state = ctx.state.lock().await;
        state.current_leader.clone().ok_or(NodeError::NoCurrentLeader)?
    };
    if leader.id == ctx.node_id() {
        dispatcher::dispatch(ctx, Message::UploadPrePrepare(block)).await?;
    } else {
        send_message(
            &leader.addr,
            &Message::UploadPrePrepare(block),
            ctx.config.connect_timeout(),
        )
        .await?;
    }
    Ok(())
}
