//! The two ends of a connection.
//!
//! A session remembers the last version of every unit it exchanged. That
//! version is the baseline the next send of the same unit is diffed against,
//! so both ends must agree on it: the sender records a unit only once all of
//! its operations were produced, and a receiver that fails partway drops
//! every baseline and waits for a full resend.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tessel_tree::{NodeId, Tree};
use tessel_types::TypeStore;

use crate::types::{ReceivedTypes, SentTypes};
use crate::{
    Batch, BatchSink, BatchSource, CodecRegistry, Desync, Op, ReceiveQueue, SendQueue, SyncConfig,
    SyncError, SyncResult,
};

/// What became of one unit handed to [`SendSession::send_all`].
#[derive(Debug)]
pub enum UnitOutcome {
    Sent { id: NodeId, batches: usize },
    /// The unit could not be encoded and the receiver keeps its previous version.
    Unchanged { id: NodeId, error: SyncError },
}

impl UnitOutcome {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Sent { id, .. } | Self::Unchanged { id, .. } => *id,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// The sending end: owns what it believes the receiver holds.
pub struct SendSession {
    registry: Arc<CodecRegistry>,
    config: SyncConfig,
    remote: FxHashMap<NodeId, Tree>,
    types: SentTypes,
}

impl SendSession {
    pub fn new(registry: Arc<CodecRegistry>, config: SyncConfig) -> Self {
        Self { registry, config, remote: FxHashMap::default(), types: SentTypes::default() }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The version of unit `id` the receiver is believed to hold.
    pub fn baseline(&self, id: NodeId) -> Option<&Tree> {
        self.remote.get(&id)
    }

    /// Encodes `root` as a delta against the last version of it this session
    /// sent, or in full if there is none.
    ///
    /// On error nothing is recorded: the baseline and type numbering are
    /// what they were before the call.
    pub fn send_unit(&mut self, root: &Tree, types: &TypeStore) -> SyncResult<Vec<Batch>> {
        let id = root.id();
        let mark = self.types.mark();
        let before = self.remote.get(&id);
        let mut q = SendQueue::new(&self.registry, types, &mut self.types, self.config.trace);
        let encoded = encode_unit(&mut q, root, before);
        let (ops, sites) = q.finish();
        if let Err(err) = encoded {
            self.types.rollback(mark);
            return Err(err);
        }

        let delta = before.is_some();
        let op_count = ops.len();
        let batches = Batch::chunk(ops, sites, self.config.batch_size);
        tracing::debug!(root = %id, ops = op_count, batches = batches.len(), delta, "sent unit");
        self.remote.insert(id, Arc::clone(root));
        self.types.commit();
        Ok(batches)
    }

    /// Sends each unit into `sink`.
    ///
    /// A unit containing a node or marker kind without a codec is skipped and
    /// reported as unchanged; the other units still go out. Any other error
    /// stops the run.
    pub fn send_all(
        &mut self,
        units: &[Tree],
        types: &TypeStore,
        sink: &mut dyn BatchSink,
    ) -> SyncResult<Vec<UnitOutcome>> {
        let mut outcomes = Vec::with_capacity(units.len());
        for root in units {
            let id = root.id();
            match self.send_unit(root, types) {
                Ok(batches) => {
                    let count = batches.len();
                    for batch in batches {
                        sink.push_batch(batch);
                    }
                    outcomes.push(UnitOutcome::Sent { id, batches: count });
                }
                Err(error) if !error.is_session_fatal() => {
                    tracing::warn!(root = %id, %error, "unit left unchanged");
                    outcomes.push(UnitOutcome::Unchanged { id, error });
                }
                Err(error) => return Err(error),
            }
        }
        Ok(outcomes)
    }

    /// Forgets every baseline, so that the next send of each unit is full.
    pub fn reset(&mut self) {
        tracing::info!(units = self.remote.len(), "send session reset");
        self.remote.clear();
        self.types.clear();
    }
}

fn encode_unit(q: &mut SendQueue<'_>, root: &Tree, before: Option<&Tree>) -> SyncResult<()> {
    q.send_id(root.id());
    q.get_and_send_tree(root, before)?;
    q.push(Op::EndUnit);
    Ok(())
}

/// The receiving end: owns the local copy of every unit it received.
pub struct ReceiveSession {
    registry: Arc<CodecRegistry>,
    local: FxHashMap<NodeId, Tree>,
    types: ReceivedTypes,
    lost: bool,
}

impl ReceiveSession {
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self { registry, local: FxHashMap::default(), types: ReceivedTypes::default(), lost: false }
    }

    pub fn baseline(&self, id: NodeId) -> Option<&Tree> {
        self.local.get(&id)
    }

    /// Whether the last unit failed and the sender must reset and send everything again.
    pub fn needs_full_resend(&self) -> bool {
        self.lost
    }

    /// Reads one unit from `source` and applies it to the local copy.
    ///
    /// Unchanged subtrees of the result are the very objects of the previous
    /// version. Any error discards the whole session state along with the
    /// operations left in the failed unit.
    pub fn receive_unit(
        &mut self,
        source: &mut dyn BatchSource,
        types: &mut TypeStore,
    ) -> SyncResult<Tree> {
        match self.decode_unit(source, types) {
            Ok(root) => {
                self.lost = false;
                tracing::debug!(root = %root.id(), "received unit");
                self.local.insert(root.id(), Arc::clone(&root));
                Ok(root)
            }
            Err(error) => {
                tracing::warn!(%error, "synchronization lost, retrying with full resend");
                self.discard();
                Err(error)
            }
        }
    }

    fn decode_unit(&mut self, source: &mut dyn BatchSource, types: &mut TypeStore) -> SyncResult<Tree> {
        let mut q = ReceiveQueue::new(&self.registry, types, &mut self.types, source);
        let decoded = read_unit(&mut q, &self.local);
        if decoded.is_err() {
            // The rest of the broken unit must not be read as the start of the resend.
            let skipped = q.skip_unit();
            tracing::debug!(skipped, "skipped the rest of a broken unit");
        }
        decoded
    }

    fn discard(&mut self) {
        self.local.clear();
        self.types.clear();
        self.lost = true;
    }
}

fn read_unit(q: &mut ReceiveQueue<'_>, local: &FxHashMap<NodeId, Tree>) -> SyncResult<Tree> {
    let id = q.decode_id()?;
    let root = q.receive_tree(local.get(&id))?;
    if root.id() != id {
        return Err(q.desync(Desync::RootMismatch {
            expected: id.to_string().into(),
            found: root.id().to_string().into(),
        }));
    }
    q.end_unit()?;
    Ok(root)
}
