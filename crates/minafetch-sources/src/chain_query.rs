//! Best-chain snapshot from a live node's GraphQL endpoint.
//!
//! One round trip fetches the best chain's protocol state, the genesis
//! block's snarked ledger hash and, per tracked account, a merkle inclusion
//! path. The node only exposes the genesis ledger hash under `genesisBlock`,
//! so every snapshot is reconciled before it is handed out.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use minafetch_core::query::is_valid_alias;
use minafetch_core::{
    Argument, FetchError, GraphQlRequest, HttpFetch, QueryDocument, RetryConfig, RetryExecutor,
    Selection,
};

/// Public key of an account whose merkle inclusion data is requested.
pub type TrackedAccountKey = String;

/// `bestChain(maxLength: ..)` bound; large enough to mean "everything".
pub const BEST_CHAIN_MAX_LENGTH: u64 = 1_000_000;

pub const OPERATION_NAME: &str = "Query";

// ─── Snapshot types ───────────────────────────────────────────────────────

/// Reconciled result of a best-chain query.
///
/// Tracked accounts are flattened next to `bestChain` and `genesisBlock`,
/// keyed by their public key, exactly as the node returns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestChainSnapshot {
    #[serde(deserialize_with = "one_or_many")]
    pub best_chain: Vec<ChainBlock>,
    pub genesis_block: GenesisBlock,
    #[serde(flatten)]
    pub accounts: BTreeMap<String, Option<AccountInclusion>>,
}

impl BestChainSnapshot {
    /// Copy the genesis snarked ledger hash into every block's
    /// `blockchainState.genesisLedgerHash`.
    pub fn reconcile(&mut self) {
        let hash = &self.genesis_block.protocol_state.blockchain_state.snarked_ledger_hash;
        for block in &mut self.best_chain {
            block.protocol_state.blockchain_state.genesis_ledger_hash = Some(hash.clone());
        }
    }

    /// The genesis ledger's snarked hash.
    pub fn genesis_ledger_hash(&self) -> &str {
        &self.genesis_block.protocol_state.blockchain_state.snarked_ledger_hash
    }

    /// The most recent block of the best chain.
    pub fn tip(&self) -> Option<&ChainBlock> {
        self.best_chain.last()
    }

    /// Inclusion data for a tracked account, if the node knew the account.
    pub fn account(&self, key: &str) -> Option<&AccountInclusion> {
        self.accounts.get(key).and_then(Option::as_ref)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ChainBlock>),
    One(Box<ChainBlock>),
}

/// `bestChain` is a list on current nodes; a bare object is accepted too.
fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ChainBlock>, D::Error> {
    match Option::<OneOrMany>::deserialize(d)? {
        Some(OneOrMany::Many(blocks)) => Ok(blocks),
        Some(OneOrMany::One(block)) => Ok(vec![*block]),
        None => Err(D::Error::custom("`bestChain` is null (node not synced?)")),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainBlock {
    pub protocol_state: ProtocolState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolState {
    pub previous_state_hash: String,
    pub consensus_state: ConsensusState,
    pub blockchain_state: BlockchainState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusState {
    pub block_creator: String,
    pub block_height: String,
    pub block_stake_winner: String,
    pub epoch: String,
    pub blockchain_length: String,
    // Field name as spelled by the node's schema.
    #[serde(rename = "coinbaseReceiever", default)]
    pub coinbase_receiver: Option<String>,
    pub epoch_count: String,
    pub has_ancestor_in_same_checkpoint_window: bool,
    pub last_vrf_output: String,
    pub min_window_density: String,
    pub slot: String,
    pub slot_since_genesis: String,
    pub supercharged_coinbase: bool,
    pub total_currency: String,
    pub next_epoch_data: EpochData,
    pub staking_epoch_data: EpochData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochData {
    pub epoch_length: String,
    pub lock_checkpoint: String,
    pub seed: String,
    pub start_checkpoint: String,
    pub ledger: EpochLedger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochLedger {
    pub hash: String,
    pub total_currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainState {
    pub body_reference: String,
    pub date: String,
    pub snarked_ledger_hash: String,
    pub staged_ledger_aux_hash: String,
    pub staged_ledger_hash: String,
    pub staged_ledger_pending_coinbase_aux: String,
    pub staged_ledger_pending_coinbase_hash: String,
    #[serde(default)]
    pub staged_ledger_proof_emitted: Option<bool>,
    pub utc_date: String,
    /// Not served under `bestChain`; filled in by [`BestChainSnapshot::reconcile`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis_ledger_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisBlock {
    pub protocol_state: GenesisProtocolState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisProtocolState {
    pub blockchain_state: GenesisBlockchainState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisBlockchainState {
    pub snarked_ledger_hash: String,
}

/// Merkle inclusion data for one tracked account.
///
/// Upstream account hashing is unreliable for some fields; `leaf_hash` is
/// passed through unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInclusion {
    /// `None` when the node returns a null path.
    #[serde(default)]
    pub merkle_path: Option<Vec<MerklePathStep>>,
    #[serde(default)]
    pub leaf_hash: Option<String>,
}

impl AccountInclusion {
    /// Path steps from leaf to root; empty when the node returned none.
    pub fn path(&self) -> &[MerklePathStep] {
        self.merkle_path.as_deref().unwrap_or_default()
    }
}

/// One level of a merkle path; exactly one side is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerklePathStep {
    #[serde(default)]
    pub left: Option<String>,
    #[serde(default)]
    pub right: Option<String>,
}

// ─── Query construction ───────────────────────────────────────────────────

fn epoch_data(name: &str) -> Selection {
    Selection::field(name)
        .select(Selection::fields(&[
            "epochLength",
            "lockCheckpoint",
            "seed",
            "startCheckpoint",
        ]))
        .select([Selection::field("ledger").select(Selection::fields(&["hash", "totalCurrency"]))])
}

fn best_chain_selection() -> Selection {
    let consensus_state = Selection::field("consensusState")
        .select(Selection::fields(&[
            "blockCreator",
            "blockHeight",
            "blockStakeWinner",
            "epoch",
            "blockchainLength",
            "coinbaseReceiever",
            "epochCount",
            "hasAncestorInSameCheckpointWindow",
            "lastVrfOutput",
            "minWindowDensity",
            "slot",
            "slotSinceGenesis",
            "superchargedCoinbase",
            "totalCurrency",
        ]))
        .select([epoch_data("nextEpochData"), epoch_data("stakingEpochData")]);

    let blockchain_state = Selection::field("blockchainState").select(Selection::fields(&[
        "bodyReference",
        "date",
        "snarkedLedgerHash",
        "stagedLedgerAuxHash",
        "stagedLedgerHash",
        "stagedLedgerPendingCoinbaseAux",
        "stagedLedgerPendingCoinbaseHash",
        "stagedLedgerProofEmitted",
        "utcDate",
    ]));

    Selection::field("bestChain")
        .arg("maxLength", Argument::Int(BEST_CHAIN_MAX_LENGTH))
        .select([Selection::field("protocolState")
            .select([Selection::field("previousStateHash"), consensus_state, blockchain_state])])
}

fn genesis_selection() -> Selection {
    Selection::field("genesisBlock").select([Selection::field("protocolState").select([
        Selection::field("blockchainState").select([Selection::field("snarkedLedgerHash")]),
    ])])
}

fn account_selection(key: &str) -> Selection {
    Selection::field("account")
        .alias(key)
        .arg("publicKey", Argument::String(key.to_string()))
        .select([
            Selection::field("merklePath").select(Selection::fields(&["left", "right"])),
            Selection::field("leafHash"),
        ])
}

/// Build the best-chain query, with one aliased `account` selection per
/// tracked key.
///
/// Keys double as response aliases, so each must be a GraphQL name; others
/// are rejected with [`FetchError::InvalidAccountKey`].
pub fn best_chain_query<S: AsRef<str>>(accounts: &[S]) -> Result<QueryDocument, FetchError> {
    let mut doc = QueryDocument::new(OPERATION_NAME);
    doc.push(best_chain_selection());
    doc.push(genesis_selection());
    for key in accounts {
        let key = key.as_ref();
        if !is_valid_alias(key) || key == "bestChain" || key == "genesisBlock" {
            return Err(FetchError::InvalidAccountKey(key.to_string()));
        }
        doc.push(account_selection(key));
    }
    Ok(doc)
}

// ─── Client ───────────────────────────────────────────────────────────────

/// Client for a live node's GraphQL endpoint.
pub struct ChainQueryClient {
    fetcher: Arc<dyn HttpFetch>,
    retry: RetryExecutor,
}

impl ChainQueryClient {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            retry: RetryExecutor::default(),
        }
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = RetryExecutor::new(config);
        self
    }

    /// Fetch and reconcile the best-chain snapshot from `endpoint`.
    pub async fn fetch_best_chain<S: AsRef<str>>(
        &self,
        endpoint: &str,
        accounts: &[S],
    ) -> Result<BestChainSnapshot, FetchError> {
        let request = best_chain_query(accounts)?.to_request();
        tracing::debug!(%endpoint, accounts = accounts.len(), "fetching best chain");
        self.retry
            .execute(|| self.fetch_once(endpoint, &request))
            .await
    }

    /// Same as [`fetch_best_chain`](Self::fetch_best_chain), serialised to a
    /// JSON string.
    pub async fn fetch_best_chain_json_string<S: AsRef<str>>(
        &self,
        endpoint: &str,
        accounts: &[S],
    ) -> Result<String, FetchError> {
        let snapshot = self.fetch_best_chain(endpoint, accounts).await?;
        Ok(serde_json::to_string(&snapshot)?)
    }

    async fn fetch_once(
        &self,
        endpoint: &str,
        request: &GraphQlRequest,
    ) -> Result<BestChainSnapshot, FetchError> {
        let data = self.fetcher.graphql(endpoint, request).await?;
        let mut snapshot: BestChainSnapshot = serde_json::from_value(data)?;
        snapshot.reconcile();
        Ok(snapshot)
    }
}
