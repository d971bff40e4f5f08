// Copyright (c) 2022-2023 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://github.com/mintlayer/mintlayer-core/blob/master/LICENSE
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stages of the accept pipeline that do not need the mempool store:
//! structural checks, input resolution over an overlay view, sigop counting
//! and the two-pass script verification.

use std::collections::BTreeSet;

use common::{
    chain::{config::MAX_MONEY, ChainConfig, OutPoint, ScriptFlags, Transaction},
    primitives::{Amount, BlockHeight, Idable},
};
use utils::ensure;
use utxo::{Utxo, UtxosCache, UtxosView};

use super::store::MempoolStore;
use crate::{
    chain_view::ChainView,
    error::{Error, MempoolPolicyError, ScriptError, TxValidationError},
    pool::entry::TxEntry,
};

/// The external script interpreter, consumed as a pure function. Must be
/// re-entrant; the accept pipeline may call it from outside the mempool lock
/// and for several inputs in any order.
pub trait ScriptVerifier: Send + Sync {
    fn verify(
        &self,
        tx: &Transaction,
        input_index: usize,
        utxo: &Utxo,
        flags: ScriptFlags,
    ) -> Result<(), ScriptError>;
}

/// Accepts every script; for tests and for setups where scripts are verified
/// elsewhere.
#[derive(Debug, Clone, Default)]
pub struct NoopScriptVerifier;

impl ScriptVerifier for NoopScriptVerifier {
    fn verify(
        &self,
        _tx: &Transaction,
        _input_index: usize,
        _utxo: &Utxo,
        _flags: ScriptFlags,
    ) -> Result<(), ScriptError> {
        Ok(())
    }
}

/// Read-through view over the chain state plus outputs of pooled
/// transactions; the parent layer for each validation overlay.
pub(crate) struct MempoolUtxoView<'a, C> {
    chain: &'a C,
    store: &'a MempoolStore,
}

impl<'a, C: ChainView> MempoolUtxoView<'a, C> {
    pub fn new(chain: &'a C, store: &'a MempoolStore) -> Self {
        Self { chain, store }
    }
}

impl<C: ChainView> UtxosView for MempoolUtxoView<'_, C> {
    fn utxo(&self, outpoint: &OutPoint) -> Option<Utxo> {
        self.store.unconfirmed_utxo(outpoint).or_else(|| self.chain.utxo(outpoint))
    }

    fn has_utxo(&self, outpoint: &OutPoint) -> bool {
        self.utxo(outpoint).is_some()
    }
}

/// Cheap structural checks that need no chain or pool state beyond the
/// evaluation height
pub(crate) fn check_structure(
    chain_config: &ChainConfig,
    entry: &TxEntry,
    evaluation_height: BlockHeight,
) -> Result<(), TxValidationError> {
    let tx = entry.transaction();

    ensure!(!tx.inputs().is_empty(), TxValidationError::NoInputs);
    ensure!(!tx.outputs().is_empty(), TxValidationError::NoOutputs);
    ensure!(
        entry.size() <= chain_config.max_standard_tx_size(),
        TxValidationError::ExceedsMaxStandardTxSize {
            size: entry.size(),
            max: chain_config.max_standard_tx_size(),
        }
    );
    ensure!(!tx.is_coinbase(), TxValidationError::CoinbaseNotAllowed);

    let mut total_out = Amount::ZERO;
    for output in tx.outputs() {
        let value = output.value();
        ensure!(
            !value.is_negative() && value <= MAX_MONEY,
            TxValidationError::OutputValueOutOfRange
        );
        total_out = (total_out + value).ok_or(TxValidationError::OutputValuesOverflow)?;
        ensure!(total_out <= MAX_MONEY, TxValidationError::OutputValueOutOfRange);
    }

    let mut seen = BTreeSet::new();
    ensure!(
        tx.inputs().iter().all(|input| seen.insert(*input.outpoint())),
        TxValidationError::DuplicateInputs
    );

    if chain_config.enforce_canonical_input_ordering(evaluation_height) {
        ensure!(
            tx.inputs().windows(2).all(|pair| pair[0].outpoint() <= pair[1].outpoint()),
            TxValidationError::NonCanonicalInputOrdering
        );
    }

    Ok(())
}

pub(crate) struct ResolvedInputs {
    pub spent_utxos: Vec<Utxo>,
    pub fee: Amount,
}

/// Resolve and tentatively spend every input in a fresh overlay stacked on
/// `parent`. Any unresolvable outpoint reports `MissingInputs`, routing the
/// candidate to the orphan pool.
pub(crate) fn resolve_inputs<P: UtxosView>(
    parent: P,
    tx: &Transaction,
    tip_height: BlockHeight,
    coinbase_maturity: i64,
) -> Result<ResolvedInputs, TxValidationError> {
    let mut overlay = UtxosCache::new(parent);
    let mut spent_utxos = Vec::with_capacity(tx.inputs().len());

    for (input_index, input) in tx.inputs().iter().enumerate() {
        let utxo = overlay.spend_utxo(input.outpoint()).map_err(|_| {
            TxValidationError::MissingInputs {
                tx_id: tx.get_id(),
                outpoint: *input.outpoint(),
            }
        })?;

        if utxo.is_coinbase() {
            let utxo_height =
                utxo.source().blockchain_height().expect("coinbase utxos come from blocks");
            ensure!(
                tip_height.distance_from(utxo_height) >= coinbase_maturity,
                TxValidationError::PrematureCoinbaseSpend { input_index }
            );
        }

        spent_utxos.push(utxo);
    }

    let sum_inputs = spent_utxos
        .iter()
        .map(|utxo| utxo.output().value())
        .sum::<Option<Amount>>()
        .ok_or(TxValidationError::InputValuesOverflow)?;
    let sum_outputs =
        tx.total_output_value().ok_or(TxValidationError::OutputValuesOverflow)?;
    let fee = (sum_inputs - sum_outputs).ok_or(TxValidationError::InputsBelowOutputs)?;
    ensure!(!fee.is_negative(), TxValidationError::InputsBelowOutputs);

    Ok(ResolvedInputs { spent_utxos, fee })
}

/// Conservative signature-operation count over all scripts the transaction
/// brings into play.
pub(crate) fn count_sigops(tx: &Transaction, spent_utxos: &[Utxo], accurate: bool) -> u64 {
    let input_sigops: u64 =
        tx.inputs().iter().map(|input| input.script_sig().count_sigops(accurate)).sum();
    let output_sigops: u64 =
        tx.outputs().iter().map(|output| output.script_pubkey().count_sigops(accurate)).sum();
    let prevout_sigops: u64 = spent_utxos
        .iter()
        .map(|utxo| utxo.output().script_pubkey().count_sigops(accurate))
        .sum();
    input_sigops + output_sigops + prevout_sigops
}

/// Verify every input, standard flags first. A failure is retried under the
/// mandatory set to distinguish a policy rejection from a consensus-invalid
/// transaction.
pub(crate) fn verify_scripts<S: ScriptVerifier + ?Sized>(
    verifier: &S,
    chain_config: &ChainConfig,
    tx: &Transaction,
    spent_utxos: &[Utxo],
    evaluation_height: BlockHeight,
) -> Result<(), Error> {
    let standard_flags = chain_config.standard_script_flags(evaluation_height);
    let mandatory_flags = chain_config.mandatory_script_flags(evaluation_height);

    for (input_index, utxo) in spent_utxos.iter().enumerate() {
        if let Err(error) = verifier.verify(tx, input_index, utxo, standard_flags) {
            return match verifier.verify(tx, input_index, utxo, mandatory_flags) {
                Ok(()) => Err(MempoolPolicyError::ScriptPolicyFailure { input_index, error }.into()),
                Err(error) => {
                    Err(TxValidationError::ScriptConsensusFailure { input_index, error }.into())
                }
            };
        }
    }
    Ok(())
}
