//! Slot derivation and the variable-length value layout over word storage.
//!
//! A SEP101 value lives in the storage of the contract that wrote it. Its
//! base slot is `sha256(key)`. The base word holds the byte length of the
//! value, zero meaning absent. The bytes follow in 32-byte chunks starting at
//! `keccak256(base)`, the last chunk right-padded with zeros.
//!
//! [`read_raw_value`] is the raw storage inspection path; SEP101 `get` goes
//! through it, so both always agree.

use crate::{error::SepError, limits::MAX_VALUE_LEN, state::NativeState};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use sha2::{Digest, Sha256};

const WORD: usize = 32;

/// Base slot of a SEP101 key inside the owning contract's storage.
pub fn value_slot(key: &[u8]) -> U256 {
    let digest: [u8; 32] = Sha256::digest(key).into();
    U256::from_be_bytes(digest)
}

fn chunk_slot(base: U256, index: usize) -> U256 {
    let start: U256 = keccak256(B256::from(base)).into();
    start.wrapping_add(U256::from(index))
}

const fn chunk_count(len: usize) -> usize {
    len.div_ceil(WORD)
}

fn stored_len<S: NativeState>(
    state: &mut S,
    namespace: Address,
    base: U256,
) -> Result<usize, SepError> {
    let raw = state.sload(namespace, base)?;
    if raw > U256::from(MAX_VALUE_LEN) {
        return Err(SepError::State(format!(
            "corrupt value length {raw} at slot {base}"
        )));
    }
    Ok(raw.to::<u64>() as usize)
}

/// Reads the value stored at `base` in the storage of `namespace`.
///
/// Returns empty bytes when nothing is stored.
pub fn read_raw_value<S: NativeState>(
    state: &mut S,
    namespace: Address,
    base: U256,
) -> Result<Bytes, SepError> {
    let len = stored_len(state, namespace, base)?;
    if len == 0 {
        return Ok(Bytes::new());
    }

    let mut out = Vec::with_capacity(chunk_count(len) * WORD);
    for index in 0..chunk_count(len) {
        let word = state.sload(namespace, chunk_slot(base, index))?;
        out.extend_from_slice(&word.to_be_bytes::<WORD>());
    }
    out.truncate(len);
    Ok(out.into())
}

/// Writes `value` at `base` in the storage of `namespace`, replacing what was
/// there. An empty value clears every word of the previous value.
pub fn write_raw_value<S: NativeState>(
    state: &mut S,
    namespace: Address,
    base: U256,
    value: &[u8],
) -> Result<(), SepError> {
    let previous_chunks = chunk_count(stored_len(state, namespace, base)?);

    for (index, chunk) in value.chunks(WORD).enumerate() {
        let mut word = [0u8; WORD];
        word[..chunk.len()].copy_from_slice(chunk);
        state.sstore(
            namespace,
            chunk_slot(base, index),
            U256::from_be_bytes(word),
        )?;
    }
    for index in chunk_count(value.len())..previous_chunks {
        state.sstore(namespace, chunk_slot(base, index), U256::ZERO)?;
    }

    state.sstore(namespace, base, U256::from(value.len()))
}
