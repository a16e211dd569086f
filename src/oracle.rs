// Solvey Survey Program - Oracle protocol helpers
//
// The query side is fire-and-forget: a structured log line carrying the
// request id, which the designated oracle indexes off-chain. The answer
// comes back as an `OracleCallback` instruction signed by the oracle
// authority. If no answer arrives within the wait period, the seed is
// derived from recent block hashes instead.
use solana_program::{
    account_info::AccountInfo, hash::Hash, msg, program_error::ProgramError, sysvar::Sysvar,
};

/// Query text emitted with every seed request.
pub const ORACLE_QUERY: &str = "random number between 0 and 9999";

/// How many trailing block hashes feed the fallback seed.
pub const FALLBACK_HASH_COUNT: usize = 3;

/// The fallback seed is reduced into `0..FALLBACK_SEED_RANGE`.
pub const FALLBACK_SEED_RANGE: u32 = 10_000;

/// Emit the oracle query. The oracle answers with an `OracleCallback`
/// carrying the same request id.
pub fn submit_query(request_id: u64) {
    msg!("oracle query: id={} q={}", request_id, ORACLE_QUERY);
}

/// Parse an oracle result as a decimal numeral. Non-digit bytes are
/// ignored; digits accumulate into the 32-bit seed with wrapping.
pub fn parse_seed(result: &str) -> u32 {
    let mut seed: u32 = 0;
    for byte in result.bytes() {
        if byte.is_ascii_digit() {
            seed = seed.wrapping_mul(10).wrapping_add(u32::from(byte - b'0'));
        }
    }
    seed
}

/// XOR the leading 32 bits of each hash and reduce into the fallback range.
pub fn reduce_hashes(hashes: &[Hash]) -> u32 {
    let mut acc: u32 = 0;
    for hash in hashes {
        let bytes = hash.to_bytes();
        acc ^= u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    acc % FALLBACK_SEED_RANGE
}

/// Derive the fallback seed from the three most recent block hashes. The
/// wait period is sized so that biasing block production across it is not
/// economically rational.
#[allow(deprecated)]
pub fn fallback_seed(recent_blockhashes_info: &AccountInfo) -> Result<u32, ProgramError> {
    use solana_program::sysvar::recent_blockhashes::RecentBlockhashes;

    let recent = RecentBlockhashes::from_account_info(recent_blockhashes_info)?;
    let hashes: Vec<Hash> = recent
        .iter()
        .take(FALLBACK_HASH_COUNT)
        .map(|entry| entry.blockhash)
        .collect();
    Ok(reduce_hashes(&hashes))
}
