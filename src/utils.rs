// Solvey Survey Program - Utility Functions

/// Sum a prize list, failing on overflow.
pub fn checked_sum(amounts: &[u64]) -> Option<u64> {
    amounts
        .iter()
        .try_fold(0u64, |total, &amount| total.checked_add(amount))
}

/// Deterministic winner slot: the seed offset by the prize index, wrapped
/// onto the participant list. Callers must ensure `participant_count > 0`.
pub fn winner_index(seed: u32, slot: usize, participant_count: usize) -> usize {
    ((seed as u64 + slot as u64) % participant_count as u64) as usize
}

/// Lamports the survey can spend: everything above the rent-exempt floor
/// that keeps the account alive.
pub fn custodied_balance(lamports: u64, rent_floor: u64) -> u64 {
    lamports.saturating_sub(rent_floor)
}
