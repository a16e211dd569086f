// Solvey Survey Program - State
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::error::SurveyError;
use crate::utils;

/// Shortest run a survey may be started with, in seconds (exclusive bound).
pub const MIN_ACTIVE_DURATION: i64 = 60;
/// Longest run a survey may be started with, in seconds (exclusive bound).
pub const MAX_ACTIVE_DURATION: i64 = 2_592_000;
/// Winners must get more than this long to claim, in seconds.
pub const MIN_PAYOUT_DURATION: i64 = 86_400;
/// How long the external oracle gets to answer before the fallback seed
/// becomes available, in seconds.
pub const ORACLE_WAIT_PERIOD: i64 = 1_800;

/// Fixed size of the survey account, allocated once at bootstrap. The
/// account cannot grow afterwards, so this bounds answers and participants.
pub const SURVEY_ACCOUNT_LEN: usize = 8_192;

/// Chronological phases of a survey run.
///
/// The declaration order is load-bearing: `Ord` follows it and every
/// transition moves to a strictly higher phase.
#[derive(
    BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord,
)]
pub enum ContractState {
    /// Account exists, survey not started
    Created,
    /// Accepting answers until `survey_end`
    Active,
    /// Past `survey_end`, waiting for randomness and the draw
    Expired,
    /// Winners drawn, claims open until `collection_end`
    Payout,
    /// Claim window closed, residual funds may be returned
    Finished,
}

/// One-shot randomness request state.
///
/// Unrequested while `queried_at` is `None`, pending once queried, resolved
/// once `drawn` is set. Once drawn the seed is meant to be final.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RandomnessRequest {
    /// The 32-bit seed driving winner selection
    pub seed: u32,
    /// Whether a seed has been resolved
    pub drawn: bool,
    /// When the oracle query was emitted
    pub queried_at: Option<UnixTimestamp>,
    /// Correlates the emitted query with its callback
    pub request_id: u64,
}

impl RandomnessRequest {
    pub fn is_pending(&self) -> bool {
        self.queried_at.is_some() && !self.drawn
    }

    pub fn is_resolved(&self) -> bool {
        self.drawn
    }

    pub fn resolve(&mut self, seed: u32) {
        self.seed = seed;
        self.drawn = true;
    }
}

/// What the caller of `Survey::request_seed` must do next.
#[derive(Debug, PartialEq, Eq)]
pub enum SeedDisposition {
    /// A fresh query was recorded; emit it to the oracle
    Query { request_id: u64 },
    /// The oracle window elapsed; resolve with the fallback seed
    Fallback,
}

/// A prize slot assignment produced by the raffle, one per prize.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Winner {
    pub identity: Pubkey,
    pub prize: u64,
}

/// Per-identity claim bookkeeping. `claimable` drops to zero when the
/// winner claims; `claimed_to` then records the destination of record.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayoutRecord {
    pub identity: Pubkey,
    pub claimable: u64,
    pub claimed_to: Option<Pubkey>,
}

/// Singleton survey state, borsh-serialized into the survey account.
#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct Survey {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Current phase
    pub state: ContractState,
    /// Operator of the survey; receives consumed access tokens and residual funds
    pub owner: Pubkey,
    /// The only identity allowed to invoke the oracle callback
    pub oracle_authority: Pubkey,
    /// Mint of the access token gating participation
    pub access_mint: Pubkey,
    /// When the answer window closes; written once by `start`
    pub survey_end: UnixTimestamp,
    /// Length of the claim window, fixed by `start`
    pub collection_duration: i64,
    /// When the claim window closes; written once by `run_raffle`
    pub collection_end: UnixTimestamp,
    /// Ordered prize amounts, one raffle slot each
    pub prize_list: Vec<u64>,
    /// Append-only answer hashes; duplicates allowed
    pub answers: Vec<u32>,
    /// Ordered participant identities, one entry per paid answer
    pub participants: Vec<Pubkey>,
    /// The single randomness request for this run
    pub randomness: RandomnessRequest,
    /// Raffle output, one entry per prize slot
    pub winners: Vec<Winner>,
    /// Claim ledger, one entry per distinct winning identity
    pub payouts: Vec<PayoutRecord>,
}

impl Sealed for Survey {}

impl IsInitialized for Survey {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Survey {
    /// Create a fresh survey in the `Created` phase.
    pub fn new(owner: Pubkey, oracle_authority: Pubkey, access_mint: Pubkey) -> Self {
        Self {
            is_initialized: true,
            state: ContractState::Created,
            owner,
            oracle_authority,
            access_mint,
            survey_end: 0,
            collection_duration: 0,
            collection_end: 0,
            prize_list: Vec::new(),
            answers: Vec::new(),
            participants: Vec::new(),
            randomness: RandomnessRequest::default(),
            winners: Vec::new(),
            payouts: Vec::new(),
        }
    }

    /// Deserialize a survey from raw account data, tolerating the zero
    /// padding at the tail of the fixed-size account.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProgramError> {
        let mut slice: &[u8] = data;
        Self::deserialize(&mut slice).map_err(|_| ProgramError::InvalidAccountData)
    }

    pub fn load(account: &AccountInfo) -> Result<Self, ProgramError> {
        let data = account.try_borrow_data()?;
        Self::from_bytes(&data)
    }

    pub fn save(&self, account: &AccountInfo) -> Result<(), ProgramError> {
        let mut data = account.try_borrow_mut_data()?;
        let mut writer: &mut [u8] = &mut data;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    // --- guard predicates ---------------------------------------------------
    //
    // Each guard either passes or fails with a single typed error. Guards
    // that advance the phase must be called exactly once per operation so a
    // phase is never advanced twice in one instruction.

    /// Answers are only accepted while the survey runs.
    pub fn require_active(&self, now: UnixTimestamp) -> Result<(), SurveyError> {
        if self.state != ContractState::Active {
            return Err(SurveyError::InvalidState);
        }
        if now > self.survey_end {
            return Err(SurveyError::TimingViolation);
        }
        Ok(())
    }

    /// Passes once the answer window is over; lazily advances
    /// `Active -> Expired` on first use.
    pub fn require_expired(&mut self, now: UnixTimestamp) -> Result<(), SurveyError> {
        if now <= self.survey_end {
            return Err(SurveyError::TimingViolation);
        }
        if self.state <= ContractState::Created || self.state > ContractState::Expired {
            return Err(SurveyError::InvalidState);
        }
        if self.state == ContractState::Active {
            self.state = ContractState::Expired;
        }
        Ok(())
    }

    pub fn require_payout(&self) -> Result<(), SurveyError> {
        if self.state < ContractState::Payout {
            return Err(SurveyError::InvalidState);
        }
        Ok(())
    }

    /// Passes once the claim window is over; advances to `Finished`.
    pub fn require_finished(&mut self, now: UnixTimestamp) -> Result<(), SurveyError> {
        if self.state < ContractState::Payout {
            return Err(SurveyError::InvalidState);
        }
        if self.collection_end >= now {
            return Err(SurveyError::TimingViolation);
        }
        self.state = ContractState::Finished;
        Ok(())
    }

    // --- operations ---------------------------------------------------------

    /// Open the survey. `custodied` is the balance available for prizes and
    /// must strictly exceed the prize total, leaving headroom for
    /// operational cost.
    pub fn start(
        &mut self,
        now: UnixTimestamp,
        survey_duration: i64,
        collection_duration: i64,
        prize_list: Vec<u64>,
        custodied: u64,
    ) -> Result<(), SurveyError> {
        if self.state != ContractState::Created {
            return Err(SurveyError::InvalidState);
        }
        if survey_duration <= MIN_ACTIVE_DURATION || survey_duration >= MAX_ACTIVE_DURATION {
            return Err(SurveyError::TimingViolation);
        }
        if collection_duration <= MIN_PAYOUT_DURATION {
            return Err(SurveyError::TimingViolation);
        }
        let prize_total =
            utils::checked_sum(&prize_list).ok_or(SurveyError::InsufficientFunds)?;
        if custodied <= prize_total {
            return Err(SurveyError::InsufficientFunds);
        }
        self.survey_end = now
            .checked_add(survey_duration)
            .ok_or(SurveyError::TimingViolation)?;
        self.collection_duration = collection_duration;
        self.prize_list = prize_list;
        self.state = ContractState::Active;
        Ok(())
    }

    /// Answers are recorded before the access token is consumed; the caller
    /// joins `participants` separately, only after the consumption succeeds.
    pub fn record_answer(&mut self, answer_hash: u32) {
        self.answers.push(answer_hash);
    }

    pub fn record_participant(&mut self, identity: Pubkey) {
        self.participants.push(identity);
    }

    /// Advance the randomness request. Exactly one of three things happens:
    /// a fresh query is recorded, the caller is told to fall back to block
    /// hashes, or the request fails with a typed error.
    pub fn request_seed(
        &mut self,
        now: UnixTimestamp,
        request_id: u64,
    ) -> Result<SeedDisposition, SurveyError> {
        self.require_expired(now)?;
        if self.randomness.is_resolved() {
            return Err(SurveyError::AlreadyDrawn);
        }
        match self.randomness.queried_at {
            None => {
                self.randomness.queried_at = Some(now);
                self.randomness.request_id = request_id;
                Ok(SeedDisposition::Query { request_id })
            }
            Some(queried_at) => {
                if now <= queried_at.saturating_add(ORACLE_WAIT_PERIOD) {
                    Err(SurveyError::TimingViolation)
                } else {
                    Ok(SeedDisposition::Fallback)
                }
            }
        }
    }

    /// Accept an oracle answer for the outstanding request. The result is
    /// parsed as a decimal numeral, non-digit bytes ignored.
    ///
    /// TODO: reject callbacks that arrive after the seed is drawn; a
    /// replayed answer currently overwrites it.
    pub fn oracle_callback(
        &mut self,
        now: UnixTimestamp,
        request_id: u64,
        result: &str,
    ) -> Result<u32, SurveyError> {
        self.require_expired(now)?;
        if self.randomness.queried_at.is_none() || self.randomness.request_id != request_id {
            return Err(SurveyError::InvalidState);
        }
        let seed = crate::oracle::parse_seed(result);
        self.randomness.resolve(seed);
        Ok(seed)
    }

    /// Map the seed and prize list onto the participants. The selection
    /// formula can pick the same identity for several slots; the last slot
    /// that selects an identity determines its claimable amount, replacing
    /// any earlier one.
    pub fn run_raffle(&mut self, now: UnixTimestamp) -> Result<(), SurveyError> {
        if self.state >= ContractState::Payout {
            return Err(SurveyError::AlreadyDrawn);
        }
        self.require_expired(now)?;
        if !self.randomness.is_resolved() {
            return Err(SurveyError::InvalidState);
        }
        if !self.participants.is_empty() && !self.prize_list.is_empty() {
            for (slot, &prize) in self.prize_list.iter().enumerate() {
                let index =
                    utils::winner_index(self.randomness.seed, slot, self.participants.len());
                let identity = self.participants[index];
                self.winners.push(Winner { identity, prize });
                match self.payouts.iter().position(|r| r.identity == identity) {
                    Some(pos) => self.payouts[pos].claimable = prize,
                    None => self.payouts.push(PayoutRecord {
                        identity,
                        claimable: prize,
                        claimed_to: None,
                    }),
                }
            }
        }
        self.collection_end = self
            .survey_end
            .checked_add(self.collection_duration)
            .ok_or(SurveyError::TimingViolation)?;
        self.state = ContractState::Payout;
        Ok(())
    }

    /// Zero the caller's entitlement and record where the prize should be
    /// paid. No value moves here; payment is a separate, operator-driven
    /// step against the recorded address.
    pub fn claim_prize(
        &mut self,
        identity: &Pubkey,
        payout_address: Pubkey,
    ) -> Result<u64, SurveyError> {
        self.require_payout()?;
        let record = self
            .payouts
            .iter_mut()
            .find(|r| r.identity == *identity)
            .ok_or(SurveyError::NothingToClaim)?;
        if record.claimable == 0 {
            return Err(SurveyError::NothingToClaim);
        }
        let amount = record.claimable;
        record.claimable = 0;
        record.claimed_to = Some(payout_address);
        Ok(amount)
    }

    /// Erase the derived collections. Payout records stay until the account
    /// itself is closed.
    pub fn teardown_collections(&mut self) {
        self.answers.clear();
        self.winners.clear();
        self.participants.clear();
        self.prize_list.clear();
    }

    // --- read-only queries --------------------------------------------------

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    /// Raw answers, withheld until the survey closes.
    pub fn answers(&self) -> Result<&[u32], SurveyError> {
        self.require_payout()?;
        Ok(&self.answers)
    }

    pub fn winners(&self) -> &[Winner] {
        &self.winners
    }

    /// Whether the raffle selected this identity for any slot. Stays true
    /// after the prize is claimed.
    pub fn is_winner(&self, identity: &Pubkey) -> Result<bool, SurveyError> {
        self.require_payout()?;
        Ok(self.payouts.iter().any(|r| r.identity == *identity))
    }

    pub fn claimable_prize(&self, identity: &Pubkey) -> Result<u64, SurveyError> {
        self.require_payout()?;
        Ok(self
            .payouts
            .iter()
            .find(|r| r.identity == *identity)
            .map(|r| r.claimable)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: UnixTimestamp = 1_700_000_000;
    const SURVEY_DURATION: i64 = 3_600;
    const COLLECTION_DURATION: i64 = 1_209_600;

    fn fresh_survey() -> Survey {
        Survey::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        )
    }

    fn started_survey(prizes: Vec<u64>) -> Survey {
        let mut survey = fresh_survey();
        survey
            .start(T0, SURVEY_DURATION, COLLECTION_DURATION, prizes, 1_000)
            .expect("start failed");
        survey
    }

    fn after_end() -> UnixTimestamp {
        T0 + SURVEY_DURATION + 1
    }

    #[test]
    fn test_start() {
        let mut survey = fresh_survey();
        survey
            .start(T0, SURVEY_DURATION, COLLECTION_DURATION, vec![300, 200], 1_000)
            .expect("start failed");
        assert_eq!(survey.state, ContractState::Active);
        assert_eq!(survey.survey_end, T0 + SURVEY_DURATION);
        assert_eq!(survey.prize_list, vec![300, 200]);

        // a second start is no longer legal
        assert_eq!(
            survey.start(T0, SURVEY_DURATION, COLLECTION_DURATION, vec![], 1_000),
            Err(SurveyError::InvalidState)
        );
    }

    #[test]
    fn test_start_validates_durations() {
        let mut survey = fresh_survey();
        assert_eq!(
            survey.start(T0, MIN_ACTIVE_DURATION, COLLECTION_DURATION, vec![], 1),
            Err(SurveyError::TimingViolation)
        );
        assert_eq!(
            survey.start(T0, MAX_ACTIVE_DURATION, COLLECTION_DURATION, vec![], 1),
            Err(SurveyError::TimingViolation)
        );
        assert_eq!(
            survey.start(T0, SURVEY_DURATION, MIN_PAYOUT_DURATION, vec![], 1),
            Err(SurveyError::TimingViolation)
        );
        assert_eq!(survey.state, ContractState::Created);
    }

    #[test]
    fn test_start_requires_custody_headroom() {
        let mut survey = fresh_survey();
        assert_eq!(
            survey.start(T0, SURVEY_DURATION, COLLECTION_DURATION, vec![300, 200], 500),
            Err(SurveyError::InsufficientFunds)
        );
        survey
            .start(T0, SURVEY_DURATION, COLLECTION_DURATION, vec![300, 200], 501)
            .expect("one unit of headroom should be enough");
    }

    #[test]
    fn test_require_active_window() {
        let survey = started_survey(vec![300]);
        survey.require_active(T0).expect("active at start");
        survey
            .require_active(T0 + SURVEY_DURATION)
            .expect("active at the boundary");
        assert_eq!(
            survey.require_active(after_end()),
            Err(SurveyError::TimingViolation)
        );

        let unstarted = fresh_survey();
        assert_eq!(
            unstarted.require_active(T0),
            Err(SurveyError::InvalidState)
        );
    }

    #[test]
    fn test_require_expired_advances_once() {
        let mut survey = started_survey(vec![300]);
        assert_eq!(
            survey.require_expired(T0 + 10),
            Err(SurveyError::TimingViolation)
        );
        assert_eq!(survey.state, ContractState::Active);

        survey.require_expired(after_end()).expect("past the end");
        assert_eq!(survey.state, ContractState::Expired);

        // idempotent once expired
        survey.require_expired(after_end()).expect("still expired");
        assert_eq!(survey.state, ContractState::Expired);

        let mut unstarted = fresh_survey();
        assert_eq!(
            unstarted.require_expired(after_end()),
            Err(SurveyError::InvalidState)
        );
    }

    #[test]
    fn test_request_seed_flow() {
        let mut survey = started_survey(vec![300]);
        let now = after_end();

        assert_eq!(
            survey.request_seed(now, 7),
            Ok(SeedDisposition::Query { request_id: 7 })
        );
        assert_eq!(survey.randomness.queried_at, Some(now));
        assert!(survey.randomness.is_pending());

        // retry inside the oracle window
        assert_eq!(
            survey.request_seed(now + ORACLE_WAIT_PERIOD, 8),
            Err(SurveyError::TimingViolation)
        );

        // retry after the window falls back
        assert_eq!(
            survey.request_seed(now + ORACLE_WAIT_PERIOD + 1, 8),
            Ok(SeedDisposition::Fallback)
        );

        survey.randomness.resolve(42);
        assert_eq!(
            survey.request_seed(now + ORACLE_WAIT_PERIOD + 1, 9),
            Err(SurveyError::AlreadyDrawn)
        );
    }

    #[test]
    fn test_request_seed_needs_expiry() {
        let mut survey = started_survey(vec![300]);
        assert_eq!(
            survey.request_seed(T0 + 10, 1),
            Err(SurveyError::TimingViolation)
        );
    }

    #[test]
    fn test_oracle_callback_parses_and_resolves() {
        let mut survey = started_survey(vec![300]);
        let now = after_end();
        survey.request_seed(now, 7).expect("query");

        // wrong correlation id
        assert_eq!(
            survey.oracle_callback(now, 8, "42"),
            Err(SurveyError::InvalidState)
        );

        assert_eq!(survey.oracle_callback(now, 7, "42"), Ok(42));
        assert!(survey.randomness.is_resolved());
        assert_eq!(survey.randomness.seed, 42);

        // a late answer overwrites the seed
        assert_eq!(survey.oracle_callback(now, 7, "notrandom 17"), Ok(17));
        assert_eq!(survey.randomness.seed, 17);
    }

    #[test]
    fn test_oracle_callback_without_request() {
        let mut survey = started_survey(vec![300]);
        assert_eq!(
            survey.oracle_callback(after_end(), 0, "42"),
            Err(SurveyError::InvalidState)
        );
    }

    #[test]
    fn test_run_raffle_deterministic_assignment() {
        let mut survey = started_survey(vec![300, 200]);
        let entrants: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
        for identity in &entrants {
            survey.record_answer(0xDEAD);
            survey.record_participant(*identity);
        }
        let now = after_end();
        survey.request_seed(now, 7).expect("query");
        survey.oracle_callback(now, 7, "42").expect("callback");

        survey.run_raffle(now).expect("raffle");
        assert_eq!(survey.state, ContractState::Payout);
        assert_eq!(survey.collection_end, survey.survey_end + COLLECTION_DURATION);
        assert_eq!(
            survey.winners(),
            &[
                Winner { identity: entrants[2], prize: 300 },
                Winner { identity: entrants[3], prize: 200 },
            ]
        );
        assert_eq!(survey.claimable_prize(&entrants[2]), Ok(300));
        assert_eq!(survey.claimable_prize(&entrants[3]), Ok(200));
        assert_eq!(survey.claimable_prize(&entrants[0]), Ok(0));

        // a second run changes nothing
        assert_eq!(survey.run_raffle(now), Err(SurveyError::AlreadyDrawn));
        assert_eq!(survey.winners().len(), 2);
    }

    #[test]
    fn test_run_raffle_repeat_identity_keeps_last_prize() {
        let mut survey = started_survey(vec![300, 200]);
        let only = Pubkey::new_unique();
        survey.record_answer(1);
        survey.record_participant(only);
        let now = after_end();
        survey.request_seed(now, 7).expect("query");
        survey.oracle_callback(now, 7, "42").expect("callback");
        survey.run_raffle(now).expect("raffle");

        // both slots select the sole participant; the later slot wins out
        assert_eq!(survey.winners().len(), 2);
        assert_eq!(survey.payouts.len(), 1);
        assert_eq!(survey.claimable_prize(&only), Ok(200));
    }

    #[test]
    fn test_run_raffle_without_participants() {
        let mut survey = started_survey(vec![300, 200]);
        let now = after_end();
        survey.request_seed(now, 7).expect("query");
        survey.oracle_callback(now, 7, "42").expect("callback");
        survey.run_raffle(now).expect("raffle");

        assert!(survey.winners().is_empty());
        assert_eq!(survey.state, ContractState::Payout);
    }

    #[test]
    fn test_run_raffle_needs_seed() {
        let mut survey = started_survey(vec![300]);
        assert_eq!(
            survey.run_raffle(after_end()),
            Err(SurveyError::InvalidState)
        );
    }

    #[test]
    fn test_claim_prize_is_one_shot() {
        let mut survey = started_survey(vec![300, 200]);
        let entrants: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
        for identity in &entrants {
            survey.record_answer(9);
            survey.record_participant(*identity);
        }
        let now = after_end();
        survey.request_seed(now, 7).expect("query");
        survey.oracle_callback(now, 7, "42").expect("callback");
        survey.run_raffle(now).expect("raffle");

        let destination = Pubkey::new_unique();
        assert_eq!(survey.claim_prize(&entrants[2], destination), Ok(300));
        assert_eq!(survey.claimable_prize(&entrants[2]), Ok(0));
        assert_eq!(survey.is_winner(&entrants[2]), Ok(true));
        let record = survey
            .payouts
            .iter()
            .find(|r| r.identity == entrants[2])
            .unwrap();
        assert_eq!(record.claimed_to, Some(destination));

        assert_eq!(
            survey.claim_prize(&entrants[2], destination),
            Err(SurveyError::NothingToClaim)
        );
        assert_eq!(
            survey.claim_prize(&entrants[0], destination),
            Err(SurveyError::NothingToClaim)
        );
    }

    #[test]
    fn test_claim_prize_needs_payout_phase() {
        let mut survey = started_survey(vec![300]);
        assert_eq!(
            survey.claim_prize(&Pubkey::new_unique(), Pubkey::new_unique()),
            Err(SurveyError::InvalidState)
        );
    }

    #[test]
    fn test_answers_withheld_until_payout() {
        let mut survey = started_survey(vec![300]);
        survey.record_answer(77);
        assert_eq!(survey.answer_count(), 1);
        assert_eq!(survey.answers(), Err(SurveyError::InvalidState));

        let entrant = Pubkey::new_unique();
        survey.record_participant(entrant);
        let now = after_end();
        survey.request_seed(now, 7).expect("query");
        survey.oracle_callback(now, 7, "42").expect("callback");
        survey.run_raffle(now).expect("raffle");
        assert_eq!(survey.answers(), Ok(&[77][..]));
    }

    #[test]
    fn test_require_finished_and_teardown() {
        let mut survey = started_survey(vec![300]);
        let entrant = Pubkey::new_unique();
        survey.record_answer(5);
        survey.record_participant(entrant);
        let now = after_end();
        survey.request_seed(now, 7).expect("query");
        survey.oracle_callback(now, 7, "42").expect("callback");
        survey.run_raffle(now).expect("raffle");

        assert_eq!(
            survey.require_finished(survey.collection_end),
            Err(SurveyError::TimingViolation)
        );
        assert_eq!(survey.state, ContractState::Payout);

        survey
            .require_finished(survey.collection_end + 1)
            .expect("claim window over");
        assert_eq!(survey.state, ContractState::Finished);

        survey.teardown_collections();
        assert!(survey.answers.is_empty());
        assert!(survey.winners.is_empty());
        assert!(survey.participants.is_empty());
        assert!(survey.prize_list.is_empty());
        // the claim ledger survives until the account is closed
        assert_eq!(survey.payouts.len(), 1);
    }

    #[test]
    fn test_phase_never_decreases() {
        let mut survey = started_survey(vec![300]);
        let mut highest = survey.state;
        let now = after_end();

        let _ = survey.require_expired(now);
        assert!(survey.state >= highest);
        highest = survey.state;

        let _ = survey.request_seed(now, 7);
        let _ = survey.oracle_callback(now, 7, "3");
        survey.record_participant(Pubkey::new_unique());
        let _ = survey.run_raffle(now);
        assert!(survey.state >= highest);
        highest = survey.state;

        let _ = survey.require_finished(survey.collection_end + 1);
        assert!(survey.state >= highest);
        assert_eq!(survey.state, ContractState::Finished);
    }

    #[test]
    fn test_roundtrip_through_account_bytes() {
        let mut survey = started_survey(vec![300, 200]);
        survey.record_answer(0xBEEF);
        survey.record_participant(Pubkey::new_unique());

        let mut data = vec![0u8; SURVEY_ACCOUNT_LEN];
        let mut writer: &mut [u8] = &mut data;
        survey.serialize(&mut writer).expect("serialize");

        let restored = Survey::from_bytes(&data).expect("deserialize");
        assert_eq!(restored.state, survey.state);
        assert_eq!(restored.answers, survey.answers);
        assert_eq!(restored.participants, survey.participants);
        assert_eq!(restored.prize_list, survey.prize_list);
        assert_eq!(restored.randomness, survey.randomness);
    }
}
