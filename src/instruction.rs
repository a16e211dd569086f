// Solvey Survey Program - Instructions
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
    sysvar::recent_blockhashes,
};
use std::convert::TryInto;
use std::mem::size_of;

#[derive(Clone, Debug, PartialEq)]
pub enum SurveyInstruction {
    /// Bootstrap the singleton survey account in the `Created` phase.
    /// Prize custody is funded afterwards by plain transfers to the PDA.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The survey owner; pays for the account
    /// 1. `[writable]` The survey account (PDA, seed `"survey"`)
    /// 2. `[]` The designated oracle authority
    /// 3. `[]` The access-token mint gating participation (0 decimals)
    /// 4. `[]` The system program
    Initialize {},

    /// Open the survey for answers (owner only).
    ///
    /// Accounts expected:
    /// 0. `[signer]` The survey owner
    /// 1. `[writable]` The survey account
    Start {
        /// How long answers are accepted, in seconds
        survey_duration: i64,
        /// How long winners get to claim after the draw, in seconds
        collection_duration: i64,
        /// Ordered prize amounts in lamports, one raffle slot each
        prize_list: Vec<u64>,
    },

    /// Submit one answer hash, consuming one access token.
    ///
    /// Accounts expected:
    /// 0. `[signer]` The participant
    /// 1. `[writable]` The survey account
    /// 2. `[writable]` The participant's access-token account
    /// 3. `[writable]` The owner's access-token account
    /// 4. `[]` The SPL Token program
    SubmitAnswer {
        /// Opaque 32-bit hash of the answer payload
        answer_hash: u32,
    },

    /// Ask for the random seed: emits the oracle query on first use, or
    /// resolves via the block-hash fallback once the wait period elapsed.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[writable]` The survey account
    /// 2. `[]` The recent blockhashes sysvar
    RequestSeed {},

    /// Deliver the oracle's answer for an outstanding seed request.
    ///
    /// Accounts expected:
    /// 0. `[signer]` The designated oracle authority
    /// 1. `[writable]` The survey account
    OracleCallback {
        /// Correlation id from the emitted query
        request_id: u64,
        /// Raw oracle result; parsed as a decimal numeral
        result: String,
    },

    /// Map the resolved seed and prize list onto the participants and open
    /// the claim window.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[writable]` The survey account
    RunRaffle {},

    /// Record the caller's claim and its payout destination. No funds move
    /// here; payment against the recorded address is a separate step.
    ///
    /// Accounts expected:
    /// 0. `[signer]` The winning participant
    /// 1. `[writable]` The survey account
    ClaimPrize {
        /// Destination of record for the prize payment
        payout_address: Pubkey,
    },

    /// Return the custodied balance above the rent floor to the owner
    /// (owner only, after the claim window).
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The survey owner
    /// 1. `[writable]` The survey account
    ReturnResidualFunds {},

    /// Erase the derived collections and close the survey account,
    /// releasing all remaining lamports to the owner. Irreversible.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The survey owner
    /// 1. `[writable]` The survey account
    Teardown {},
}

impl SurveyInstruction {
    /// Unpacks a byte buffer into a SurveyInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match tag {
            0 => Self::Initialize {},
            1 => {
                let (survey_duration, rest) = Self::unpack_i64(rest)?;
                let (collection_duration, rest) = Self::unpack_i64(rest)?;
                let (prize_list, _) = Self::unpack_u64_vec(rest)?;
                Self::Start {
                    survey_duration,
                    collection_duration,
                    prize_list,
                }
            }
            2 => {
                let (answer_hash, _) = Self::unpack_u32(rest)?;
                Self::SubmitAnswer { answer_hash }
            }
            3 => Self::RequestSeed {},
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (result, _) = Self::unpack_string(rest)?;
                Self::OracleCallback { request_id, result }
            }
            5 => Self::RunRaffle {},
            6 => {
                let (payout_address, _) = Self::unpack_pubkey(rest)?;
                Self::ClaimPrize { payout_address }
            }
            7 => Self::ReturnResidualFunds {},
            8 => Self::Teardown {},
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    /// Packs a SurveyInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match self {
            Self::Initialize {} => buf.push(0),
            Self::Start {
                survey_duration,
                collection_duration,
                prize_list,
            } => {
                buf.push(1);
                buf.extend_from_slice(&survey_duration.to_le_bytes());
                buf.extend_from_slice(&collection_duration.to_le_bytes());
                buf.extend_from_slice(&(prize_list.len() as u32).to_le_bytes());
                for prize in prize_list {
                    buf.extend_from_slice(&prize.to_le_bytes());
                }
            }
            Self::SubmitAnswer { answer_hash } => {
                buf.push(2);
                buf.extend_from_slice(&answer_hash.to_le_bytes());
            }
            Self::RequestSeed {} => buf.push(3),
            Self::OracleCallback { request_id, result } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(result.len() as u32).to_le_bytes());
                buf.extend_from_slice(result.as_bytes());
            }
            Self::RunRaffle {} => buf.push(5),
            Self::ClaimPrize { payout_address } => {
                buf.push(6);
                buf.extend_from_slice(payout_address.as_ref());
            }
            Self::ReturnResidualFunds {} => buf.push(7),
            Self::Teardown {} => buf.push(8),
        }
        buf
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let value = input
            .get(..4)
            .and_then(|slice| slice.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((value, &input[4..]))
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((value, &input[8..]))
    }

    fn unpack_i64(input: &[u8]) -> Result<(i64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(i64::from_le_bytes)
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((value, &input[8..]))
    }

    fn unpack_pubkey(input: &[u8]) -> Result<(Pubkey, &[u8]), ProgramError> {
        let bytes: [u8; 32] = input
            .get(..32)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((Pubkey::new_from_array(bytes), &input[32..]))
    }

    fn unpack_u64_vec(input: &[u8]) -> Result<(Vec<u64>, &[u8]), ProgramError> {
        let (len, mut rest) = Self::unpack_u32(input)?;
        if rest.len() < (len as usize).saturating_mul(8) {
            return Err(ProgramError::InvalidInstructionData);
        }
        let mut values = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let (value, tail) = Self::unpack_u64(rest)?;
            values.push(value);
            rest = tail;
        }
        Ok((values, rest))
    }

    fn unpack_string(input: &[u8]) -> Result<(String, &[u8]), ProgramError> {
        let (len, rest) = Self::unpack_u32(input)?;
        let bytes = rest
            .get(..len as usize)
            .ok_or(ProgramError::InvalidInstructionData)?;
        let value = String::from_utf8(bytes.to_vec())
            .map_err(|_| ProgramError::InvalidInstructionData)?;
        Ok((value, &rest[len as usize..]))
    }
}

/// Derive the singleton survey account address.
pub fn find_survey_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"survey"], program_id)
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    owner: &Pubkey,
    survey_account: &Pubkey,
    oracle_authority: &Pubkey,
    access_mint: &Pubkey,
) -> Instruction {
    let data = SurveyInstruction::Initialize {}.pack();

    let accounts = vec![
        AccountMeta::new(*owner, true),
        AccountMeta::new(*survey_account, false),
        AccountMeta::new_readonly(*oracle_authority, false),
        AccountMeta::new_readonly(*access_mint, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create start instruction
pub fn start(
    program_id: &Pubkey,
    owner: &Pubkey,
    survey_account: &Pubkey,
    survey_duration: i64,
    collection_duration: i64,
    prize_list: Vec<u64>,
) -> Instruction {
    let data = SurveyInstruction::Start {
        survey_duration,
        collection_duration,
        prize_list,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new(*survey_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create submit_answer instruction
pub fn submit_answer(
    program_id: &Pubkey,
    participant: &Pubkey,
    survey_account: &Pubkey,
    participant_token_account: &Pubkey,
    owner_token_account: &Pubkey,
    answer_hash: u32,
) -> Instruction {
    let data = SurveyInstruction::SubmitAnswer { answer_hash }.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*participant, true),
        AccountMeta::new(*survey_account, false),
        AccountMeta::new(*participant_token_account, false),
        AccountMeta::new(*owner_token_account, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create request_seed instruction
pub fn request_seed(program_id: &Pubkey, caller: &Pubkey, survey_account: &Pubkey) -> Instruction {
    let data = SurveyInstruction::RequestSeed {}.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*survey_account, false),
        AccountMeta::new_readonly(recent_blockhashes::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create oracle_callback instruction
pub fn oracle_callback(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    survey_account: &Pubkey,
    request_id: u64,
    result: &str,
) -> Instruction {
    let data = SurveyInstruction::OracleCallback {
        request_id,
        result: result.to_string(),
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*oracle_authority, true),
        AccountMeta::new(*survey_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create run_raffle instruction
pub fn run_raffle(program_id: &Pubkey, caller: &Pubkey, survey_account: &Pubkey) -> Instruction {
    let data = SurveyInstruction::RunRaffle {}.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*survey_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create claim_prize instruction
pub fn claim_prize(
    program_id: &Pubkey,
    winner: &Pubkey,
    survey_account: &Pubkey,
    payout_address: &Pubkey,
) -> Instruction {
    let data = SurveyInstruction::ClaimPrize {
        payout_address: *payout_address,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*winner, true),
        AccountMeta::new(*survey_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create return_residual_funds instruction
pub fn return_residual_funds(
    program_id: &Pubkey,
    owner: &Pubkey,
    survey_account: &Pubkey,
) -> Instruction {
    let data = SurveyInstruction::ReturnResidualFunds {}.pack();

    let accounts = vec![
        AccountMeta::new(*owner, true),
        AccountMeta::new(*survey_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create teardown instruction
pub fn teardown(program_id: &Pubkey, owner: &Pubkey, survey_account: &Pubkey) -> Instruction {
    let data = SurveyInstruction::Teardown {}.pack();

    let accounts = vec![
        AccountMeta::new(*owner, true),
        AccountMeta::new(*survey_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}
