// Solvey Survey Program - Instruction Processor
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    error::SurveyError,
    instruction::SurveyInstruction,
    oracle,
    state::{SeedDisposition, Survey, SURVEY_ACCOUNT_LEN},
    utils,
};

/// Program state handler.
pub struct Processor {}

impl Processor {
    /// Process a survey instruction
    pub fn process_instruction(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = SurveyInstruction::unpack(instruction_data)?;

        match instruction {
            SurveyInstruction::Initialize {} => {
                msg!("Instruction: Initialize");
                Self::process_initialize(program_id, accounts)
            }
            SurveyInstruction::Start {
                survey_duration,
                collection_duration,
                prize_list,
            } => {
                msg!("Instruction: Start");
                Self::process_start(
                    program_id,
                    accounts,
                    survey_duration,
                    collection_duration,
                    prize_list,
                )
            }
            SurveyInstruction::SubmitAnswer { answer_hash } => {
                msg!("Instruction: Submit Answer");
                Self::process_submit_answer(program_id, accounts, answer_hash)
            }
            SurveyInstruction::RequestSeed {} => {
                msg!("Instruction: Request Seed");
                Self::process_request_seed(program_id, accounts)
            }
            SurveyInstruction::OracleCallback { request_id, result } => {
                msg!("Instruction: Oracle Callback");
                Self::process_oracle_callback(program_id, accounts, request_id, &result)
            }
            SurveyInstruction::RunRaffle {} => {
                msg!("Instruction: Run Raffle");
                Self::process_run_raffle(program_id, accounts)
            }
            SurveyInstruction::ClaimPrize { payout_address } => {
                msg!("Instruction: Claim Prize");
                Self::process_claim_prize(program_id, accounts, payout_address)
            }
            SurveyInstruction::ReturnResidualFunds {} => {
                msg!("Instruction: Return Residual Funds");
                Self::process_return_residual_funds(program_id, accounts)
            }
            SurveyInstruction::Teardown {} => {
                msg!("Instruction: Teardown");
                Self::process_teardown(program_id, accounts)
            }
        }
    }

    /// Verify ownership and load the survey state.
    fn load_survey(program_id: &Pubkey, survey_info: &AccountInfo) -> Result<Survey, ProgramError> {
        if survey_info.owner != program_id {
            msg!("Survey account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let survey = Survey::load(survey_info)?;
        if !survey.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(survey)
    }

    /// Lamports the survey may pay out: balance above the rent-exempt floor.
    fn custodied(survey_info: &AccountInfo) -> Result<u64, ProgramError> {
        let rent = Rent::get()?;
        let floor = rent.minimum_balance(survey_info.data_len());
        Ok(utils::custodied_balance(survey_info.lamports(), floor))
    }

    fn process_initialize(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let survey_info = next_account_info(account_info_iter)?;
        let oracle_authority_info = next_account_info(account_info_iter)?;
        let access_mint_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_survey_pubkey, bump_seed) =
            Pubkey::find_program_address(&[b"survey"], program_id);
        if *survey_info.key != expected_survey_pubkey {
            msg!("Invalid survey account address");
            return Err(ProgramError::InvalidArgument);
        }

        if survey_info.owner == program_id {
            if let Ok(survey) = Survey::load(survey_info) {
                if survey.is_initialized {
                    msg!("Survey account is already initialized");
                    return Err(SurveyError::AlreadyInitialized.into());
                }
            }
        } else {
            let rent = Rent::get()?;
            let rent_lamports = rent.minimum_balance(SURVEY_ACCOUNT_LEN);
            invoke_signed(
                &system_instruction::create_account(
                    owner_info.key,
                    survey_info.key,
                    rent_lamports,
                    SURVEY_ACCOUNT_LEN as u64,
                    program_id,
                ),
                &[
                    owner_info.clone(),
                    survey_info.clone(),
                    system_program_info.clone(),
                ],
                &[&[b"survey", &[bump_seed]]],
            )?;
        }

        // the access mint must deal in whole units only
        if access_mint_info.owner != &spl_token::id() {
            msg!("Access mint must be an SPL Token mint");
            return Err(ProgramError::InvalidArgument);
        }
        let mint = spl_token::state::Mint::unpack(&access_mint_info.try_borrow_data()?)?;
        if mint.decimals != 0 {
            msg!("Access mint must have zero decimals");
            return Err(ProgramError::InvalidArgument);
        }

        let survey = Survey::new(
            *owner_info.key,
            *oracle_authority_info.key,
            *access_mint_info.key,
        );
        survey.save(survey_info)?;

        msg!(
            "Survey created: owner={}, oracle={}, mint={}",
            owner_info.key,
            oracle_authority_info.key,
            access_mint_info.key
        );
        Ok(())
    }

    fn process_start(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        survey_duration: i64,
        collection_duration: i64,
        prize_list: Vec<u64>,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let survey_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut survey = Self::load_survey(program_id, survey_info)?;
        if survey.owner != *owner_info.key {
            msg!("Only the survey owner can start the survey");
            return Err(SurveyError::Unauthorized.into());
        }

        let clock = Clock::get()?;
        let custodied = Self::custodied(survey_info)?;
        survey.start(
            clock.unix_timestamp,
            survey_duration,
            collection_duration,
            prize_list,
            custodied,
        )?;
        survey.save(survey_info)?;

        msg!(
            "Survey started: ends at {}, {} prize slots, {} lamports custodied",
            survey.survey_end,
            survey.prize_list.len(),
            custodied
        );
        Ok(())
    }

    fn process_submit_answer(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        answer_hash: u32,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let participant_info = next_account_info(account_info_iter)?;
        let survey_info = next_account_info(account_info_iter)?;
        let participant_token_info = next_account_info(account_info_iter)?;
        let owner_token_info = next_account_info(account_info_iter)?;
        let token_program_info = next_account_info(account_info_iter)?;

        if !participant_info.is_signer {
            msg!("Participant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if token_program_info.key != &spl_token::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut survey = Self::load_survey(program_id, survey_info)?;
        let clock = Clock::get()?;
        survey.require_active(clock.unix_timestamp)?;

        // access check: one whole token buys one answer
        {
            let data = participant_token_info.try_borrow_data()?;
            let source = spl_token::state::Account::unpack(&data)?;
            if source.mint != survey.access_mint {
                msg!("Participant token account has the wrong mint");
                return Err(ProgramError::InvalidArgument);
            }
            if source.owner != *participant_info.key {
                msg!("Participant token account is not owned by the participant");
                return Err(ProgramError::InvalidArgument);
            }
            if source.amount == 0 {
                msg!("Participant holds no access tokens");
                return Err(SurveyError::InsufficientFunds.into());
            }
        }
        {
            let data = owner_token_info.try_borrow_data()?;
            let destination = spl_token::state::Account::unpack(&data)?;
            if destination.mint != survey.access_mint || destination.owner != survey.owner {
                msg!("Destination token account must be the owner's");
                return Err(ProgramError::InvalidArgument);
            }
        }

        // the answer lands before its cost; the participant entry only after
        survey.record_answer(answer_hash);

        invoke(
            &spl_token::instruction::transfer(
                token_program_info.key,
                participant_token_info.key,
                owner_token_info.key,
                participant_info.key,
                &[],
                1,
            )?,
            &[
                participant_token_info.clone(),
                owner_token_info.clone(),
                participant_info.clone(),
                token_program_info.clone(),
            ],
        )?;

        survey.record_participant(*participant_info.key);
        survey.save(survey_info)?;

        msg!("Answer recorded: {} total", survey.answer_count());
        Ok(())
    }

    fn process_request_seed(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let survey_info = next_account_info(account_info_iter)?;
        let recent_blockhashes_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut survey = Self::load_survey(program_id, survey_info)?;
        let clock = Clock::get()?;

        match survey.request_seed(clock.unix_timestamp, clock.slot)? {
            SeedDisposition::Query { request_id } => {
                oracle::submit_query(request_id);
            }
            SeedDisposition::Fallback => {
                let seed = oracle::fallback_seed(recent_blockhashes_info)?;
                survey.randomness.resolve(seed);
                msg!("Oracle window elapsed; fallback seed drawn");
            }
        }
        survey.save(survey_info)?;
        Ok(())
    }

    fn process_oracle_callback(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        result: &str,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_authority_info = next_account_info(account_info_iter)?;
        let survey_info = next_account_info(account_info_iter)?;

        if !oracle_authority_info.is_signer {
            msg!("Oracle authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut survey = Self::load_survey(program_id, survey_info)?;
        if survey.oracle_authority != *oracle_authority_info.key {
            msg!("Caller is not the designated oracle");
            return Err(SurveyError::Unauthorized.into());
        }

        let clock = Clock::get()?;
        let seed = survey.oracle_callback(clock.unix_timestamp, request_id, result)?;
        survey.save(survey_info)?;

        msg!("Oracle answered request {}: seed={}", request_id, seed);
        Ok(())
    }

    fn process_run_raffle(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let survey_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut survey = Self::load_survey(program_id, survey_info)?;
        let clock = Clock::get()?;
        survey.run_raffle(clock.unix_timestamp)?;
        survey.save(survey_info)?;

        msg!(
            "Raffle complete: {} winners, claims open until {}",
            survey.winners().len(),
            survey.collection_end
        );
        Ok(())
    }

    fn process_claim_prize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        payout_address: Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let winner_info = next_account_info(account_info_iter)?;
        let survey_info = next_account_info(account_info_iter)?;

        if !winner_info.is_signer {
            msg!("Claimant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut survey = Self::load_survey(program_id, survey_info)?;
        let amount = survey.claim_prize(winner_info.key, payout_address)?;
        survey.save(survey_info)?;

        msg!(
            "Claim recorded: {} lamports payable to {}",
            amount,
            payout_address
        );
        Ok(())
    }

    fn process_return_residual_funds(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let survey_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut survey = Self::load_survey(program_id, survey_info)?;
        if survey.owner != *owner_info.key {
            msg!("Only the survey owner can reclaim residual funds");
            return Err(SurveyError::Unauthorized.into());
        }

        let clock = Clock::get()?;
        survey.require_finished(clock.unix_timestamp)?;
        survey.save(survey_info)?;

        let residual = Self::custodied(survey_info)?;
        let survey_lamports = survey_info.lamports();
        **survey_info.try_borrow_mut_lamports()? = survey_lamports
            .checked_sub(residual)
            .ok_or(SurveyError::InsufficientFunds)?;
        let owner_lamports = owner_info.lamports();
        **owner_info.try_borrow_mut_lamports()? = owner_lamports
            .checked_add(residual)
            .ok_or(ProgramError::InvalidArgument)?;

        msg!("Returned {} residual lamports to the owner", residual);
        Ok(())
    }

    fn process_teardown(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let survey_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut survey = Self::load_survey(program_id, survey_info)?;
        if survey.owner != *owner_info.key {
            msg!("Only the survey owner can tear the survey down");
            return Err(SurveyError::Unauthorized.into());
        }

        let clock = Clock::get()?;
        survey.require_finished(clock.unix_timestamp)?;
        survey.teardown_collections();
        survey.save(survey_info)?;

        // close the account: all remaining lamports to the owner, data wiped
        let remaining = survey_info.lamports();
        **survey_info.try_borrow_mut_lamports()? = 0;
        let owner_lamports = owner_info.lamports();
        **owner_info.try_borrow_mut_lamports()? = owner_lamports
            .checked_add(remaining)
            .ok_or(ProgramError::InvalidArgument)?;
        survey_info.try_borrow_mut_data()?.fill(0);

        msg!("Survey torn down; {} lamports released", remaining);
        Ok(())
    }
}
