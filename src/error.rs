// Solvey Survey Program - Errors
use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the survey program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurveyError {
    /// Instruction data could not be parsed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// The survey account has already been set up
    #[error("Survey is already initialized")]
    AlreadyInitialized,

    /// Caller lacks the required role or identity
    #[error("Caller is not authorized for this action")]
    Unauthorized,

    /// Operation is not legal in the current phase
    #[error("Operation is not legal in the current phase")]
    InvalidState,

    /// A time-based guard was not met
    #[error("Time-based guard not met")]
    TimingViolation,

    /// Custodied balance too low for the operation
    #[error("Insufficient custodied funds")]
    InsufficientFunds,

    /// Randomness or raffle re-invoked after completion
    #[error("Randomness has already been drawn")]
    AlreadyDrawn,

    /// Caller has no claimable prize
    #[error("Nothing to claim")]
    NothingToClaim,
}

impl From<SurveyError> for ProgramError {
    fn from(e: SurveyError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for SurveyError {
    fn type_of() -> &'static str {
        "Survey Error"
    }
}

impl PrintProgramError for SurveyError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
