//! Error kinds raised while loading uncertain data and configuring a mining run.

use thiserror::Error;

#[derive( Error, Debug )]
pub enum MineError {
    /// A line of the input that does not follow `itemId(probability)[weight]`
    #[error( "line {line}: malformed transaction: {reason}" )]
    MalformedTransactionLine { line: usize, reason: String },

    /// Existential probability outside [0,1]
    #[error( "line {line}: probability {probability} of item '{item}' is outside [0,1]" )]
    ProbabilityOutOfRange { line: usize, item: String, probability: f64 },

    #[error( "line {line}: weight {weight} is negative or not finite" )]
    InvalidWeight { line: usize, weight: f64 },

    #[error( "line {line}: item '{item}' occurs more than once" )]
    DuplicateItem { line: usize, item: String },

    /// Support or probability threshold outside (0,1]
    #[error( "threshold {name} = {value} is outside (0,1]" )]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error( "invalid configuration: {0}" )]
    InvalidConfig( String ),

    #[error( "I/O error: {0}" )]
    Io( #[from] std::io::Error ),

    #[error( "JSON error: {0}" )]
    Json( #[from] serde_json::Error ),
}

impl MineError {
    /// True for errors that reject a single transaction but leave the rest of the load intact
    pub fn is_data_error( &self ) -> bool {
	matches!( self,
		  MineError::MalformedTransactionLine { .. } |
		  MineError::ProbabilityOutOfRange { .. } |
		  MineError::InvalidWeight { .. } |
		  MineError::DuplicateItem { .. } )
    }

    /// Attaches the input line number to a data error raised without one
    pub fn at_line( self, number: usize ) -> MineError {
	match self {
	    MineError::MalformedTransactionLine { reason, .. } => MineError::MalformedTransactionLine { line: number, reason },
	    MineError::ProbabilityOutOfRange { item, probability, .. } => MineError::ProbabilityOutOfRange { line: number, item, probability },
	    MineError::InvalidWeight { weight, .. } => MineError::InvalidWeight { line: number, weight },
	    MineError::DuplicateItem { item, .. } => MineError::DuplicateItem { line: number, item },
	    other => other,
	}
    }
}

pub type MineResult<T> = Result<T, MineError>;
