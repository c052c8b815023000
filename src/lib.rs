
#[cfg(test)]
macro_rules! assert_approx {
    ($real:expr, $expected:expr, $delta:expr) => {
	if $real < $expected - $delta || $real > $expected + $delta {
	    panic!( "Violate {:.6} == {:.6} (+-{:.6})", $real, $expected, $delta );
	}
    }
}

/// Emits an event at a level that is only known at runtime
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
	match $level {
	    tracing::Level::ERROR => tracing::error!( $($arg)+ ),
	    tracing::Level::WARN => tracing::warn!( $($arg)+ ),
	    tracing::Level::INFO => tracing::info!( $($arg)+ ),
	    tracing::Level::DEBUG => tracing::debug!( $($arg)+ ),
	    _ => tracing::trace!( $($arg)+ ),
	}
    }
}

pub mod error;
pub mod data;
pub mod model;
pub mod miner;
pub mod io;

pub use error::{MineError, MineResult};
pub use data::{ItemId, Item, Transaction, Database, UncertainDatabase, Itemset};
pub use model::{SupportModel, Estimate};
pub use miner::{Miner, PmfiMiner, MinerConfig, MiningResult, MiningStats, Pmfi};

/// Objects that can be recorded in the log
pub trait Loggable {
    fn log( &self, message: &str, level: tracing::Level );
}
