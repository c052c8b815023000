use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, debug, info_span, Level};

use crate::*;
use crate::model::{Bounds, Expectation, ExactModel, FmTest, IndependenceModel, ItemSupports};

pub mod config;
pub mod generate;
pub mod confirm;
pub mod serialize;

pub use config::{MinerConfig, Generator, Confirmation, SupersetRule};
pub use generate::{CandidatePool, CandidateGenerator, join_level, extend_level};
pub use confirm::{MaximalConfirmer, TopDownEstimator, TopDownOutcome};
pub use serialize::ReportFormatter;

pub trait Miner {
    fn mine<D: Database + Sync>( &mut self, data: &D ) -> MineResult<MiningResult>;
}

/// Mines probable maximal frequent itemsets with the configured generator and confirmation.
pub struct PmfiMiner {
    config: MinerConfig,
}

/// A confirmed itemset with the expected support the model assigned to it
#[derive( Debug, Clone, PartialEq, Serialize )]
pub struct Pmfi {
    pub items: Vec<ItemId>,
    pub expectation: f64,
}

/// Counters of one mining run
#[derive( Debug, Clone, Default, PartialEq, Serialize )]
pub struct MiningStats {
    pub transaction_count: usize,
    pub item_count: usize,
    /// candidates in the pool handed to confirmation
    pub candidate_count: usize,
    pub confirmed_count: usize,
    /// entries left in the top-down working set, zero for the maximal confirmation
    pub working_set_count: usize,
    pub level_count: usize,
    pub peak_level_size: usize,
    pub min_support: f64,
    pub min_probability: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub elapsed: Duration,
}

#[derive( Debug, Clone, Default, PartialEq, Serialize )]
pub struct MiningResult {
    /// sorted by identifiers
    pub itemsets: Vec<Pmfi>,
    pub stats: MiningStats,
}

impl Miner for PmfiMiner {
    fn mine<D: Database + Sync>( &mut self, data: &D ) -> MineResult<MiningResult> {
	self.config.validate()?;
	let _mine_span = info_span!( "mine", s = self.config.min_support, p = self.config.min_probability ).entered();
	let started = Instant::now();

	let supports = {
	    let _supports_span = info_span!( "supports" ).entered();
	    ItemSupports::compute( data, self.config.weighting )
	};
	info!( "Computed the expected support of {} items over {} transactions", supports.len(), data.len() );

	let result = match self.config.expectation {
	    Expectation::Independence => {
		let model = IndependenceModel::new( supports.clone() );
		self.run( data, &supports, &model, started )
	    },
	    Expectation::Exact => {
		let model = ExactModel::new( data, self.config.weighting );
		self.run( data, &supports, &model, started )
	    },
	};
	result.log( "Mining finished", Level::INFO );
	Ok( result )
    }
}

impl PmfiMiner {

    pub fn new( config: MinerConfig ) -> PmfiMiner {
	PmfiMiner{ config }
    }

    pub fn config( &self ) -> &MinerConfig {
	&self.config
    }

    fn run<D: Database, M: SupportModel>( &self, data: &D, supports: &ItemSupports, model: &M, started: Instant ) -> MiningResult {
	let bounds = Bounds::new( self.config.min_support, self.config.min_probability );
	debug!( "Expectation bounds [{:.4}, {:.4}]", bounds.lower(), bounds.upper() );

	let pool = {
	    let _generate_span = info_span!( "generate" ).entered();
	    CandidateGenerator::new( model, supports, &self.config ).generate()
	};
	info!( "Generated {} candidates in {} levels", pool.len(), pool.max_length() );

	let (confirmed, working_set_count) = {
	    let _confirm_span = info_span!( "confirm" ).entered();
	    match self.config.confirmation {
		Confirmation::Maximal => {
		    let confirmer = MaximalConfirmer::new( model, self.config.slack(), self.config.superset_rule );
		    (confirmer.confirm( &pool ), 0)
		},
		Confirmation::TopDown => {
		    let outcome = TopDownEstimator::new( model, FmTest::new( bounds )).estimate( &pool );
		    let working_set_count = outcome.working_set.len();
		    (outcome.accepted, working_set_count)
		},
	    }
	};

	let itemsets: Vec<Pmfi> = confirmed.iter()
	    .map( |itemset| Pmfi{ items: itemset.items().to_vec(), expectation: model.expectation( itemset ) })
	    .collect();

	let stats = MiningStats {
	    transaction_count: data.len(),
	    item_count: supports.len(),
	    candidate_count: pool.len(),
	    confirmed_count: itemsets.len(),
	    working_set_count,
	    level_count: pool.max_length(),
	    peak_level_size: pool.peak_level_size(),
	    min_support: bounds.min_support(),
	    min_probability: bounds.min_probability(),
	    lower_bound: bounds.lower(),
	    upper_bound: bounds.upper(),
	    elapsed: started.elapsed(),
	};
	MiningResult{ itemsets, stats }
    }
}

impl MiningResult {

    pub fn len( &self ) -> usize {
	self.itemsets.len()
    }

    pub fn is_empty( &self ) -> bool {
	self.itemsets.is_empty()
    }

    /// Membership of a sorted identifier sequence
    pub fn contains( &self, items: &[ItemId] ) -> bool {
	self.itemsets.iter().any( |itemset| itemset.items == items )
    }
}

impl Loggable for MiningResult {
    fn log( &self, message: &str, level: Level ) {
	event_at!( level, "{}: {} itemsets confirmed from {} candidates over {} transactions in {}ms",
		   message, self.stats.confirmed_count, self.stats.candidate_count,
		   self.stats.transaction_count, self.stats.elapsed.as_millis() );
    }
}
