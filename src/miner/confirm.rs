use bit_set::BitSet;
use bit_vec::BitVec;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, Level};

use crate::*;
use crate::model::FmTest;
use super::config::SupersetRule;
use super::generate::CandidatePool;

/// Keeps candidates without a disqualifying one item extension in the pool.
pub struct MaximalConfirmer<'a, M> {
    model: &'a M,
    slack: f64,
    rule: SupersetRule,
}

/// Runs the FM test over the candidates from the longest down to singletons.
pub struct TopDownEstimator<'a, M> {
    model: &'a M,
    test: FmTest,
}

/// Accepted candidates and the working set left after subsumption
#[derive( Debug, Clone, Default )]
pub struct TopDownOutcome {
    pub accepted: Vec<Itemset>,
    pub working_set: Vec<Itemset>,
}

impl <'a, M: SupportModel> MaximalConfirmer<'a, M> {

    pub fn new( model: &'a M, slack: f64, rule: SupersetRule ) -> MaximalConfirmer<'a, M> {
	MaximalConfirmer{ model, slack, rule }
    }

    /// Sorted candidates that no extension of the pool disqualifies
    pub fn confirm( &self, pool: &CandidatePool ) -> Vec<Itemset> {
	let candidates: Vec<&Itemset> = pool.iter().collect();

	// extensions grouped by the prefix they extend
	let mut extensions: FxHashMap<&[ItemId], Vec<usize>> = FxHashMap::default();
	for (index, candidate) in candidates.iter().enumerate() {
	    if candidate.len() > 1 {
		let prefix = &candidate.items()[ .. candidate.len() - 1 ];
		extensions.entry( prefix ).or_default().push( index );
	    }
	}

	let mut maximal = BitVec::from_elem( candidates.len(), true );
	for (index, candidate) in candidates.iter().enumerate() {
	    let Some( supersets ) = extensions.get( candidate.items() ) else {
		continue;
	    };
	    let expectation = self.model.expectation( candidate );
	    let excluded = supersets.iter()
		.map( |&superset| candidates[ superset ] )
		.find( |superset| self.rule.excludes( expectation, self.model.expectation( superset ), self.slack ));
	    if let Some( superset ) = excluded {
		trace!( "{candidate} excluded by {superset}" );
		maximal.set( index, false );
	    }
	}

	let mut confirmed: Vec<Itemset> = candidates.iter()
	    .zip( maximal.iter() )
	    .filter( |(_, is_maximal)| *is_maximal )
	    .map( |(candidate, _)| (*candidate).clone() )
	    .collect();
	confirmed.sort();
	debug!( "{} of {} candidates are maximal", confirmed.len(), candidates.len() );
	confirmed
    }
}

impl <'a, M: SupportModel> TopDownEstimator<'a, M> {

    pub fn new( model: &'a M, test: FmTest ) -> TopDownEstimator<'a, M> {
	TopDownEstimator{ model, test }
    }

    pub fn estimate( &self, pool: &CandidatePool ) -> TopDownOutcome {
	let mut accepted: Vec<&Itemset> = Vec::new();
	let mut working = BitSet::new();

	for length in ( 1 ..= pool.max_length() ).rev() {
	    for candidate in pool.level( length ) {
		if !self.test.is_frequent_by_estimation( self.model.estimate( candidate )) {
		    continue;
		}
		candidate.log( "accepted", Level::TRACE );
		// only entries one item shorter can be subsumed
		let subsumed: Vec<usize> = working.iter()
		    .filter( |&entry| accepted[ entry ].len() + 1 == length && accepted[ entry ].is_subset_of( candidate ))
		    .collect();
		for entry in subsumed {
		    working.remove( entry );
		}
		working.insert( accepted.len() );
		accepted.push( candidate );
	    }
	}

	let working_set: Vec<Itemset> = working.iter().map( |entry| accepted[ entry ].clone() ).collect();
	let mut accepted: Vec<Itemset> = accepted.into_iter().cloned().collect();
	accepted.sort();
	debug!( "Accepted {} candidates, {} remain in the working set", accepted.len(), working_set.len() );
	TopDownOutcome{ accepted, working_set }
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::model::{Bounds, IndependenceModel, ItemSupports, Weighting};
    use crate::miner::config::MinerConfig;
    use crate::miner::generate::CandidateGenerator;

    fn ids( numbers: &[u64] ) -> Vec<ItemId> {
	numbers.iter().map( |number| ItemId::Int( *number )).collect()
    }

    fn itemset( numbers: &[u64] ) -> Itemset {
	Itemset::new( ids( numbers ))
    }

    fn example_database() -> UncertainDatabase {
	vec!(
	    vec!( Item::new( 1u64, 0.8 ), Item::new( 2u64, 0.5 )),
	    vec!( Item::new( 1u64, 0.9 ), Item::new( 3u64, 0.4 )),
	    vec!( Item::new( 2u64, 0.6 ), Item::new( 3u64, 0.3 )),
	).into_iter()
	    .map( |items| Transaction::unweighted( items ).unwrap() )
	    .collect()
    }

    fn example_model() -> IndependenceModel {
	IndependenceModel::new( ItemSupports::compute( &example_database(), Weighting::Weighted ))
    }

    /// Pool of {1}, {2} and {1,2} over the example data base
    fn small_pool( model: &IndependenceModel ) -> CandidatePool {
	let mut config = MinerConfig::new( 0.1, 0.5 );
	config.set_max_length( 2 );
	let supports: ItemSupports = vec!(
	    (ItemId::Int( 1 ), model.supports().get( &ItemId::Int( 1 ))),
	    (ItemId::Int( 2 ), model.supports().get( &ItemId::Int( 2 ))),
	).into_iter().collect();
	CandidateGenerator::new( model, &supports, &config ).generate()
    }

    #[test]
    fn test_small_pool() {
	let model = example_model();
	let pool = small_pool( &model );
	assert_eq!( pool.len(), 3 );
	assert!( pool.contains( &itemset( &[1, 2] )));
    }

    #[test]
    fn test_within_slack_drops_prefix() {
	let model = example_model();
	let pool = small_pool( &model );
	// E({1,2}) = 0.93 does not exceed E({1}) + 0.5 = 2.2
	let confirmer = MaximalConfirmer::new( &model, 0.5, SupersetRule::WithinSlack );
	assert_eq!( confirmer.confirm( &pool ), vec!( itemset( &[1, 2] ), itemset( &[2] )));
    }

    #[test]
    fn test_exceeds_slack_keeps_prefix() {
	let model = example_model();
	let pool = small_pool( &model );
	let confirmer = MaximalConfirmer::new( &model, 0.5, SupersetRule::ExceedsSlack );
	assert_eq!( confirmer.confirm( &pool ), vec!( itemset( &[1] ), itemset( &[1, 2] ), itemset( &[2] )));
    }

    #[test]
    fn test_exceeds_slack_with_negative_slack() {
	let model = example_model();
	let pool = small_pool( &model );
	// 0.93 > 1.7 - 1.0
	let confirmer = MaximalConfirmer::new( &model, -1.0, SupersetRule::ExceedsSlack );
	assert_eq!( confirmer.confirm( &pool ), vec!( itemset( &[1, 2] ), itemset( &[2] )));
    }

    #[test]
    fn test_only_prefixes_disqualify() {
	let model = example_model();
	let pool = CandidateGenerator::new( &model, model.supports(), &MinerConfig::new( 0.1, 0.5 )).generate();
	let confirmer = MaximalConfirmer::new( &model, 0.5, SupersetRule::WithinSlack );
	let confirmed = confirmer.confirm( &pool );
	// {1,2,3} extends {1,2} but not {1,3}, whose prefix differs
	assert_eq!( confirmed, vec!( itemset( &[1, 2, 3] ), itemset( &[1, 3] ), itemset( &[2, 3] ), itemset( &[3] )));
    }

    #[test]
    fn test_top_down_accepts_frequent() {
	let model = example_model();
	let pool = small_pool( &model );
	let estimator = TopDownEstimator::new( &model, FmTest::new( Bounds::new( 0.1, 0.5 )));
	let outcome = estimator.estimate( &pool );
	// {1} reaches the upper bound of about 1.413, {2} and {1,2} have a negative variance
	assert_eq!( outcome.accepted, vec!( itemset( &[1] )));
	assert_eq!( outcome.working_set, vec!( itemset( &[1] )));
    }

    #[test]
    fn test_top_down_working_set() {
	let model = example_model();
	let mut pool = CandidatePool::new();
	let estimator = TopDownEstimator::new( &model, FmTest::new( Bounds::new( 0.1, 0.5 )));
	assert!( estimator.estimate( &pool ).accepted.is_empty() );

	pool = small_pool( &model );
	let outcome = estimator.estimate( &pool );
	assert!( outcome.working_set.iter().all( |entry| outcome.accepted.contains( entry )));
    }
}
