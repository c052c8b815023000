use rustc_hash::FxHashSet;
use tracing::{debug, info_span};

use crate::*;
use crate::model::{Bounds, ItemSupports};
use super::config::{Generator, MinerConfig};

/// All candidates that survived generation, grouped by size.
#[derive( Debug, Clone, Default, PartialEq )]
pub struct CandidatePool {
    /// levels[k] holds the sorted candidates of size k + 1
    levels: Vec<Vec<Itemset>>,
}

/// Level-wise candidate generation pruned by closure and by the lower bound.
pub struct CandidateGenerator<'a, M> {
    model: &'a M,
    supports: &'a ItemSupports,
    bounds: Bounds,
    generator: Generator,
    max_length: Option<usize>,
    bound_singletons: bool,
}

impl CandidatePool {

    pub fn new() -> CandidatePool {
	CandidatePool::default()
    }

    fn push( &mut self, level: Vec<Itemset> ) {
	self.levels.push( level );
    }

    /// Candidates of the given size, empty for sizes that were never generated
    pub fn level( &self, length: usize ) -> &[Itemset] {
	length.checked_sub( 1 )
	    .and_then( |index| self.levels.get( index ))
	    .map( |level| level.as_slice() )
	    .unwrap_or( &[] )
    }

    /// Size of the longest candidate
    pub fn max_length( &self ) -> usize {
	self.levels.iter().rposition( |level| !level.is_empty() ).map_or( 0, |index| index + 1 )
    }

    /// Total number of candidates
    pub fn len( &self ) -> usize {
	self.levels.iter().map( |level| level.len() ).sum()
    }

    pub fn is_empty( &self ) -> bool {
	self.len() == 0
    }

    pub fn peak_level_size( &self ) -> usize {
	self.levels.iter().map( |level| level.len() ).max().unwrap_or( 0 )
    }

    /// Candidates ordered by size, then lexicographically
    pub fn iter( &self ) -> impl Iterator<Item = &Itemset> {
	self.levels.iter().flatten()
    }

    pub fn contains( &self, itemset: &Itemset ) -> bool {
	self.level( itemset.len() ).binary_search( itemset ).is_ok()
    }
}

impl <'a, M: SupportModel> CandidateGenerator<'a, M> {

    pub fn new( model: &'a M, supports: &'a ItemSupports, config: &MinerConfig ) -> CandidateGenerator<'a, M> {
	CandidateGenerator {
	    model,
	    supports,
	    bounds: Bounds::new( config.min_support, config.min_probability ),
	    generator: config.generator,
	    max_length: config.max_length,
	    bound_singletons: config.bound_singletons,
	}
    }

    /// Generates levels until one is empty or the maximum length is reached
    pub fn generate( &self ) -> CandidatePool {
	let mut pool = CandidatePool::new();
	let mut length = 1;
	let mut level = {
	    let _level_span = info_span!( "level", length ).entered();
	    self.first_level()
	};

	while !level.is_empty() {
	    debug!( "Level {length} holds {} candidates", level.len() );
	    let at_limit = self.max_length.map_or( false, |max| length >= max );
	    let next = if at_limit {
		debug!( "Reached maximum itemset length {length}" );
		Vec::new()
	    } else {
		let _level_span = info_span!( "level", length = length + 1 ).entered();
		self.next_level( &level )
	    };
	    pool.push( level );
	    level = next;
	    length += 1;
	}
	pool
    }

    /// Singletons whose expected support reaches the support threshold
    fn first_level( &self ) -> Vec<Itemset> {
	let mut level: Vec<Itemset> = self.supports.iter()
	    .filter( |(_, support)| *support >= self.bounds.min_support() )
	    .map( |(id, _)| Itemset::singleton( id.clone() ))
	    .collect();
	level.sort();
	self.model.accumulate( &mut level );
	if self.bound_singletons {
	    level.retain( |candidate| self.bounds.admits( self.model.expectation( candidate )));
	}
	level
    }

    fn next_level( &self, previous: &[Itemset] ) -> Vec<Itemset> {
	let mut level = match self.generator {
	    Generator::Join => join_level( previous ),
	    Generator::Extension => extend_level( previous, &self.supports.items() ),
	};
	let closed = level.len();
	self.model.accumulate( &mut level );
	level.retain( |candidate| self.bounds.admits( self.model.expectation( candidate )));
	debug!( "{} of {closed} closed candidates reach the lower bound {:.4}", level.len(), self.bounds.lower() );
	level
    }
}

/// Joins pairs of the sorted previous level that agree on all but the last item.
/// Keeps a join only if all of its immediate subsets are in the previous level.
pub fn join_level( previous: &[Itemset] ) -> Vec<Itemset> {
    let mut level = Vec::new();
    for (index, left) in previous.iter().enumerate() {
	for right in &previous[ index + 1 .. ] {
	    // itemsets sharing the prefix of left are adjacent in the sorted level
	    let suffix = match left.join_suffix( right ) {
		Some( suffix ) => suffix,
		None => break,
	    };
	    let candidate = left.with_suffix( suffix.clone() );
	    if is_closed_sorted( &candidate, previous ) {
		level.push( candidate );
	    }
	}
    }
    level
}

/// Extends each candidate of the previous level by every item of the universe.
/// Duplicates are removed and closure is checked with hash lookups.
pub fn extend_level( previous: &[Itemset], universe: &[ItemId] ) -> Vec<Itemset> {
    let known: FxHashSet<&[ItemId]> = previous.iter().map( |candidate| candidate.items() ).collect();
    let mut extensions: FxHashSet<Itemset> = FxHashSet::default();
    for candidate in previous {
	for item in universe {
	    if let Some( extension ) = candidate.extended( item ) {
		if !extensions.contains( &extension ) && is_closed( &extension, &known ) {
		    extensions.insert( extension );
		}
	    }
	}
    }
    let mut level: Vec<Itemset> = extensions.into_iter().collect();
    level.sort();
    level
}

/// All immediate subsets occur in the sorted level
fn is_closed_sorted( candidate: &Itemset, level: &[Itemset] ) -> bool {
    candidate.immediate_subsets()
	.all( |subset| level.binary_search_by( |probe| probe.items().cmp( subset.as_slice() )).is_ok() )
}

fn is_closed( candidate: &Itemset, known: &FxHashSet<&[ItemId]> ) -> bool {
    candidate.immediate_subsets()
	.all( |subset| known.contains( subset.as_slice() ))
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::model::{IndependenceModel, ExactModel, Expectation};

    fn ids( numbers: &[u64] ) -> Vec<ItemId> {
	numbers.iter().map( |number| ItemId::Int( *number )).collect()
    }

    fn level( sets: &[&[u64]] ) -> Vec<Itemset> {
	let mut level: Vec<Itemset> = sets.iter().map( |set| Itemset::new( ids( set ))).collect();
	level.sort();
	level
    }

    fn parse( lines: &[&str] ) -> UncertainDatabase {
	lines.iter()
	    .filter_map( |line| crate::io::parse_transaction_line( line ).unwrap() )
	    .collect()
    }

    fn example_database() -> UncertainDatabase {
	parse( &["1(0.8) 2(0.5)", "1(0.9) 3(0.4)", "2(0.6) 3(0.3)"] )
    }

    /// Dense data base where every combination of the first items is well supported
    fn dense_database() -> UncertainDatabase {
	parse( &[
	    "1(0.9) 2(0.8) 3(0.9) 4(0.2)",
	    "1(0.8) 2(0.9) 3(0.7)",
	    "1(0.9) 2(0.7) 4(0.3)",
	    "2(0.9) 3(0.8) 5(0.1)",
	    "1(0.7) 3(0.9)",
	])
    }

    fn generate( database: &UncertainDatabase, config: &MinerConfig ) -> CandidatePool {
	let supports = ItemSupports::compute( database, config.weighting );
	match config.expectation {
	    Expectation::Independence => {
		let model = IndependenceModel::new( supports.clone() );
		CandidateGenerator::new( &model, &supports, config ).generate()
	    },
	    Expectation::Exact => {
		let model = ExactModel::new( database, config.weighting );
		CandidateGenerator::new( &model, &supports, config ).generate()
	    },
	}
    }

    #[test]
    fn test_join_level() {
	let previous = level( &[&[1, 2], &[1, 3], &[2, 3], &[2, 4]] );
	let joined = join_level( &previous );
	// {2,3,4} lacks {3,4}
	assert_eq!( joined, level( &[&[1, 2, 3]] ));
    }

    #[test]
    fn test_join_singletons() {
	let previous = level( &[&[1], &[2], &[3]] );
	assert_eq!( join_level( &previous ), level( &[&[1, 2], &[1, 3], &[2, 3]] ));
    }

    #[test]
    fn test_extension_matches_join() {
	let previous = level( &[&[1, 2], &[1, 3], &[2, 3], &[2, 4], &[3, 4], &[1, 4]] );
	let universe = ids( &[1, 2, 3, 4, 5] );
	assert_eq!( extend_level( &previous, &universe ), join_level( &previous ));
	assert_eq!( join_level( &previous ).len(), 4 );
    }

    #[test]
    fn test_example_levels() {
	let pool = generate( &example_database(), &MinerConfig::new( 0.1, 0.5 ));
	assert_eq!( pool.level( 1 ), level( &[&[1], &[2], &[3]] ).as_slice() );
	// all pairs exceed the lower bound of about 0.328
	assert_eq!( pool.level( 2 ), level( &[&[1, 2], &[1, 3], &[2, 3]] ).as_slice() );
	assert_eq!( pool.level( 3 ), level( &[&[1, 2, 3]] ).as_slice() );
	assert_eq!( pool.max_length(), 3 );
	assert_eq!( pool.len(), 7 );
	assert!( pool.contains( &Itemset::new( ids( &[1, 3] ))));
    }

    #[test]
    fn test_max_length() {
	let mut config = MinerConfig::new( 0.1, 0.5 );
	config.set_max_length( 2 );
	let pool = generate( &example_database(), &config );
	assert_eq!( pool.max_length(), 2 );
	assert!( pool.level( 3 ).is_empty() );
    }

    #[test]
    fn test_support_threshold_drops_singletons() {
	// item 3 has support 0.7 < 0.8
	let pool = generate( &example_database(), &MinerConfig::new( 0.8, 0.5 ));
	assert!( pool.level( 1 ).iter().all( |candidate| candidate.items() != ids( &[3] ).as_slice() ));
	assert!( pool.iter().all( |candidate| !candidate.contains( &ItemId::Int( 3 ))));
    }

    #[test]
    fn test_lower_bound_prunes_exact_pairs() {
	let mut config = MinerConfig::new( 0.1, 0.5 );
	config.set_expectation( Expectation::Exact );
	let pool = generate( &example_database(), &config );
	// exact pair supports are 0.4, 0.36 and 0.18; the last is below the lower bound
	assert_eq!( pool.level( 2 ), level( &[&[1, 2], &[1, 3]] ).as_slice() );
	// {1,2,3} lacks the subset {2,3}
	assert!( pool.level( 3 ).is_empty() );
	assert_approx!( pool.level( 2 )[0].expected_support(), 0.4, 1e-9 );
    }

    #[test]
    fn test_anti_monotone() {
	for generator in [Generator::Join, Generator::Extension] {
	    for expectation in [Expectation::Independence, Expectation::Exact] {
		let mut config = MinerConfig::new( 0.3, 0.7 );
		config.set_generator( generator );
		config.set_expectation( expectation );
		let pool = generate( &dense_database(), &config );
		assert!( pool.len() > 0 );
		for candidate in pool.iter().filter( |candidate| candidate.len() > 1 ) {
		    for subset in candidate.immediate_subsets() {
			assert!( pool.contains( &Itemset::new( subset )), "{candidate} lacks a subset" );
		    }
		}
	    }
	}
    }

    #[test]
    fn test_generators_agree() {
	for expectation in [Expectation::Independence, Expectation::Exact] {
	    let mut config = MinerConfig::new( 0.3, 0.7 );
	    config.set_expectation( expectation );
	    let joined = generate( &dense_database(), &config );
	    config.set_generator( Generator::Extension );
	    let extended = generate( &dense_database(), &config );
	    assert_eq!( joined, extended );
	}
    }

    #[test]
    fn test_idempotent() {
	let database = dense_database();
	let config = MinerConfig::new( 0.2, 0.6 );
	let first = generate( &database, &config );
	let second = generate( &database, &config );
	assert_eq!( first, second );
    }

    #[test]
    fn test_empty_database() {
	let pool = generate( &UncertainDatabase::new(), &MinerConfig::new( 0.1, 0.5 ));
	assert!( pool.is_empty() );
	assert_eq!( pool.max_length(), 0 );
	assert_eq!( pool.peak_level_size(), 0 );
    }
}
