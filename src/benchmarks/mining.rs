use tracing::{info, debug};
use tracing_subscriber;

use rand::prelude::*;
use rand::rngs::StdRng;
use statrs::distribution::{Beta, DiscreteUniform};

use std::time::*;

use probmine::*;
use probmine::miner::{Generator, Confirmation};
use probmine::model::Expectation;

fn main() -> Result<(), String> {
    prepare_logging();

    let database = generate_database( 2000, 60, 12, 7 )?;
    info!( "Generated {} transactions over {} items", database.len(), database.item_count() );

    for expectation in [Expectation::Independence, Expectation::Exact] {
	for generator in [Generator::Join, Generator::Extension] {
	    for confirmation in [Confirmation::Maximal, Confirmation::TopDown] {
		let mut config = MinerConfig::new( 0.05, 0.6 );
		config.set_expectation( expectation );
		config.set_generator( generator );
		config.set_confirmation( confirmation );
		config.set_max_length( 4 );

		let (time, result) = benchmark_run( &database, config )?;
		info!( "{expectation:?} / {generator:?} / {confirmation:?}: {} candidates, {} itemsets in {}ms",
		       result.stats.candidate_count, result.len(), time.as_millis() );
	    }
	}
    }

    Result::Ok( () )
}

fn benchmark_run( database: &UncertainDatabase, config: MinerConfig ) -> Result<(Duration, MiningResult), String> {
    let mut miner = PmfiMiner::new( config );
    let start = Instant::now();
    let result = miner.mine( database ).map_err( |err| err.to_string() )?;
    let time_spent = Instant::now().duration_since( start );
    debug!( "peak level size {}", result.stats.peak_level_size );
    Ok( (time_spent, result) )
}

/// Transactions of uniform length with Beta distributed probabilities.
/// Popular items are drawn from the front of the universe more often.
fn generate_database( transactions: usize, items: u64, max_length: usize, seed: u64 ) -> Result<UncertainDatabase, String> {
    let mut gen = StdRng::seed_from_u64( seed );
    let length_distribution = DiscreteUniform::new( 1, max_length as i64 ).map_err( |err| err.to_string() )?;
    let probability_distribution = Beta::new( 2.0, 3.0 ).map_err( |err| err.to_string() )?;

    let mut universe: Vec<u64> = ( 0 .. items ).collect();
    let mut database = UncertainDatabase::new();
    for _ in 0 .. transactions {
	let length = length_distribution.sample( &mut gen ) as usize;
	let chosen = generate_random_items( &mut universe, length, &mut gen );
	let transaction: Vec<Item> = chosen.into_iter()
	    .map( |item| Item::new( item, probability_distribution.sample( &mut gen )))
	    .collect();
	let transaction = Transaction::unweighted( transaction ).map_err( |err| err.to_string() )?;
	database.add( std::iter::once( transaction ));
    }
    Ok( database )
}

fn generate_random_items( universe: &mut [u64], length: usize, gen: &mut StdRng ) -> Vec<u64> {
    let m = universe.len();
    let mut chosen = Vec::with_capacity( length );
    for sample_count in 0 .. length.min( m ) {
	// squaring the uniform draw favours small indices
	let offset = ( gen.gen::<f64>().powi( 2 ) * ( m - sample_count ) as f64 ) as usize;
	let i = ( sample_count + offset ).min( m - 1 );
	chosen.push( universe[i] );
	// move i into sample count place to avoid drawing it again
	universe.swap( sample_count, i );
    }
    chosen.sort();
    chosen
}

fn prepare_logging() {
    let tracer = tracing_subscriber::fmt::fmt()
	.with_max_level( tracing_subscriber::filter::LevelFilter::INFO )
	.finish();
    tracing::subscriber::set_global_default( tracer ).unwrap();
}
