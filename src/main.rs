use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use probmine::*;
use probmine::io::PrettyFormatter;
use probmine::miner::{Generator, Confirmation, SupersetRule, ReportFormatter};
use probmine::model::{Expectation, Weighting};

/// Probable maximal frequent itemsets in uncertain transaction data
#[derive( Parser )]
#[command( version, about )]
struct Cli {
    /// Log debug output
    #[arg( short, long, global = true )]
    verbose: bool,

    #[command( subcommand )]
    command: Command,
}

#[derive( Subcommand )]
enum Command {
    /// Mine an uncertain data base
    Mine( MineArgs ),
    /// Add random probabilities to a file of plain transactions
    Inject {
	input: PathBuf,
	output: PathBuf,
	#[arg( long, default_value_t = 0 )]
	seed: u64,
	/// Also attach a random weight to every transaction
	#[arg( long )]
	weights: bool,
    },
    /// Keep a random fraction of the lines of a file
    Sample {
	input: PathBuf,
	output: PathBuf,
	#[arg( long )]
	fraction: f64,
	#[arg( long, default_value_t = 0 )]
	seed: u64,
    },
}

#[derive( Args )]
struct MineArgs {
    input: PathBuf,
    /// JSON configuration; flags override its values
    #[arg( long )]
    config: Option<PathBuf>,
    #[arg( short = 's', long )]
    min_support: Option<f64>,
    #[arg( short = 'p', long )]
    min_probability: Option<f64>,
    #[arg( long )]
    max_length: Option<usize>,
    #[arg( long, value_enum )]
    generator: Option<Generator>,
    #[arg( long, value_enum )]
    confirmation: Option<Confirmation>,
    #[arg( long, value_enum )]
    expectation: Option<Expectation>,
    #[arg( long, value_enum )]
    weighting: Option<Weighting>,
    #[arg( long, value_enum )]
    superset_rule: Option<SupersetRule>,
    #[arg( long, allow_negative_numbers = true )]
    slack: Option<f64>,
    /// Do not require singletons to reach the lower bound
    #[arg( long )]
    no_singleton_bound: bool,
    /// Write the text report here instead of stdout
    #[arg( long )]
    report: Option<PathBuf>,
    /// Write the result as JSON
    #[arg( long )]
    json: Option<PathBuf>,
}

impl MineArgs {
    fn to_config( &self ) -> MineResult<MinerConfig> {
	let mut config = match &self.config {
	    Some( path ) => MinerConfig::from_json_file( path )?,
	    None => MinerConfig::default(),
	};
	if let Some( min_support ) = self.min_support { config.min_support = min_support; }
	if let Some( min_probability ) = self.min_probability { config.min_probability = min_probability; }
	if let Some( max_length ) = self.max_length { config.set_max_length( max_length ); }
	if let Some( generator ) = self.generator { config.set_generator( generator ); }
	if let Some( confirmation ) = self.confirmation { config.set_confirmation( confirmation ); }
	if let Some( expectation ) = self.expectation { config.set_expectation( expectation ); }
	if let Some( weighting ) = self.weighting { config.set_weighting( weighting ); }
	if let Some( rule ) = self.superset_rule { config.set_superset_rule( rule ); }
	if let Some( slack ) = self.slack { config.set_slack( slack ); }
	if self.no_singleton_bound { config.bound_singletons = false; }
	Ok( config )
    }
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    prepare_logging( cli.verbose );

    match cli.command {
	Command::Mine( args ) => mine( &args ).map_err( |err| err.to_string() ),
	Command::Inject { input, output, seed, weights } => {
	    io::inject_probabilities( &input, &output, seed, weights ).map_err( |err| err.to_string() )?;
	    Ok( () )
	},
	Command::Sample { input, output, fraction, seed } => {
	    io::sample_transactions( &input, &output, fraction, seed ).map_err( |err| err.to_string() )?;
	    Ok( () )
	},
    }
}

fn mine( args: &MineArgs ) -> MineResult<()> {
    let config = args.to_config()?;
    config.validate()?;

    let (database, report) = io::read_database( &args.input )?;
    if !report.skipped.is_empty() {
	info!( "{} lines were skipped", report.skipped_count() );
    }

    let mut miner = PmfiMiner::new( config );
    let result = miner.mine( &database )?;

    let mut formatter = ReportFormatter::new();
    formatter.show_stats();
    formatter.show_itemsets();
    match &args.report {
	Some( path ) => io::write_report( &result, &formatter, path )?,
	None => print!( "{}", formatter.format_pretty( &result )),
    }
    if let Some( path ) = &args.json {
	io::write_json( &result, path )?;
    }
    Ok( () )
}

fn prepare_logging( verbose: bool ) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let tracer = tracing_subscriber::fmt::fmt()
	.with_max_level( level )
	.with_writer( std::io::stderr )
	.finish();
    if let Err( err ) = tracing::subscriber::set_global_default( tracer ) {
	eprintln!( "Logging is unavailable: {err}" );
    }
}
