use std::path::Path;
use std::fs::File;
use std::io::{BufReader, BufRead, BufWriter, Write};
use std::sync::OnceLock;

use rand::prelude::*;
use rand::rngs::StdRng;
use regex::Regex;
use tracing::{info, warn};

use crate::*;

/// Converts a structure into a string
pub trait PrettyFormatter<T> {
    fn format_pretty( &self, object: &T ) -> String;
}

/// Outcome of loading a data base: how many transactions were kept and why the others were not
#[derive( Debug, Default )]
pub struct LoadReport {
    pub loaded: usize,
    /// data errors, each carrying its line number
    pub skipped: Vec<MineError>,
}

/// Splits `itemId(probability)` or `itemId(probability)[weight]` tokens
pub struct TransactionParser {
    token: Regex,
}

impl LoadReport {
    pub fn skipped_count( &self ) -> usize {
	self.skipped.len()
    }
}

impl TransactionParser {

    pub fn new() -> TransactionParser {
	let token = Regex::new( r"^([^()\[\]]+)\(([^()]*)\)(?:\[([^\[\]]*)\])?$" ).expect( "token pattern is valid" );
	TransactionParser{ token }
    }

    /// None for empty lines and for lines starting with `#`, `%` or `@`
    pub fn parse_line( &self, line: &str ) -> MineResult<Option<Transaction>> {
	let line = line.trim();
	if line.is_empty() || line.starts_with( ['#', '%', '@'] ) {
	    return Ok( None );
	}

	let mut items = Vec::new();
	let mut weight: Option<f64> = None;
	for token in line.split_whitespace() {
	    let captures = self.token.captures( token )
		.ok_or_else( || malformed( format!( "token '{token}' is not of the form id(probability)[weight]" )))?;
	    let id = ItemId::parse( &captures[1] );
	    let probability: f64 = captures[2].trim().parse()
		.map_err( |_| malformed( format!( "probability of token '{token}' is not a number" )))?;
	    if let Some( text ) = captures.get( 3 ) {
		let value: f64 = text.as_str().trim().parse()
		    .map_err( |_| malformed( format!( "weight of token '{token}' is not a number" )))?;
		match weight {
		    Some( previous ) if previous != value => {
			return Err( malformed( format!( "conflicting weights {previous} and {value}" )));
		    },
		    _ => weight = Some( value ),
		}
	    }
	    items.push( Item::new( id, probability ));
	}
	Transaction::new( items, weight.unwrap_or( 1.0 )).map( Some )
    }
}

impl Default for TransactionParser {
    fn default() -> TransactionParser {
	TransactionParser::new()
    }
}

fn malformed( reason: String ) -> MineError {
    MineError::MalformedTransactionLine{ line: 0, reason }
}

fn shared_parser() -> &'static TransactionParser {
    static PARSER: OnceLock<TransactionParser> = OnceLock::new();
    PARSER.get_or_init( TransactionParser::new )
}

/// Parses one input line; errors carry line 0
pub fn parse_transaction_line( line: &str ) -> MineResult<Option<Transaction>> {
    shared_parser().parse_line( line )
}

/// Reads an uncertain data base. Lines with data errors are skipped and reported,
/// I/O errors abort the load.
pub fn read_database<P: AsRef<Path>>( path: P ) -> MineResult<(UncertainDatabase, LoadReport)> {
    let reader = BufReader::new( File::open( path.as_ref() )? );
    let parser = shared_parser();
    let mut database = UncertainDatabase::new();
    let mut report = LoadReport::default();

    for (index, line) in reader.lines().enumerate() {
	let line = line?;
	match parser.parse_line( &line ) {
	    Ok( Some( transaction )) => {
		database.add( std::iter::once( transaction ));
		report.loaded += 1;
	    },
	    Ok( None ) => {},
	    Err( error ) if error.is_data_error() => {
		let error = error.at_line( index + 1 );
		warn!( "Skipping transaction: {error}" );
		report.skipped.push( error );
	    },
	    Err( error ) => return Err( error ),
	}
    }
    info!( "Loaded {} transactions with {} items from {}, skipped {}",
	   report.loaded, database.item_count(), path.as_ref().display(), report.skipped_count() );
    Ok( (database, report) )
}

/// Creates `[a, b, c]` from an iterator over identifiers
pub fn produce_itemset<'a, I: Iterator<Item = &'a ItemId>>( items: I ) -> String {
    let tokens: Vec<String> = items.map( |item| item.to_string() ).collect();
    format!( "[{}]", tokens.join( ", " ))
}

/// Writes a serializeable object to a file
pub fn write_json<S: serde::Serialize, P: AsRef<Path>>( object: &S, path: P ) -> MineResult<()> {
    let writer = BufWriter::new( File::create( path )? );
    serde_json::to_writer_pretty( writer, object )?;
    Ok( () )
}

/// Writes the text produced by the formatter to a file
pub fn write_report<T, F: PrettyFormatter<T>, P: AsRef<Path>>( object: &T, formatter: &F, path: P ) -> MineResult<()> {
    let mut file = File::create( path )?;
    write!( file, "{}", formatter.format_pretty( object ))?;
    Ok( () )
}

/// Turns a file with one transaction of plain identifiers per line into an uncertain data base.
/// Every identifier gets a uniform random probability, and with `weights` every line a random weight.
/// Returns the number of transactions written.
pub fn inject_probabilities<P: AsRef<Path>, Q: AsRef<Path>>( input: P, output: Q, seed: u64, weights: bool ) -> MineResult<usize> {
    let reader = BufReader::new( File::open( input )? );
    let mut writer = BufWriter::new( File::create( output )? );
    let mut rng = StdRng::seed_from_u64( seed );
    let mut written = 0;

    for (index, line) in reader.lines().enumerate() {
	let line = line?;
	if line.trim().is_empty() {
	    continue;
	}
	let mut tokens = Vec::new();
	for token in line.split_whitespace() {
	    if token.contains( ['(', ')', '[', ']'] ) {
		return Err( MineError::MalformedTransactionLine {
		    line: index + 1,
		    reason: format!( "identifier '{token}' already carries annotations" ),
		});
	    }
	    let probability: f64 = rng.gen();
	    tokens.push( format!( "{token}({probability:.2})" ));
	}
	let mut transaction = tokens.join( " " );
	if weights {
	    let weight: f64 = rng.gen();
	    transaction.push_str( &format!( "[{weight:.2}]" ));
	}
	writeln!( writer, "{transaction}" )?;
	written += 1;
    }
    writer.flush()?;
    info!( "Injected probabilities into {written} transactions" );
    Ok( written )
}

/// Keeps a random fraction of the lines of a file. Returns the number of lines kept.
pub fn sample_transactions<P: AsRef<Path>, Q: AsRef<Path>>( input: P, output: Q, fraction: f64, seed: u64 ) -> MineResult<usize> {
    if !( 0.0 ..= 1.0 ).contains( &fraction ) {
	return Err( MineError::InvalidConfig( format!( "sample fraction {fraction} is outside [0,1]" )));
    }
    let reader = BufReader::new( File::open( input )? );
    let mut lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
    let keep = ( lines.len() as f64 * fraction ) as usize;

    let mut rng = StdRng::seed_from_u64( seed );
    lines.shuffle( &mut rng );
    lines.truncate( keep );

    let mut writer = BufWriter::new( File::create( output )? );
    for line in &lines {
	writeln!( writer, "{line}" )?;
    }
    writer.flush()?;
    info!( "Kept {keep} lines" );
    Ok( keep )
}

#[cfg(test)]
mod test {

    use std::path::PathBuf;

    use super::*;

    fn temp_path( name: &str ) -> PathBuf {
	std::env::temp_dir().join( format!( "probmine-{}-{name}", std::process::id() ))
    }

    fn write_file( name: &str, content: &str ) -> PathBuf {
	let path = temp_path( name );
	std::fs::write( &path, content ).unwrap();
	path
    }

    #[test]
    fn test_parse_line() {
	let transaction = parse_transaction_line( "2(0.5) 1(0.25) milk(1)" ).unwrap().unwrap();
	assert_eq!( transaction.len(), 3 );
	assert_eq!( transaction.weight(), 1.0 );
	assert_eq!( transaction.items()[0].id(), &ItemId::Int( 1 ));
	assert_eq!( transaction.probability_of( &ItemId::from( "milk" )), Some( 1.0 ));
    }

    #[test]
    fn test_parse_weight() {
	let transaction = parse_transaction_line( "1(0.5)[2.5] 2(0.4)" ).unwrap().unwrap();
	assert_eq!( transaction.weight(), 2.5 );
	let same = parse_transaction_line( "1(0.5)[2] 2(0.4)[2.0]" ).unwrap().unwrap();
	assert_eq!( same.weight(), 2.0 );
	assert!( matches!( parse_transaction_line( "1(0.5)[2] 2(0.4)[3]" ),
			   Err( MineError::MalformedTransactionLine { .. } )));
	assert!( matches!( parse_transaction_line( "1(0.5)[-1]" ), Err( MineError::InvalidWeight { .. } )));
    }

    #[test]
    fn test_skipped_lines() {
	for line in ["", "   ", "# comment", "% meta", "@attribute"] {
	    assert!( parse_transaction_line( line ).unwrap().is_none(), "'{line}' was parsed" );
	}
    }

    #[test]
    fn test_malformed_lines() {
	for line in ["1 2 3", "1(0.5", "(0.5)", "1(abc)", "1(0.5)[x]", "1(0.5)2(0.4)"] {
	    let error = parse_transaction_line( line ).unwrap_err();
	    assert!( matches!( error, MineError::MalformedTransactionLine { .. } ), "'{line}' gave {error}" );
	}
	assert!( matches!( parse_transaction_line( "1(1.5)" ), Err( MineError::ProbabilityOutOfRange { .. } )));
	assert!( matches!( parse_transaction_line( "1(0.5) 1(0.4)" ), Err( MineError::DuplicateItem { .. } )));
    }

    #[test]
    fn test_display_parses_back() {
	let transaction = parse_transaction_line( "3(0.25) x(0.5)[4]" ).unwrap().unwrap();
	let again = parse_transaction_line( &transaction.to_string() ).unwrap().unwrap();
	assert_eq!( transaction, again );
    }

    #[test]
    fn test_read_database() {
	let path = write_file( "read.txt", "# header\n1(0.8) 2(0.5)\n1(0.9) 3(x)\n\n2(0.6) 3(0.3)\n2(0.6) 2(0.3)\n" );
	let (database, report) = read_database( &path ).unwrap();
	std::fs::remove_file( &path ).unwrap();

	assert_eq!( database.len(), 2 );
	assert_eq!( report.loaded, 2 );
	assert_eq!( report.skipped_count(), 2 );
	assert!( matches!( report.skipped[0], MineError::MalformedTransactionLine { line: 3, .. } ));
	assert!( matches!( report.skipped[1], MineError::DuplicateItem { line: 6, .. } ));
	assert_eq!( database.create_universe(), vec!( ItemId::Int( 1 ), ItemId::Int( 2 ), ItemId::Int( 3 )));
    }

    #[test]
    fn test_missing_file() {
	let result = read_database( temp_path( "does-not-exist.txt" ));
	assert!( matches!( result, Err( MineError::Io( _ ))));
    }

    #[test]
    fn test_inject_probabilities() {
	let input = write_file( "inject-in.txt", "1 2 3\n\n4 5\n" );
	let output = temp_path( "inject-out.txt" );
	assert_eq!( inject_probabilities( &input, &output, 7, true ).unwrap(), 2 );

	let (database, report) = read_database( &output ).unwrap();
	let content = std::fs::read_to_string( &output ).unwrap();
	std::fs::remove_file( &input ).unwrap();
	std::fs::remove_file( &output ).unwrap();

	assert_eq!( report.skipped_count(), 0 );
	assert_eq!( database.len(), 2 );
	assert_eq!( database.transactions()[0].len(), 3 );
	// probabilities are printed with two decimals
	let first = content.lines().next().unwrap();
	assert!( first.starts_with( "1(0." ) || first.starts_with( "1(1.00)" ), "{first}" );
	assert!( first.ends_with( ']' ));
    }

    #[test]
    fn test_inject_is_seeded() {
	let input = write_file( "seeded-in.txt", "1 2 3\n4 5\n" );
	let first = temp_path( "seeded-first.txt" );
	let second = temp_path( "seeded-second.txt" );
	inject_probabilities( &input, &first, 11, false ).unwrap();
	inject_probabilities( &input, &second, 11, false ).unwrap();
	let first_content = std::fs::read_to_string( &first ).unwrap();
	let second_content = std::fs::read_to_string( &second ).unwrap();
	for path in [&input, &first, &second] {
	    std::fs::remove_file( path ).unwrap();
	}
	assert_eq!( first_content, second_content );
    }

    #[test]
    fn test_sample_transactions() {
	let content: String = ( 0 .. 10 ).map( |number| format!( "{number}(0.5)\n" )).collect();
	let input = write_file( "sample-in.txt", &content );
	let output = temp_path( "sample-out.txt" );
	assert_eq!( sample_transactions( &input, &output, 0.4, 3 ).unwrap(), 4 );

	let kept = std::fs::read_to_string( &output ).unwrap();
	std::fs::remove_file( &input ).unwrap();
	std::fs::remove_file( &output ).unwrap();

	let lines: Vec<&str> = kept.lines().collect();
	assert_eq!( lines.len(), 4 );
	assert!( lines.iter().all( |line| content.contains( line )));
	assert!( matches!( sample_transactions( &input, &output, 1.5, 3 ), Err( MineError::InvalidConfig( _ ))));
    }

    #[test]
    fn test_produce_itemset() {
	let items = vec!( ItemId::Int( 4 ), ItemId::from( "b" ));
	assert_eq!( produce_itemset( items.iter() ), "[4, b]" );
	assert_eq!( produce_itemset( std::iter::empty() ), "[]" );
    }
}
