use crate::*;
use crate::io::{PrettyFormatter, produce_itemset};

use super::{Pmfi, MiningStats};

/// Plain text report of a mining run
pub struct ReportFormatter {
    show_stats: bool,
    show_itemsets: bool,
}

impl PrettyFormatter<MiningResult> for ReportFormatter {

    fn format_pretty( &self, result: &MiningResult ) -> String {
	let mut output = String::new();

	if self.show_stats {
	    output = format_stats( &result.stats ).into_iter()
		.fold( output, join_lines );
	}

	if self.show_itemsets {
	    output = join_lines( output, "PMFIs:".to_string() );
	    output = result.itemsets.iter()
		.map( format_itemset )
		.fold( output, join_lines );
	}
	output
    }
}

fn format_stats( stats: &MiningStats ) -> Vec<String> {
    vec!(
	format!( "Total time ~ {} ms", stats.elapsed.as_millis() ),
	format!( "Transactions count: {}", stats.transaction_count ),
	format!( "Candidates count: {} in {} levels", stats.candidate_count, stats.level_count ),
	format!( "PMFIs count: {}", stats.confirmed_count ),
	format!( "Minimum support: {}  minimum probability: {}", stats.min_support, stats.min_probability ),
	format!( "Expectation bounds: [{:.4}, {:.4}]", stats.lower_bound, stats.upper_bound ),
    )
}

fn format_itemset( itemset: &Pmfi ) -> String {
    format!( "{}  {:.4}", produce_itemset( itemset.items.iter() ), itemset.expectation )
}

fn join_lines( mut accumulator: String, addition: String ) -> String {
    accumulator.push_str( addition.as_str() );
    accumulator.push( '\n' );
    accumulator
}

impl ReportFormatter {
    pub fn new() -> ReportFormatter {
	ReportFormatter{
	    show_stats: false,
	    show_itemsets: false,
	}
    }

    pub fn show_stats( &mut self ) { self.show_stats = true; }
    pub fn show_itemsets( &mut self ) { self.show_itemsets = true; }
}

impl Default for ReportFormatter {
    fn default() -> ReportFormatter {
	ReportFormatter::new()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn result() -> MiningResult {
	let mut result = MiningResult::default();
	result.itemsets.push( Pmfi{ items: vec!( ItemId::Int( 1 ), ItemId::from( "milk" )), expectation: 0.5 } );
	result.stats.transaction_count = 3;
	result.stats.confirmed_count = 1;
	result
    }

    #[test]
    fn test_empty_formatter() {
	assert_eq!( ReportFormatter::new().format_pretty( &result() ), "" );
    }

    #[test]
    fn test_itemsets_only() {
	let mut formatter = ReportFormatter::new();
	formatter.show_itemsets();
	assert_eq!( formatter.format_pretty( &result() ), "PMFIs:\n[1, milk]  0.5000\n" );
    }

    #[test]
    fn test_stats() {
	let mut formatter = ReportFormatter::new();
	formatter.show_stats();
	formatter.show_itemsets();
	let report = formatter.format_pretty( &result() );
	assert!( report.starts_with( "Total time ~ 0 ms\n" ));
	assert!( report.contains( "Transactions count: 3\n" ));
	assert!( report.contains( "PMFIs count: 1\n" ));
	assert!( report.ends_with( "[1, milk]  0.5000\n" ));
    }
}
