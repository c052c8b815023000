use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::Level;

use crate::Loggable;
use super::ItemId;

/// Candidate itemset: strictly increasing identifiers plus the statistics accumulated by a support scan.
/// Equality, hashing and order only consider the identifiers.
#[derive( Debug, Clone )]
pub struct Itemset {
    items: Vec<ItemId>,
    /// sum of per-transaction probabilities, only ever increased
    expected_support: f64,
    /// sum of per-transaction variances, only ever increased
    support_variance: f64,
}

impl Itemset {

    /// Creates the itemset in canonical order, dropping repeated identifiers
    pub fn new( mut items: Vec<ItemId> ) -> Itemset {
	items.sort();
	items.dedup();
	Itemset{ items, expected_support: 0.0, support_variance: 0.0 }
    }

    pub fn singleton( item: ItemId ) -> Itemset {
	Itemset::new( vec!( item ))
    }

    /// Pre: items are strictly increasing
    fn from_sorted( items: Vec<ItemId> ) -> Itemset {
	debug_assert!( items.windows( 2 ).all( |pair| pair[0] < pair[1] ));
	Itemset{ items, expected_support: 0.0, support_variance: 0.0 }
    }

    pub fn items( &self ) -> &[ItemId] {
	&self.items
    }

    pub fn len( &self ) -> usize {
	self.items.len()
    }

    pub fn is_empty( &self ) -> bool {
	self.items.is_empty()
    }

    pub fn contains( &self, item: &ItemId ) -> bool {
	self.items.binary_search( item ).is_ok()
    }

    pub fn expected_support( &self ) -> f64 {
	self.expected_support
    }

    pub fn support_variance( &self ) -> f64 {
	self.support_variance
    }

    /// Adds the contribution of one transaction to the accumulated statistics
    pub fn increase_support_by( &mut self, expectation: f64, variance: f64 ) {
	debug_assert!( expectation >= 0.0 && variance >= 0.0 );
	self.expected_support += expectation;
	self.support_variance += variance;
    }

    /// If both itemsets have the same size, agree on all but the last identifier
    /// and this last identifier precedes the other's, returns the other's last identifier.
    pub fn join_suffix<'a>( &self, other: &'a Itemset ) -> Option<&'a ItemId> {
	if self.len() != other.len() || self.is_empty() {
	    return None;
	}
	let split = self.len() - 1;
	if self.items[ .. split ] != other.items[ .. split ] {
	    return None;
	}
	if self.items[ split ] < other.items[ split ] {
	    Some( &other.items[ split ] )
	} else {
	    None
	}
    }

    /// Itemset with the item appended. Pre: item is greater than every item in this set
    pub fn with_suffix( &self, item: ItemId ) -> Itemset {
	let mut items = Vec::with_capacity( self.len() + 1 );
	items.extend( self.items.iter().cloned() );
	items.push( item );
	Itemset::from_sorted( items )
    }

    /// Itemset with the item inserted at its place, None if the item is already contained
    pub fn extended( &self, item: &ItemId ) -> Option<Itemset> {
	match self.items.binary_search( item ) {
	    Ok( _ ) => None,
	    Err( position ) => {
		let mut items = self.items.clone();
		items.insert( position, item.clone() );
		Some( Itemset::from_sorted( items ))
	    }
	}
    }

    /// Identifiers of the subset that lacks the item at index
    pub fn without( &self, index: usize ) -> Vec<ItemId> {
	self.items.iter().enumerate()
	    .filter( |(position, _)| *position != index )
	    .map( |(_, item)| item.clone() )
	    .collect()
    }

    /// All subsets with exactly one item removed
    pub fn immediate_subsets( &self ) -> impl Iterator<Item = Vec<ItemId>> + '_ {
	( 0 .. self.len() ).map( move |index| self.without( index ))
    }

    pub fn is_subset_of( &self, other: &Itemset ) -> bool {
	if self.len() > other.len() {
	    return false;
	}
	// both sequences are sorted, so one merge pass suffices
	let mut others = other.items.iter();
	'outer: for item in &self.items {
	    for candidate in others.by_ref() {
		match candidate.cmp( item ) {
		    Ordering::Less => continue,
		    Ordering::Equal => continue 'outer,
		    Ordering::Greater => return false,
		}
	    }
	    return false;
	}
	true
    }
}

impl PartialEq for Itemset {
    fn eq( &self, other: &Itemset ) -> bool {
	self.items == other.items
    }
}

impl Eq for Itemset {}

impl Hash for Itemset {
    fn hash<H: Hasher>( &self, state: &mut H ) {
	self.items.hash( state );
    }
}

impl PartialOrd for Itemset {
    fn partial_cmp( &self, other: &Itemset ) -> Option<Ordering> {
	Some( self.cmp( other ))
    }
}

/// Lexicographic order on the identifiers
impl Ord for Itemset {
    fn cmp( &self, other: &Itemset ) -> Ordering {
	self.items.cmp( &other.items )
    }
}

impl fmt::Display for Itemset {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
	let tokens: Vec<String> = self.items.iter().map( |item| item.to_string() ).collect();
	write!( f, "[{}]", tokens.join( ", " ))
    }
}

impl Loggable for Itemset {
    fn log( &self, message: &str, level: Level ) {
	event_at!( level, "{} {} (support {:.3})", message, self, self.expected_support );
    }
}
