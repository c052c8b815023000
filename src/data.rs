use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{MineError, MineResult};

mod itemset;

pub use itemset::Itemset;

/// Identifier of an item. Integer identifiers sort before string identifiers.
#[derive( Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash )]
pub enum ItemId {
    Int( u64 ),
    Str( Arc<str> ),
}

/// An item together with its existential probability in one transaction.
/// Identity and order only consider the identifier.
#[derive( Debug, Clone )]
pub struct Item {
    id: ItemId,
    probability: f64,
}

/// Identifier-sorted items without duplicates and the weight of the transaction.
#[derive( Debug, Clone, PartialEq )]
pub struct Transaction {
    items: Vec<Item>,
    weight: f64,
}

pub trait Database {

    /// All transactions in insertion order
    fn transactions( &self ) -> &[Transaction];

    /// Creates a sorted vector that contains all unique items in the data base
    fn create_universe( &self ) -> Vec<ItemId>;

    fn len( &self ) -> usize {
	self.transactions().len()
    }

    fn is_empty( &self ) -> bool {
	self.len() == 0
    }
}

/// Keeps all uncertain transactions in memory.
#[derive( Debug, Default )]
pub struct UncertainDatabase {
    transactions: Vec<Transaction>,
    /// one canonical item per identifier, first occurrence wins
    items: FxHashMap<ItemId, Item>,
}

impl ItemId {

    /// Integer identifier if the token consists of digits only, string identifier otherwise
    pub fn parse( token: &str ) -> ItemId {
	let is_numeric = !token.is_empty() && token.bytes().all( |b| b.is_ascii_digit() );
	if is_numeric {
	    // digits that overflow u64 keep their textual form
	    if let Ok( number ) = token.parse::<u64>() {
		return ItemId::Int( number );
	    }
	}
	ItemId::Str( Arc::from( token ))
    }
}

impl From<u64> for ItemId {
    fn from( number: u64 ) -> ItemId {
	ItemId::Int( number )
    }
}

impl From<&str> for ItemId {
    fn from( token: &str ) -> ItemId {
	ItemId::Str( Arc::from( token ))
    }
}

impl fmt::Display for ItemId {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
	match self {
	    ItemId::Int( number ) => write!( f, "{number}" ),
	    ItemId::Str( token ) => write!( f, "{token}" ),
	}
    }
}

impl serde::Serialize for ItemId {
    fn serialize<S>( &self, serializer: S ) -> Result<S::Ok, S::Error> where S: serde::Serializer {
	match self {
	    ItemId::Int( number ) => serializer.serialize_u64( *number ),
	    ItemId::Str( token ) => serializer.serialize_str( token ),
	}
    }
}

impl Item {
    pub fn new<I: Into<ItemId>>( id: I, probability: f64 ) -> Item {
	Item{ id: id.into(), probability }
    }

    pub fn id( &self ) -> &ItemId {
	&self.id
    }

    pub fn probability( &self ) -> f64 {
	self.probability
    }
}

impl PartialEq for Item {
    fn eq( &self, other: &Item ) -> bool {
	self.id == other.id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>( &self, state: &mut H ) {
	self.id.hash( state );
    }
}

impl PartialOrd for Item {
    fn partial_cmp( &self, other: &Item ) -> Option<Ordering> {
	Some( self.cmp( other ))
    }
}

impl Ord for Item {
    fn cmp( &self, other: &Item ) -> Ordering {
	self.id.cmp( &other.id )
    }
}

impl fmt::Display for Item {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
	write!( f, "{}({})", self.id, self.probability )
    }
}

impl Transaction {

    /// Sorts the items by identifier and validates probabilities, weight and uniqueness.
    /// Errors carry line 0; the loader attaches the real line.
    pub fn new( mut items: Vec<Item>, weight: f64 ) -> MineResult<Transaction> {
	if !weight.is_finite() || weight < 0.0 {
	    return Err( MineError::InvalidWeight { line: 0, weight } );
	}
	for item in &items {
	    if !( 0.0 ..= 1.0 ).contains( &item.probability ) {
		return Err( MineError::ProbabilityOutOfRange {
		    line: 0,
		    item: item.id.to_string(),
		    probability: item.probability,
		});
	    }
	}
	items.sort();
	if let Some( pair ) = items.windows( 2 ).find( |pair| pair[0] == pair[1] ) {
	    return Err( MineError::DuplicateItem { line: 0, item: pair[0].id.to_string() } );
	}
	Ok( Transaction{ items, weight } )
    }

    /// Transaction with the default weight of 1
    pub fn unweighted( items: Vec<Item> ) -> MineResult<Transaction> {
	Transaction::new( items, 1.0 )
    }

    pub fn items( &self ) -> &[Item] {
	&self.items
    }

    pub fn weight( &self ) -> f64 {
	self.weight
    }

    pub fn len( &self ) -> usize {
	self.items.len()
    }

    pub fn is_empty( &self ) -> bool {
	self.items.is_empty()
    }

    /// Existential probability of the item in this transaction, if present
    pub fn probability_of( &self, id: &ItemId ) -> Option<f64> {
	self.items.binary_search_by( |item| item.id.cmp( id ))
	    .ok()
	    .map( |index| self.items[ index ].probability )
    }
}

impl fmt::Display for Transaction {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
	let tokens: Vec<String> = self.items.iter().map( |item| item.to_string() ).collect();
	write!( f, "{}", tokens.join( " " ))?;
	if self.weight != 1.0 {
	    // the weight is attached to the last token, as in the input format
	    write!( f, "[{}]", self.weight )?;
	}
	Ok( () )
    }
}

impl Database for UncertainDatabase {

    fn transactions( &self ) -> &[Transaction] {
	&self.transactions
    }

    fn create_universe( &self ) -> Vec<ItemId> {
	let mut universe: Vec<ItemId> = self.items.keys().cloned().collect();
	universe.sort();
	universe
    }
}

impl <'a> IntoIterator for &'a UncertainDatabase {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter( self ) -> Self::IntoIter {
	self.transactions.iter()
    }
}

impl FromIterator<Transaction> for UncertainDatabase {
    fn from_iter<T: IntoIterator<Item = Transaction>>( transactions: T ) -> UncertainDatabase {
	let mut database = UncertainDatabase::new();
	database.add( transactions );
	database
    }
}

impl UncertainDatabase {

    pub fn new() -> UncertainDatabase {
	UncertainDatabase::default()
    }

    /// Adds every transaction produced by the iterator to the database
    pub fn add<Con>( &mut self, transactions: Con ) where Con: IntoIterator<Item = Transaction> {
	for transaction in transactions {
	    for item in transaction.items() {
		if !self.items.contains_key( item.id() ) {
		    self.items.insert( item.id().clone(), item.clone() );
		}
	    }
	    self.transactions.push( transaction );
	}
    }

    /// The first occurrence of the item in the data base
    pub fn canonical_item( &self, id: &ItemId ) -> Option<&Item> {
	self.items.get( id )
    }

    /// Number of distinct items
    pub fn item_count( &self ) -> usize {
	self.items.len()
    }
}
