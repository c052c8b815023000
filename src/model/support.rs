use std::cmp::Ordering;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::*;

/// Whether transaction weights scale the probabilities
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum )]
#[serde( rename_all = "kebab-case" )]
pub enum Weighting {
    #[default]
    Weighted,
    Unweighted,
}

/// Expected support of every single item in the data base
#[derive( Debug, Clone, Default )]
pub struct ItemSupports {
    supports: FxHashMap<ItemId, f64>,
}

/// Estimates itemsets from single item supports. Needs no scan per level.
#[derive( Debug, Clone )]
pub struct IndependenceModel {
    supports: ItemSupports,
}

/// Sums the probability of the whole itemset over all transactions.
pub struct ExactModel<'a, D> {
    data: &'a D,
    weighting: Weighting,
}

impl Weighting {
    pub fn factor( &self, transaction: &Transaction ) -> f64 {
	match self {
	    Weighting::Weighted => transaction.weight(),
	    Weighting::Unweighted => 1.0,
	}
    }
}

impl ItemSupports {

    /// Sums probability (times weight) of every item over one pass of the data base
    pub fn compute<D: Database>( data: &D, weighting: Weighting ) -> ItemSupports {
	let mut supports: FxHashMap<ItemId, f64> = FxHashMap::default();
	for transaction in data.transactions() {
	    let factor = weighting.factor( transaction );
	    for item in transaction.items() {
		*supports.entry( item.id().clone() ).or_insert( 0.0 ) += item.probability() * factor;
	    }
	}
	ItemSupports{ supports }
    }

    /// Expected support of the item, zero for unknown items
    pub fn get( &self, id: &ItemId ) -> f64 {
	self.supports.get( id ).copied().unwrap_or( 0.0 )
    }

    pub fn len( &self ) -> usize {
	self.supports.len()
    }

    pub fn is_empty( &self ) -> bool {
	self.supports.is_empty()
    }

    /// All items with a support, in identifier order
    pub fn items( &self ) -> Vec<ItemId> {
	let mut items: Vec<ItemId> = self.supports.keys().cloned().collect();
	items.sort();
	items
    }

    pub fn iter( &self ) -> impl Iterator<Item = (&ItemId, f64)> {
	self.supports.iter().map( |(id, support)| (id, *support) )
    }

    /// Product of the single item supports
    pub fn union_term( &self, items: &[ItemId] ) -> f64 {
	items.iter().map( |id| self.get( id )).product()
    }

    /// Sum of item supports corrected by (|X| - 1) times the union term
    pub fn expectation( &self, items: &[ItemId] ) -> f64 {
	let sum: f64 = items.iter().map( |id| self.get( id )).sum();
	let correction = items.len().saturating_sub( 1 ) as f64 * self.union_term( items );
	sum - correction
    }

    /// Sum of E(i) * (1 - E(i)) over the items
    pub fn variance( &self, items: &[ItemId] ) -> f64 {
	items.iter()
	    .map( |id| {
		let support = self.get( id );
		support * ( 1.0 - support )
	    }).sum()
    }
}

impl FromIterator<(ItemId, f64)> for ItemSupports {
    fn from_iter<T: IntoIterator<Item = (ItemId, f64)>>( supports: T ) -> ItemSupports {
	ItemSupports{ supports: supports.into_iter().collect() }
    }
}

/// Probability that all items occur in the transaction, None if one of them is absent.
/// Both sequences are sorted, so they are walked once.
pub fn transaction_support( items: &[ItemId], transaction: &Transaction ) -> Option<f64> {
    let mut product = 1.0;
    let mut entries = transaction.items().iter();
    'outer: for id in items {
	for entry in entries.by_ref() {
	    match entry.id().cmp( id ) {
		Ordering::Less => continue,
		Ordering::Equal => {
		    product *= entry.probability();
		    continue 'outer;
		},
		Ordering::Greater => return None,
	    }
	}
	return None;
    }
    Some( product )
}

impl IndependenceModel {
    pub fn new( supports: ItemSupports ) -> IndependenceModel {
	IndependenceModel{ supports }
    }

    pub fn supports( &self ) -> &ItemSupports {
	&self.supports
    }
}

impl SupportModel for IndependenceModel {

    fn accumulate( &self, _level: &mut [Itemset] ) {}

    fn estimate( &self, itemset: &Itemset ) -> Estimate {
	Estimate::new( self.supports.expectation( itemset.items() ), self.supports.variance( itemset.items() ))
    }
}

impl <'a, D: Database + Sync> ExactModel<'a, D> {
    pub fn new( data: &'a D, weighting: Weighting ) -> ExactModel<'a, D> {
	ExactModel{ data, weighting }
    }
}

impl <'a, D: Database + Sync> SupportModel for ExactModel<'a, D> {

    /// One scan over the data base; each candidate owns its accumulator
    fn accumulate( &self, level: &mut [Itemset] ) {
	let transactions = self.data.transactions();
	let weighting = self.weighting;
	level.par_iter_mut().for_each( |candidate| {
	    for transaction in transactions {
		if let Some( probability ) = transaction_support( candidate.items(), transaction ) {
		    let factor = weighting.factor( transaction );
		    candidate.increase_support_by( factor * probability, factor * factor * probability * ( 1.0 - probability ));
		}
	    }
	});
	trace!( "Accumulated support of {} candidates over {} transactions", level.len(), transactions.len() );
    }

    fn estimate( &self, itemset: &Itemset ) -> Estimate {
	Estimate::new( itemset.expected_support(), itemset.support_variance() )
    }
}
