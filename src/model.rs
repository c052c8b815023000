use serde::{Deserialize, Serialize};

use crate::*;

mod support;
mod bounds;
mod significance;

pub use support::{ItemSupports, Weighting, IndependenceModel, ExactModel, transaction_support};
pub use bounds::Bounds;
pub use significance::{FmTest, FmOutcome, normal_cdf, series_erf};

/// Expected support of an itemset and the variance of its support
#[derive( Debug, Clone, Copy, PartialEq )]
pub struct Estimate {
    pub expectation: f64,
    pub variance: f64,
}

/// Which model estimates the expected support of candidate itemsets
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum )]
#[serde( rename_all = "kebab-case" )]
pub enum Expectation {
    /// Combines single item supports assuming independence
    #[default]
    Independence,
    /// Scans the data base once per level and sums per-transaction probabilities
    Exact,
}

pub trait SupportModel {

    /// Runs the support scan for a freshly generated level of candidates
    fn accumulate( &self, level: &mut [Itemset] );

    /// Estimates expectation and variance of the support of the itemset
    fn estimate( &self, itemset: &Itemset ) -> Estimate;

    fn expectation( &self, itemset: &Itemset ) -> f64 {
	self.estimate( itemset ).expectation
    }
}

impl Estimate {
    pub fn new( expectation: f64, variance: f64 ) -> Estimate {
	Estimate{ expectation, variance }
    }
}
