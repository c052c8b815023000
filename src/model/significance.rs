use std::f64::consts::PI;

use super::{Bounds, Estimate};

/// Terms below this magnitude end the error function series
const ERF_TOLERANCE: f64 = 1e-15;

/// Outcome of the FM test for one itemset
#[derive( Debug, Clone, Copy, PartialEq )]
pub enum FmOutcome {
    /// Expectation reached the upper bound, the normal approximation was skipped
    AboveUpperBound,
    /// Tail probability 1 - Phi(z) of the normal approximation
    Tail { probability: f64, frequent: bool },
    /// Variance is zero: frequent iff the expectation exceeds the support threshold
    Degenerate { frequent: bool },
    /// Variance is negative or NaN, or the series overflowed for an extreme z value
    Undefined,
}

/// Frequency test by estimation for fixed thresholds.
#[derive( Debug, Clone, Copy )]
pub struct FmTest {
    bounds: Bounds,
}

impl FmOutcome {
    pub fn is_frequent( &self ) -> bool {
	match self {
	    FmOutcome::AboveUpperBound => true,
	    FmOutcome::Tail { frequent, .. } => *frequent,
	    FmOutcome::Degenerate { frequent } => *frequent,
	    FmOutcome::Undefined => false,
	}
    }
}

impl FmTest {

    pub fn new( bounds: Bounds ) -> FmTest {
	FmTest{ bounds }
    }

    pub fn bounds( &self ) -> &Bounds {
	&self.bounds
    }

    /// Decides frequency from expectation and variance of the support
    pub fn evaluate( &self, estimate: Estimate ) -> FmOutcome {
	if self.bounds.confirms( estimate.expectation ) {
	    return FmOutcome::AboveUpperBound;
	}

	let min_support = self.bounds.min_support();
	if estimate.variance > 0.0 {
	    let z = ( min_support - estimate.expectation ) / estimate.variance.sqrt();
	    let probability = 1.0 - normal_cdf( z );
	    if probability.is_nan() {
		return FmOutcome::Undefined;
	    }
	    FmOutcome::Tail { probability, frequent: probability >= self.bounds.min_probability() }
	} else if estimate.variance == 0.0 {
	    FmOutcome::Degenerate { frequent: estimate.expectation > min_support }
	} else {
	    FmOutcome::Undefined
	}
    }

    /// Lower bound admission followed by the FM test
    pub fn is_frequent_by_estimation( &self, estimate: Estimate ) -> bool {
	self.bounds.admits( estimate.expectation ) && self.evaluate( estimate ).is_frequent()
    }
}

/// Cumulative distribution evaluated as 0.5 (1 + erf(x / sqrt(2 pi))) with the series below.
pub fn normal_cdf( x: f64 ) -> f64 {
    0.5 * ( 1.0 + series_erf( x / ( 2.0 * PI ).sqrt() ))
}

/// Alternating power series with term_0 = x and term_n = term_(n-1) (-x^2) / (n + 0.5),
/// summed while |term| exceeds the tolerance and scaled by 2 / sqrt(pi).
///
/// Large arguments overflow the intermediate terms long before they shrink again.
/// The sum has no value then and NaN is returned.
pub fn series_erf( x: f64 ) -> f64 {
    let mut sum = x;
    let mut term = x;
    let mut n = 1.0;

    while term.abs() > ERF_TOLERANCE {
	term *= -x * x / ( n + 0.5 );
	if !term.is_finite() {
	    return f64::NAN;
	}
	sum += term;
	n += 1.0;
    }
    2.0 * sum / PI.sqrt()
}
