use serde::Serialize;
use tracing::warn;

/// Chernoff style bounds on the expected support, fixed for one pair of thresholds.
#[derive( Debug, Clone, Copy, PartialEq, Serialize )]
pub struct Bounds {
    min_support: f64,
    min_probability: f64,
    /// below this expectation an itemset cannot be frequent with the required probability
    lower: f64,
    /// from this expectation on an itemset is frequent without further testing
    upper: f64,
}

impl Bounds {

    pub fn new( min_support: f64, min_probability: f64 ) -> Bounds {
	let lower = lower_expectation( min_support, min_probability );
	let upper = upper_expectation( min_support, min_probability );
	if !lower.is_finite() || !upper.is_finite() {
	    warn!( "Bounds for support {min_support} and probability {min_probability} are not finite: [{lower}, {upper}]" );
	}
	Bounds{ min_support, min_probability, lower, upper }
    }

    pub fn min_support( &self ) -> f64 {
	self.min_support
    }

    pub fn min_probability( &self ) -> f64 {
	self.min_probability
    }

    pub fn lower( &self ) -> f64 {
	self.lower
    }

    pub fn upper( &self ) -> f64 {
	self.upper
    }

    /// Expectation reaches the lower bound, so the itemset stays a candidate
    pub fn admits( &self, expectation: f64 ) -> bool {
	expectation >= self.lower
    }

    /// Expectation reaches the upper bound, so the itemset is frequent
    pub fn confirms( &self, expectation: f64 ) -> bool {
	expectation >= self.upper
    }
}

/// s - ln(p) - sqrt( ln(1/p) (ln(1/p) - 8 s ln(p)) ) / 2
pub fn lower_expectation( min_support: f64, min_probability: f64 ) -> f64 {
    let ln_p = min_probability.ln();
    let ln_inverse = ( 1.0 / min_probability ).ln();
    min_support - ln_p - ( ln_inverse * ( ln_inverse - 8.0 * min_support * ln_p )).sqrt() / 2.0
}

/// s - ln(1-p) + sqrt( ln(1-p) (ln(1-p) - 2 s ln(1-p)) )
pub fn upper_expectation( min_support: f64, min_probability: f64 ) -> f64 {
    let ln_q = ( 1.0 - min_probability ).ln();
    min_support - ln_q + ( ln_q * ( ln_q - 2.0 * min_support * ln_q )).sqrt()
}
