use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MineError, MineResult};
use crate::model::{Expectation, Weighting};

/// How level k candidates are built from level k-1
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum )]
#[serde( rename_all = "kebab-case" )]
pub enum Generator {
    /// Pairs sharing all but the last item
    #[default]
    Join,
    /// Every candidate extended by every known item
    Extension,
}

/// How the final itemsets are selected from the candidates
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum )]
#[serde( rename_all = "kebab-case" )]
pub enum Confirmation {
    /// Drops candidates with a one item extension that qualifies under the superset rule
    #[default]
    Maximal,
    /// FM test from the longest candidates down
    TopDown,
}

/// When a one item extension C' disqualifies candidate C in the maximal confirmation
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum )]
#[serde( rename_all = "kebab-case" )]
pub enum SupersetRule {
    /// E(C') > E(C) + slack
    #[default]
    ExceedsSlack,
    /// E(C') <= E(C) + slack
    WithinSlack,
}

/// Parameters of one mining run.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct MinerConfig {
    /// threshold s on the expected support
    pub min_support: f64,
    /// threshold p on the probability of being frequent
    pub min_probability: f64,
    /// longest itemset to generate, unbounded if None
    pub max_length: Option<usize>,
    pub generator: Generator,
    pub confirmation: Confirmation,
    pub expectation: Expectation,
    pub weighting: Weighting,
    /// singletons must also reach the lower bound
    pub bound_singletons: bool,
    pub superset_rule: SupersetRule,
    /// margin of the superset rule, the probability threshold if None
    pub slack: Option<f64>,
}

impl Default for MinerConfig {
    fn default() -> MinerConfig {
	MinerConfig {
	    min_support: 0.06,
	    min_probability: 0.6,
	    max_length: None,
	    generator: Generator::default(),
	    confirmation: Confirmation::default(),
	    expectation: Expectation::default(),
	    weighting: Weighting::default(),
	    bound_singletons: true,
	    superset_rule: SupersetRule::default(),
	    slack: None,
	}
    }
}

impl SupersetRule {
    /// Decides whether the superset's expectation disqualifies the subset
    pub fn excludes( &self, subset_expectation: f64, superset_expectation: f64, slack: f64 ) -> bool {
	match self {
	    SupersetRule::ExceedsSlack => superset_expectation > subset_expectation + slack,
	    SupersetRule::WithinSlack => superset_expectation <= subset_expectation + slack,
	}
    }
}

impl MinerConfig {

    pub fn new( min_support: f64, min_probability: f64 ) -> MinerConfig {
	MinerConfig{ min_support, min_probability, ..MinerConfig::default() }
    }

    /// Reads a configuration from a JSON file; absent keys keep their defaults
    pub fn from_json_file<P: AsRef<Path>>( path: P ) -> MineResult<MinerConfig> {
	let reader = BufReader::new( File::open( path )? );
	Ok( serde_json::from_reader( reader )? )
    }

    /// Rejects thresholds outside (0,1] and meaningless limits before any mining begins
    pub fn validate( &self ) -> MineResult<()> {
	check_threshold( "min_support", self.min_support )?;
	check_threshold( "min_probability", self.min_probability )?;
	if self.max_length == Some( 0 ) {
	    return Err( MineError::InvalidConfig( "max_length must be at least 1".to_string() ));
	}
	if let Some( slack ) = self.slack {
	    if !slack.is_finite() {
		return Err( MineError::InvalidConfig( format!( "slack {slack} is not finite" )));
	    }
	}
	Ok( () )
    }

    /// Margin used by the superset rule
    pub fn slack( &self ) -> f64 {
	self.slack.unwrap_or( self.min_probability )
    }

    pub fn set_max_length( &mut self, max: usize ) {
	self.max_length = Some( max );
    }

    pub fn set_generator( &mut self, generator: Generator ) {
	self.generator = generator;
    }

    pub fn set_confirmation( &mut self, confirmation: Confirmation ) {
	self.confirmation = confirmation;
    }

    pub fn set_expectation( &mut self, expectation: Expectation ) {
	self.expectation = expectation;
    }

    pub fn set_weighting( &mut self, weighting: Weighting ) {
	self.weighting = weighting;
    }

    pub fn set_superset_rule( &mut self, rule: SupersetRule ) {
	self.superset_rule = rule;
    }

    pub fn set_slack( &mut self, slack: f64 ) {
	self.slack = Some( slack );
    }
}

fn check_threshold( name: &'static str, value: f64 ) -> MineResult<()> {
    if value > 0.0 && value <= 1.0 {
	Ok( () )
    } else {
	Err( MineError::InvalidThreshold { name, value } )
    }
}
