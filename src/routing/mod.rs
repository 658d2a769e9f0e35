//! Request routing for Atlas CORE.
//!
//! Maps request features to an ordered list of candidate models using a
//! capability classifier, with a static rule table as fallback.

mod classifier;
mod features;
mod router;
mod rules;

pub use classifier::{
    CapabilityScores, Classifier, ClassifierError, KeywordClassifier, RouteModelClassifier,
};
pub use features::RequestFeatures;
pub use router::{RouteSource, Router, RoutingDecision};
pub use rules::RuleTable;
