//! Status Aggregator — a user's verification status derived from their
//! document records.

pub mod aggregator;
pub mod policy;
pub mod status;

pub use aggregator::StatusAggregator;
pub use policy::ResubmissionPolicy;
pub use status::{aggregate, StatusChange, VerificationProfile, VerificationStatus};
