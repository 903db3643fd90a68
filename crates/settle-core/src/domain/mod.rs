//! Domain model (ids, status sets, wait specifications, poll outcomes, tags).

pub mod ids;
pub mod outcome;
pub mod status;
pub mod tags;
pub mod wait_spec;

pub use ids::ResourceId;
pub use outcome::PollOutcome;
pub use status::StatusSet;
pub use tags::{Tags, merge_tags};
pub use wait_spec::{WaitSpec, WaitSpecBuilder};
