//! exmon-core: synchronized monitor state.
//! Owns the server-reported state tree, the deep-merge overlay applied to
//! every partial update, and the store that publishes snapshots to
//! presentation code. No I/O lives here.

pub mod error;
pub mod store;
pub mod tree;

pub use error::MalformedUpdate;
pub use store::{MergeOutcome, StateSnapshot, StateStore};
pub use tree::{StateTree, merge, merge_into, parse_update};
