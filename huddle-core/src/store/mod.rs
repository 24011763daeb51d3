//! Typed queries against the `agent` and `meeting` tables.
//!
//! Every query that touches user-owned rows carries a `user_id` equality
//! filter; a mutation matching zero rows comes back as `None` and the caller
//! decides how to surface it. No application-level locking — consistency
//! relies on Postgres row-level update semantics.

pub mod agents;
pub mod meetings;
