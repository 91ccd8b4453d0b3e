//! User account access for the auth flows.
//!
//! - `model.rs`: [`UserRecord`](model::UserRecord) and its public response view
//! - `store.rs`: the [`UserStore`](store::UserStore) trait with Postgres and in-memory backends

pub mod model;
pub mod store;
