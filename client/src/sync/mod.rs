//! Job-list synchronization: the canonical job store and the push channel
//! that feeds it

pub mod api;
pub mod store;
pub mod stream;
