//! Local store for Preptrack

mod connection;
mod migrations;
mod store;

pub use connection::Database;
pub use store::{LocalStore, LAST_MODIFIED_KEY, USER_ID_KEY};
