//! Download ledger: the persisted cross-run record of which
//! `(order, content tag)` pairs were already fetched.
//!
//! The in-memory [`Ledger`] owns the dedup rules; a [`LedgerStore`] loads and
//! saves it, so the rules can be tested without touching storage.

pub mod error;
pub mod store;
pub mod types;

pub use store::{JsonLedgerStore, LedgerStore};
pub use types::Ledger;
