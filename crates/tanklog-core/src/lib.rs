//! tanklog-core - Core library for tanklog
//!
//! This crate contains the API clients, session state, secure-storage
//! abstraction, and request pipeline shared by all tanklog interfaces.

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod records;
pub mod session;
pub mod store;
pub mod token;
pub mod util;

pub use error::{Error, Result};
pub use records::{FuelReceiptRecord, RecordPage};
pub use session::AuthState;
pub use store::TokenStore;
