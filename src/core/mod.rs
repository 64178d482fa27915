//! Core business logic, independent of any transport.
//!
//! Every mutating operation takes the acting [`auth::Principal`] and a sea-orm
//! connection, and returns [`crate::errors::Result`].

pub mod amount;
pub mod auth;
pub mod budget;
pub mod catalog;
pub mod client;
pub mod inventory;
pub mod lifecycle;
pub mod locker;
pub mod lookup;
pub mod order;
pub mod pagination;
pub mod technician;
