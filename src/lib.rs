//! NutriLens: photo-to-nutrition analysis service and the session ledger
//! that consumes its results.

pub mod analysis;
pub mod app;
pub mod client;
pub mod config;
pub mod inference;
pub mod ledger;
pub mod state;
pub mod storage;
