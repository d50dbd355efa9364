//! Video selection engine for a continuously re-rendered video feed page.
//!
//! Watches a live page model for newly rendered video cards, mounts a
//! selection control on each one, keeps a deduplicated selection in step
//! with the host's element recycling, and renders the selection for export.

pub mod config;
pub mod dom;
pub mod engine;
pub mod export;
pub mod extract;
pub mod messaging;
pub mod selection;
pub mod storage;

#[cfg(feature = "backend")]
pub mod net;

#[cfg(test)]
mod testing;
