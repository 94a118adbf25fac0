//! Background Tasks Module
//!
//! Optional maintenance tasks that run alongside a cache.
//!
//! # Tasks
//! - Expired entry purge: reclaims lapsed entries at configured intervals

mod purge;

pub use purge::spawn_purge_task;
