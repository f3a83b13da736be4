//! perfprof-engine — maximum sustainable throughput under a latency SLO.
//!
//! For every (worker configuration, request type) pair of a workload, the
//! engine fetches benchmark measurements and classifies them against the
//! request type's TPOT ceiling.
//!
//! # Classification
//!
//! ```text
//! points sorted ascending by throughput (stable)
//!
//! no points                       → NO_DATA_FOUND          (0)
//! slo <  first.latency            → SLO_UNATTAINABLE       (0)
//! slo >= last.latency             → OK_USING_HIGHEST_RATE  (last.throughput)
//! first (p1, p2) with
//!   p1.latency <= slo < p2.latency → OK                    (linear interpolation)
//! slo == last.latency             → OK                     (last.throughput)
//! otherwise                       → INTERNAL_ERROR         (0)
//! ```
//!
//! Pairs are evaluated concurrently up to a configured bound. A fetch
//! failure aborts the whole run; the error for the lowest-index failing
//! pair is returned.

pub mod classify;
pub mod engine;

pub use classify::{Classification, classify};
pub use engine::ProfileEngine;
