//! Single integration test binary.
//!
//! - scenarios: end-to-end grid behaviour driven through events and ticks
//! - properties: invariants checked over generated datasets
//! - loading: dataset files through the loader worker

mod loading;
mod properties;
mod scenarios;
