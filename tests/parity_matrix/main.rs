//! Parity Matrix Test Suite
//!
//! End-to-end runs of the harness over real local directories: the build
//! output and the cluster filesystem are separate temp directories, the
//! client artifact is copied between them, and every run writes its parts
//! to disk before the verifier reads them back.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test parity_matrix
//!
//! # Only divergence scenarios
//! cargo test --test parity_matrix failures::
//! ```

mod common;

mod config_file;
mod failures;
mod matrix;
