//! Filesystem implementations for shuffle-parity
//!
//! This crate implements the `FileSystem` collaborator trait with:
//! - LocalFileSystem: local disk, optionally rooted under a base directory
//! - MemoryFileSystem: shared in-memory tree with open accounting, for tests
//! - copy_between: stream a file from one filesystem into another
//!
//! Every directory listing and byte stream the verifier consumes comes
//! through one of these, so swapping the substrate never touches the
//! comparison logic.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod copy;
pub mod local;
pub mod memory;

pub use copy::copy_between;
pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;
