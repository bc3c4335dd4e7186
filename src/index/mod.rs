//! Index handles, writer sessions and snapshot readers
//!
//! One [`IndexHandle`] owns a directory. Mutations go through an
//! [`IndexWriterSession`] that holds the single writer lock; searches read
//! an immutable [`IndexSnapshot`] published after each commit, so readers
//! never block on the writer.

mod handle;
mod session;
mod snapshot;

pub use handle::IndexHandle;
pub use session::IndexWriterSession;
pub use snapshot::{IndexReader, IndexSnapshot};
