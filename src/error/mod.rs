//! Error handling for the client.
//!
//! - **Error categories**: the transport / HTTP / stream / parse taxonomy
//!   orchestrators use to decide between aborting and degrading one item
//! - **Stream errors**: failures reported inside an NDJSON body
//! - **Unified error type**: `ClientError` consolidates everything an
//!   orchestration can fail with
//!
//! Malformed stream lines have no variant: the decoder drops and counts
//! them.
//!
//! | Category | Source | In a batch |
//! |----------|--------|------------|
//! | Transport | request never answered | aborts (top-level request) |
//! | Http | non-2xx status | inline item error |
//! | Stream | `error` field in an event | inline item error |
//! | Parse | unreadable buffered JSON | inline item error |

mod category;
mod client_error;
mod stream;

pub use category::ErrorCategory;
pub use client_error::ClientError;
pub use stream::StreamError;

/// Type alias for Results using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
