//! Shared state and messaging between recognition tasks and the controller
//!
//! Recognition and polling run on the tokio runtime; their results travel
//! back to the controller thread as `ProbeEvent`s.

pub mod messages;
pub mod state;

pub use messages::{PollStop, ProbeEvent, RecognitionKind, RequestId, RequestOrigin};
pub use state::{ProbeState, EMPTY_LABEL};
