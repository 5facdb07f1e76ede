//! Client-side chat plumbing for the Sable backend.
//!
//! - `backend`: generated query/mutation/action endpoints over HTTP.
//! - `transport` + `accumulator`: the `/stream-chat` reply as a growing string.
//! - `reconcile`: drops the streaming placeholder once the persisted reply shows up.
//! - `milestones`: one-shot usage notices at 50/75/90 percent.
//! - `session`: ties the above together for one chat.

pub mod accumulator;
pub mod backend;
pub mod error;
pub mod milestones;
pub mod reconcile;
pub mod session;
pub mod transport;

pub use backend::BackendClient;
pub use error::ClientError;
pub use session::{ChatSession, SessionEvent, TurnOptions};
pub use transport::ChatTransport;
