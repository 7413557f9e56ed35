//! Remote platform adapters: JSON API, submission tool, and web session

pub mod api;
pub mod cli;
pub mod session;
pub mod web;

pub use api::ApiClient;
pub use cli::{SubmissionTool, ToolOutput, is_rate_limited_output, parse_retry_after, parse_status_output};
pub use session::{FileSessionStore, RemoteSession, RemoteTestSummary, SessionCookie, SessionRecord, SessionStore};
pub use web::WebSession;
