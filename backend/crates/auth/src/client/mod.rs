//! Backend Service Client and the client-side auth state built on it

pub mod backend;
pub mod context;
pub mod error;
pub mod flow;
pub mod http;
pub mod noop;
pub mod protected;

pub use backend::{AuthEvent, BackendClient, LocalBackendClient, UploadedImage};
pub use context::{AuthContext, AuthState};
pub use error::{ClientError, ClientResult};
pub use flow::{MfaChallengeFlow, RetryReason, SubmitOutcome};
pub use http::HttpBackendClient;
pub use noop::NoopClient;
pub use protected::{GateEvaluation, ProtectedArea};
