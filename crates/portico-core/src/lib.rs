//! Core types shared by every Portico crate.
//!
//! - [`errors`]: the closed application error taxonomy
//! - [`envelope`]: the uniform JSON response envelope
//! - [`context`]: per-request identifier and principal
//! - [`pagination`]: page-based listing helpers

pub mod context;
pub mod envelope;
pub mod errors;
pub mod pagination;

pub use context::{REQUEST_ID_HEADER, RequestContext, RequestId, UserPrincipal};
pub use envelope::{ApiResponse, ErrorBody, Success};
pub use errors::{AppError, ErrorKind, ErrorReport, FieldError};
pub use pagination::{Page, PageInfo, PageRequest};
