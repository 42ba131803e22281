//! Route index, pipeline executor, step executors, validation, and the
//! request dispatcher that together turn a parsed `Site` into a running
//! HTTP application (§4.5–§4.12).

pub mod context;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod request_context;
pub mod session;
pub mod site_load;
pub mod steps;
pub mod templates;
pub mod validation;

pub use context::RuntimeContext;
pub use error::DispatchError;
