//! HTTP API handlers
//!
//! All data endpoints act on the scope named by the `x-scope` header.

pub mod articles;
pub mod generation;
pub mod health;
pub mod scope;
pub mod upload;

pub use articles::article_routes;
pub use generation::generation_routes;
pub use health::health_routes;
pub use scope::{RequestScope, SCOPE_HEADER};
pub use upload::upload_routes;
