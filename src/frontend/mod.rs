pub mod handlers;
pub mod headers;
pub mod templates;
