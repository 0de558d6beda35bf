pub mod error;
pub mod upload;
pub mod session;
pub mod handlers;
pub mod handlers_auth;
pub mod handlers_acne;
pub mod routes;
