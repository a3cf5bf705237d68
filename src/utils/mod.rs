pub mod cache;
pub mod currency;
pub mod middleware;
pub mod retry;
pub mod serde_helpers;
pub mod validation;
