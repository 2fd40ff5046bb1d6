pub mod cache;
pub mod http;
pub mod middleware;
pub mod pagination;
pub mod validation;
