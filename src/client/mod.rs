//! REST client for the school backend

pub mod http;

pub use http::*;
