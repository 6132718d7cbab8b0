//! HTTP/1.1 + WebDAV-façade server variant (spec §4.4, §4.5).

pub mod body;
pub mod dispatch;
pub mod framing;
pub mod request;
pub mod response;
pub mod server;
pub mod transfer;

pub use request::{Method, Request};
pub use response::Response;
pub use server::HttpServer;
