//! Tool provider servers reached over JSON-RPC/HTTP.

pub mod protocol;
pub mod server;

pub use server::HttpToolServer;
