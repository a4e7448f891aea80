pub mod jsonrpc;
pub mod models;
pub mod response;
pub mod routes;
