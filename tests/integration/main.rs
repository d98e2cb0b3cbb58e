//! Integration tests with mock HTTP server

mod mock_server;

mod error_handling;
mod streaming;
