//! Integration tests with a mock HTTP backend and an in-memory capability provider

mod dispatch;
mod fake_provider;
mod mock_server;
mod turn_flow;
