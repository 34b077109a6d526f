//! Asynchronous connection lifecycle core for request/response servers.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │                   SERVER                     │
//!                  │                                              │
//!   TCP connect    │  ┌──────────┐   ┌───────────┐   ┌─────────┐  │
//!   ───────────────┼─▶│   net    │──▶│connection │──▶│exchange │  │
//!                  │  │ listener │   │  driver   │   │ traits  │  │
//!                  │  └──────────┘   └─────┬─────┘   └─────────┘  │
//!                  │                       │                      │
//!                  │        deadline ──────┤────── buffer         │
//!                  │                       │                      │
//!                  │  ┌────────────────────┴───────────────────┐  │
//!                  │  │           Cross-Cutting Concerns       │  │
//!                  │  │  config   observability   lifecycle    │  │
//!                  │  └────────────────────────────────────────┘  │
//!                  └──────────────────────────────────────────────┘
//! ```
//!
//! Each accepted connection runs on its own task, which sequences the
//! exchange: header read → optional body read → dispatch → response
//! write → close or keep-alive reuse. Every phase is guarded by a single
//! deadline; every failure path converges on one idempotent close.

// Core subsystems
pub mod config;
pub mod connection;
pub mod exchange;
pub mod net;
pub mod server;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use connection::{ConnectionDriver, ConnectionError, ConnectionId, Phase};
pub use lifecycle::Shutdown;
pub use server::Server;
