//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod scripted_client;
pub mod socket_guard;
