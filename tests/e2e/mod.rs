//! E2E test harness: in-process session service wired to a real client

#![allow(dead_code)]

pub mod handlers;
pub mod harness;

pub use handlers::*;
pub use harness::*;
