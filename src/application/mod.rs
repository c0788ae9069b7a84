//! Application services: purge planning, orchestration and triggers.

pub mod error;
pub mod planner;
pub mod ports;
pub mod purge;
pub mod trigger;
