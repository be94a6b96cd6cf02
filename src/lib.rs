//! Library exports for the bookmarking service
//!
//! This module exposes internal components for testing and potential library usage.

pub mod database;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
pub mod search;
pub mod tags;
pub mod workflow;
