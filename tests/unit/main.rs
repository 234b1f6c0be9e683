//! Unit tests for individual components

#[path = "../common/mod.rs"]
mod common;
