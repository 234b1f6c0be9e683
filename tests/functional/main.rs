//! Functional tests driving the full router

#[path = "../common/mod.rs"]
mod common;

mod api_test;
mod generation_test;
mod rate_limit_test;
