//! Server-side wiring for the TableSync binary: configuration loading and
//! HTTP bootstrap. The protocol itself lives in the `tablesync-*` crates.

pub mod bootstrap;
pub mod config;
