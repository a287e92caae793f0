// src/core/mod.rs

//! The catalog domain: trees, persistence, execution and the pieces the CLI
//! builds on.

pub mod catalog;
pub mod execution;
pub mod identity;
pub mod input_flow;
pub mod node_resolver;
pub mod paths;
pub mod persistence;
pub mod tree_display;
pub mod tree_store;
