// src/cli/handlers/mod.rs

//! One module per CLI action.

pub mod add;
pub mod commons;
pub mod delete;
pub mod edit;
pub mod group;
pub mod reparent;
pub mod run;
pub mod session;
pub mod stop;
pub mod tree;
