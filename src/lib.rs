//! # execumate
//!
//! A persistent, hierarchical shelf of shell commands. Commands live in per-scope
//! catalogs (global and workspace, plus an in-memory temporary scope), can be nested in
//! groups, reordered by drag-and-drop style moves, launched as managed processes and
//! parametrized with optional variables at launch time.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod state;
pub mod system;
