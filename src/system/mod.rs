//! # System Interaction Layer
//!
//! Boundary between the catalog core and the operating system.
//!
//! ## Modules
//!
//! - **`launcher`**: spawns commands through the configured shell, tracks their child
//!   processes and reports the ones that exit on their own.
//! - **`picker`**: dialoguer front-ends for the variable picker and the input wizards.
//! - **`settings`**: loads `settings.toml`, writing the defaults on first use.
//! - **`storage`**: file-backed catalog documents with atomic rewrites.

pub mod launcher;
pub mod picker;
pub mod settings;
pub mod storage;
