// src/utils/mod.rs
pub mod archive;
pub mod command;
pub mod fs;
pub mod logging;
pub mod template;
