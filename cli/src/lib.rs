//! plotbatch-cli library - exposes command modules for unit tests

pub mod commands;
pub mod term;
