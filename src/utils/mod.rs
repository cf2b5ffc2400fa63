//! Utilities for logging, table conversion and file output

pub mod arrow;
pub mod io;
pub mod logging;
