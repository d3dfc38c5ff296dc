//! Command handlers module.
//!
//! Turns library results into user-facing output and exit codes:
//! - `render.rs`: the render command and its error report

mod render;

pub use render::cmd_render;
