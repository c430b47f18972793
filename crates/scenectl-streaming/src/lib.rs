//! `StreamingPipeline` builder (C13): a closed-allow-list `gst-launch-1.0`
//! argv builder, so no validated parameter can ever reach a shell.

pub mod allowlist;
pub mod builder;
pub mod spec;

pub use builder::build_argv;
pub use spec::{Encoder, Protocol, StreamingPipelineSpec};
