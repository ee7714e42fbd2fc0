// Job engine - independent of the command-line front end

pub mod core;
pub mod probe;
pub mod validate;
pub mod worker;

pub use core::*;
pub use probe::{ProbedDuration, build_probe_cmd, parse_probe_output, probe_duration};
pub use worker::{JobEngine, JobHandle};
