//! Audio composition: filter graph, external tool execution, probing.

pub mod engine;
pub mod executor;
pub mod graph;
pub mod probe;

pub use engine::{CompositionEngine, CompositionError, CompositionJob, JobState};
pub use executor::{
    CommandExecutor, CommandOutput, ExecError, RecordedCall, ScriptedExecutor,
    SystemCommandExecutor,
};
pub use graph::{Filter, FilterGraph, Stage, meditation_graph};
pub use probe::{ProbeError, probe_duration};
