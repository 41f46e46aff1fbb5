//! The what-if engine: income aggregation, insurance estimates,
//! deductions, tax amounts, and the donation limit, all emitting an
//! audit trace line by line.

pub mod common;
pub mod deductions;
pub mod donation;
pub mod engine;
pub mod income;
pub mod insurance;
pub mod recorder;
pub mod tax;

pub use engine::calculate_all;
pub use recorder::TraceRecorder;
