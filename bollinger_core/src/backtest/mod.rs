pub mod metrics;
pub mod position;
pub mod simulator;
