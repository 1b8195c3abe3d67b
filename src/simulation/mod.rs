pub mod config;
pub mod engine;
pub mod kpi;
pub mod monte_carlo;
pub mod sampler;
