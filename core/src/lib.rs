//! Randomized instance generation for resource-exchange optimization
//! problems: request groups, supply groups, nodes and arcs sampled from
//! configurable distributions and flattened into solver parameters.

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod exec_params;
pub mod incrementer;
pub mod params;
pub mod request_builder;
pub mod rng;
pub mod sampler;
pub mod solver;
pub mod space;
pub mod store;
pub mod supply_builder;
pub mod types;
