//! Region building and membership engine

pub mod boundary;
pub mod clusterer;
pub mod distance;
pub mod evaluator;
pub mod geofence;
pub mod membership;
pub mod point;

#[cfg(test)]
mod tests;
