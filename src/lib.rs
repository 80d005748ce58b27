//! location2alert - Location novelty alerts from the usual areas of a user

mod engine;
mod error;
pub mod sources;

pub use engine::boundary::{build_hull, build_hulls, build_regions, Region};
pub use engine::clusterer::cluster;
pub use engine::distance::{meters_per_degree, to_angular_radius, DEFAULT_REFERENCE_LATITUDE};
pub use engine::evaluator::{GeofenceEvaluator, GeofenceOptions};
pub use engine::geofence::Geofence;
pub use engine::membership::{is_inside, test_region, RegionMatch};
pub use engine::point::{ClusterLabel, LabeledPoints, LocationPoint};
pub use error::{DegenerateGeometry, DegenerateReason, GeofenceError, SourceError};
pub use sources::{FieldsConfiguration, HistorySource, MemorySource};
