pub mod clustering;
pub mod index;

pub use clustering::{cluster_points, cluster_radius, Cluster, Marker, Pin};
pub use index::{HitTarget, MarkerIndex};
