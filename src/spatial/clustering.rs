//! Greedy screen-space clustering of incident points.
//!
//! Points are visited in input order. Each point not yet taken becomes a seed
//! and gathers every untaken point within the pixel radius, itself included.
//! Groups of two or more become a [`Cluster`] at the centroid; lone points
//! stay as [`Pin`]s. The result depends on input order, which is accepted.

use crate::core::config::ClusteringConfig;
use crate::core::geo::{IncidentPoint, IncidentStatus, LatLng, Point};
use crate::core::viewport::Viewport;
use rstar::primitives::GeomWithData;
use rstar::RTree;

/// A single incident drawn on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: IncidentStatus,
    /// Canvas position this frame.
    pub position: Point,
}

/// Aggregate of nearby incidents, rebuilt every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Centroid of the members.
    pub lat: f64,
    pub lng: f64,
    pub count: usize,
    pub member_ids: Vec<String>,
    /// Most urgent member status.
    pub status: IncidentStatus,
    /// Canvas position of the point that started the group.
    pub seed: Point,
    /// Canvas position of the centroid.
    pub position: Point,
}

/// What the marker pass draws: a pin or a cluster bubble.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    Pin(Pin),
    Cluster(Cluster),
}

impl Marker {
    pub fn position(&self) -> Point {
        match self {
            Marker::Pin(pin) => pin.position,
            Marker::Cluster(cluster) => cluster.position,
        }
    }

    pub fn lat_lng(&self) -> LatLng {
        match self {
            Marker::Pin(pin) => LatLng::new(pin.lat, pin.lng),
            Marker::Cluster(cluster) => LatLng::new(cluster.lat, cluster.lng),
        }
    }

    pub fn status(&self) -> IncidentStatus {
        match self {
            Marker::Pin(pin) => pin.status,
            Marker::Cluster(cluster) => cluster.status,
        }
    }

    /// Number of incidents behind this marker.
    pub fn count(&self) -> usize {
        match self {
            Marker::Pin(_) => 1,
            Marker::Cluster(cluster) => cluster.count,
        }
    }

    /// Drawn radius in pixels; grows with the logarithm of the member count.
    pub fn radius(&self, config: &ClusteringConfig) -> f64 {
        match self {
            Marker::Pin(_) => config.pin_radius_px,
            Marker::Cluster(cluster) => cluster_radius(cluster.count, config),
        }
    }
}

pub fn cluster_radius(count: usize, config: &ClusteringConfig) -> f64 {
    config.base_radius_px + config.growth_px * (count.max(1) as f64).ln()
}

type Indexed = GeomWithData<[f64; 2], usize>;

/// Groups `points` for the given viewport.
///
/// Non-renderable points are dropped. At or above `config.max_zoom` every
/// point comes back as a pin.
pub fn cluster_points(
    points: &[IncidentPoint],
    viewport: &Viewport,
    config: &ClusteringConfig,
) -> Vec<Marker> {
    let projected: Vec<(&IncidentPoint, Point)> = points
        .iter()
        .filter(|p| p.is_renderable())
        .map(|p| (p, viewport.lat_lng_to_pixel(&p.lat_lng())))
        .collect();

    let pin = |p: &IncidentPoint, position: Point| {
        Marker::Pin(Pin {
            id: p.id.clone(),
            lat: p.lat,
            lng: p.lng,
            status: p.status,
            position,
        })
    };

    if viewport.state.zoom >= config.max_zoom {
        return projected.into_iter().map(|(p, pos)| pin(p, pos)).collect();
    }

    let tree: RTree<Indexed> = RTree::bulk_load(
        projected
            .iter()
            .enumerate()
            .map(|(i, (_, pos))| GeomWithData::new([pos.x, pos.y], i))
            .collect(),
    );
    let radius_2 = config.radius_px * config.radius_px;
    let mut taken = vec![false; projected.len()];
    let mut markers = Vec::new();

    for (i, (point, seed)) in projected.iter().enumerate() {
        if taken[i] {
            continue;
        }
        let mut group: Vec<usize> = tree
            .locate_within_distance([seed.x, seed.y], radius_2)
            .map(|entry| entry.data)
            .filter(|&j| !taken[j])
            .collect();
        group.sort_unstable();

        if group.len() < 2 {
            taken[i] = true;
            markers.push(pin(point, *seed));
            continue;
        }

        for &j in &group {
            taken[j] = true;
        }
        let n = group.len() as f64;
        let lat = group.iter().map(|&j| projected[j].0.lat).sum::<f64>() / n;
        let lng = group.iter().map(|&j| projected[j].0.lng).sum::<f64>() / n;
        let status = IncidentStatus::most_urgent(group.iter().map(|&j| projected[j].0.status))
            .unwrap_or_default();

        markers.push(Marker::Cluster(Cluster {
            lat,
            lng,
            count: group.len(),
            member_ids: group.iter().map(|&j| projected[j].0.id.clone()).collect(),
            status,
            seed: *seed,
            position: viewport.lat_lng_to_pixel(&LatLng::new(lat, lng)),
        }));
    }

    markers
}
