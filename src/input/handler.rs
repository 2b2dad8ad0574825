use crate::{
    core::config::{ClusteringConfig, InteractionConfig, ZoomLimits},
    core::geo::{LatLng, Point},
    core::viewport::{MapState, Viewport},
    input::events::{InputEvent, Key},
    input::gestures::{Gesture, GestureRecognizer},
    spatial::clustering::Marker,
    spatial::index::MarkerIndex,
};

/// What an input event asks the engine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// User gesture moved the camera
    Move(MapState),
    /// Press and release without drag at this canvas position
    Click(Point),
}

/// What a click landed on.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickTarget {
    Incident(String),
    /// A cluster, with the camera to fly to so it splits apart
    Cluster { ids: Vec<String>, zoom_to: MapState },
    Map(LatLng),
}

/// Turns host input into camera changes and clicks.
///
/// Owns no camera state itself: every call receives the current viewport and
/// answers with the new [`MapState`] to apply.
pub struct InteractionController {
    config: InteractionConfig,
    limits: ZoomLimits,
    gestures: GestureRecognizer,
    pinch_start_zoom: Option<f64>,
}

impl InteractionController {
    pub fn new(config: InteractionConfig, limits: ZoomLimits) -> Self {
        let gestures = GestureRecognizer::new(config.drag_threshold_px);
        Self {
            config,
            limits,
            gestures,
            pinch_start_zoom: None,
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn is_dragging(&self) -> bool {
        self.gestures.is_dragging()
    }

    /// Handle an input event against the current viewport.
    pub fn handle_event(&mut self, event: &InputEvent, viewport: &Viewport) -> Vec<Action> {
        match event {
            InputEvent::Wheel { position, delta_y } => {
                self.wheel(*position, *delta_y, viewport).into_iter().collect()
            }
            InputEvent::Key { key, in_text_input } => {
                if *in_text_input {
                    return Vec::new();
                }
                self.key(*key, viewport).into_iter().collect()
            }
            _ => {
                // gestures chain within one event, so later ones see earlier moves
                let mut current = *viewport;
                let mut actions = Vec::new();
                for gesture in self.gestures.process(event) {
                    if let Some(action) = self.gesture(gesture, &current) {
                        if let Action::Move(state) = action {
                            current.state = state;
                        }
                        actions.push(action);
                    }
                }
                actions
            }
        }
    }

    fn gesture(&mut self, gesture: Gesture, viewport: &Viewport) -> Option<Action> {
        match gesture {
            Gesture::Pan { delta } => Some(Action::Move(viewport.panned(delta, &self.limits))),
            Gesture::PinchStart => {
                self.pinch_start_zoom = Some(viewport.state.zoom);
                None
            }
            Gesture::Pinch { scale, pan, .. } => {
                let start_zoom = *self.pinch_start_zoom.get_or_insert(viewport.state.zoom);
                if !(scale > 0.0) {
                    return None;
                }
                let zoom = start_zoom + scale.log2();
                let zoomed = Viewport::new(
                    viewport.zoomed(zoom, None, &self.limits),
                    viewport.width,
                    viewport.height,
                );
                Some(Action::Move(zoomed.panned(pan, &self.limits)))
            }
            Gesture::Click { position } => Some(Action::Click(position)),
            Gesture::End => {
                self.pinch_start_zoom = None;
                None
            }
        }
    }

    fn wheel(&self, position: Point, delta_y: f64, viewport: &Viewport) -> Option<Action> {
        let step = if delta_y < 0.0 {
            self.config.wheel_zoom_step
        } else if delta_y > 0.0 {
            -self.config.wheel_zoom_step
        } else {
            return None;
        };
        let focus = self.config.zoom_to_cursor.then_some(position);
        self.zoom_to(viewport, viewport.state.zoom + step, focus)
    }

    fn key(&self, key: Key, viewport: &Viewport) -> Option<Action> {
        let pan = self.config.key_pan_px;
        // arrows reveal the map in their direction, so content moves the other way
        let delta = match key {
            Key::ArrowUp => Point::new(0.0, pan),
            Key::ArrowDown => Point::new(0.0, -pan),
            Key::ArrowLeft => Point::new(pan, 0.0),
            Key::ArrowRight => Point::new(-pan, 0.0),
            Key::Plus | Key::Equals => {
                return self.zoom_to(viewport, viewport.state.zoom + self.config.key_zoom_step, None)
            }
            Key::Minus | Key::Underscore => {
                return self.zoom_to(viewport, viewport.state.zoom - self.config.key_zoom_step, None)
            }
            Key::Other(_) => return None,
        };
        Some(Action::Move(viewport.panned(delta, &self.limits)))
    }

    fn zoom_to(&self, viewport: &Viewport, zoom: f64, focus: Option<Point>) -> Option<Action> {
        let state = viewport.zoomed(zoom, focus, &self.limits);
        (state != viewport.state).then_some(Action::Move(state))
    }

    /// Hit tests a click against the markers drawn in the last frame.
    pub fn resolve_click(
        &self,
        position: Point,
        viewport: &Viewport,
        index: &MarkerIndex,
        markers: &[Marker],
    ) -> ClickTarget {
        match index.hit_test(&position).and_then(|i| markers.get(i)) {
            Some(Marker::Pin(pin)) => ClickTarget::Incident(pin.id.clone()),
            Some(Marker::Cluster(cluster)) => ClickTarget::Cluster {
                ids: cluster.member_ids.clone(),
                zoom_to: MapState {
                    lat: cluster.lat,
                    lng: cluster.lng,
                    zoom: viewport.state.zoom + self.config.cluster_zoom_step,
                }
                .normalized(&self.limits),
            },
            None => ClickTarget::Map(viewport.pixel_to_lat_lng(&position)),
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionConfig::default(), ZoomLimits::default())
    }
}

/// Hit radius used for a marker: the click tolerance or the marker's own
/// drawn radius, whichever is larger.
pub fn hit_radius(marker: &Marker, clustering: &ClusteringConfig, interaction: &InteractionConfig) -> f64 {
    marker.radius(clustering).max(interaction.hit_tolerance_px)
}
