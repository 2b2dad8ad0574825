use crate::core::geo::{LatLng, Point};
use crate::core::viewport::MapState;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Raw input forwarded by the host, in canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Primary button pressed
    MouseDown { position: Point },
    /// Pointer moved, pressed or not
    MouseMove { position: Point },
    /// Primary button released
    MouseUp { position: Point },
    /// Pointer left the canvas; ends any drag
    MouseLeave,
    /// Scroll wheel; negative `delta_y` scrolls up and zooms in
    Wheel { position: Point, delta_y: f64 },
    /// Touch events (multi-touch). `touches` lists the changed touches.
    Touch {
        event_type: TouchEventType,
        touches: Vec<TouchPoint>,
    },
    /// Keyboard input. `in_text_input` is set when focus sits in an editable
    /// field, in which case the map leaves the key alone.
    Key { key: Key, in_text_input: bool },
}

/// Types of touch events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchEventType {
    Start,
    Move,
    End,
    Cancel,
}

/// Individual touch point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Point,
}

impl TouchPoint {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

/// Keys the map reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Plus,
    Equals,
    Minus,
    Underscore,
    Other(u32),
}

impl Key {
    /// Maps a typed character to a key.
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Key::Plus,
            '=' => Key::Equals,
            '-' => Key::Minus,
            '_' => Key::Underscore,
            other => Key::Other(other as u32),
        }
    }
}

impl InputEvent {
    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::MouseDown { position }
            | InputEvent::MouseMove { position }
            | InputEvent::MouseUp { position }
            | InputEvent::Wheel { position, .. } => Some(*position),
            InputEvent::Touch { touches, .. } => touches.first().map(|t| t.position),
            _ => None,
        }
    }

    /// Checks if this is a keyboard event
    pub fn is_keyboard_event(&self) -> bool {
        matches!(self, InputEvent::Key { .. })
    }
}

/// Events the engine reports back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Click on empty map
    MapClick { lat_lng: LatLng },
    /// Click on a single incident pin
    IncidentClick { id: String },
    /// Click on a cluster; carries the member ids
    ClusterClick { ids: Vec<String> },
    /// Camera settled on a new state during a rendered frame
    MapStateChange { state: MapState },
}

/// Receives map events. All methods default to doing nothing.
pub trait MapListener {
    fn on_map_click(&mut self, _lat_lng: LatLng) {}

    fn on_incident_click(&mut self, _id: &str) {}

    fn on_cluster_click(&mut self, _ids: &[String]) {}

    fn on_map_state_change(&mut self, _state: &MapState) {}
}

/// Routes `event` to the matching listener method.
pub fn dispatch(listener: &mut dyn MapListener, event: &MapEvent) {
    match event {
        MapEvent::MapClick { lat_lng } => listener.on_map_click(*lat_lng),
        MapEvent::IncidentClick { id } => listener.on_incident_click(id),
        MapEvent::ClusterClick { ids } => listener.on_cluster_click(ids),
        MapEvent::MapStateChange { state } => listener.on_map_state_change(state),
    }
}

/// Listener that forwards every event into a channel, for hosts that poll.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: Sender<MapEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, Receiver<MapEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: MapEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("map event receiver dropped");
        }
    }
}

impl MapListener for ChannelListener {
    fn on_map_click(&mut self, lat_lng: LatLng) {
        self.send(MapEvent::MapClick { lat_lng });
    }

    fn on_incident_click(&mut self, id: &str) {
        self.send(MapEvent::IncidentClick { id: id.to_string() });
    }

    fn on_cluster_click(&mut self, ids: &[String]) {
        self.send(MapEvent::ClusterClick { ids: ids.to_vec() });
    }

    fn on_map_state_change(&mut self, state: &MapState) {
        self.send(MapEvent::MapStateChange { state: *state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_event_position() {
        let down = InputEvent::MouseDown {
            position: Point::new(10.0, 20.0),
        };
        assert_eq!(down.position(), Some(Point::new(10.0, 20.0)));

        let touch = InputEvent::Touch {
            event_type: TouchEventType::Start,
            touches: vec![TouchPoint::new(1, 3.0, 4.0)],
        };
        assert_eq!(touch.position(), Some(Point::new(3.0, 4.0)));
        assert_eq!(InputEvent::MouseLeave.position(), None);
    }

    #[test]
    fn test_key_from_char() {
        assert_eq!(Key::from_char('+'), Key::Plus);
        assert_eq!(Key::from_char('_'), Key::Underscore);
        assert_eq!(Key::from_char('a'), Key::Other('a' as u32));
    }

    #[test]
    fn test_channel_listener_forwards() {
        let (mut listener, rx) = ChannelListener::new();
        dispatch(&mut listener, &MapEvent::IncidentClick { id: "i-1".into() });
        dispatch(
            &mut listener,
            &MapEvent::ClusterClick {
                ids: vec!["a".into(), "b".into()],
            },
        );

        let events: Vec<MapEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], MapEvent::IncidentClick { id: "i-1".into() });
    }

    #[test]
    fn test_input_event_serde() {
        let event = InputEvent::Key {
            key: Key::ArrowLeft,
            in_text_input: false,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: InputEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
