//! Pointer and touch state machines.
//!
//! The recognizer turns raw [`InputEvent`]s into [`Gesture`]s without knowing
//! anything about the camera. A press that moves less than the drag threshold
//! before release is a click; anything further is a pan. Two fingers form a
//! pinch measured against the finger distance when the second finger landed.

use crate::{
    core::geo::Point,
    input::events::{InputEvent, TouchEventType, TouchPoint},
};
use fxhash::FxHashMap as HashMap;

/// Different types of gestures that can be recognized
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Content moved by `delta` pixels since the previous pan
    Pan { delta: Point },
    /// Two fingers just formed a pinch
    PinchStart,
    /// `scale` is the current finger distance over the distance at pinch start;
    /// `pan` is how far the finger midpoint moved since the previous update
    Pinch { scale: f64, center: Point, pan: Point },
    /// Press and release without dragging
    Click { position: Point },
    /// A drag or pinch ended
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MouseState {
    Idle,
    Pressed { start: Point },
    Dragging { last: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TouchState {
    Idle,
    Pressed { start: Point },
    Panning { last: Point },
    Pinching { start_distance: f64, last_center: Point },
}

/// Gesture recognizer that processes input events and detects gestures
pub struct GestureRecognizer {
    drag_threshold: f64,
    mouse: MouseState,
    touch: TouchState,
    active_touches: HashMap<u64, Point>,
}

impl GestureRecognizer {
    pub fn new(drag_threshold: f64) -> Self {
        Self {
            drag_threshold,
            mouse: MouseState::Idle,
            touch: TouchState::Idle,
            active_touches: HashMap::default(),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mouse, MouseState::Dragging { .. })
            || matches!(self.touch, TouchState::Panning { .. } | TouchState::Pinching { .. })
    }

    /// Processes one input event; keyboard and wheel events yield nothing.
    pub fn process(&mut self, event: &InputEvent) -> Vec<Gesture> {
        let mut out = Vec::new();
        match event {
            InputEvent::MouseDown { position } => {
                self.mouse = MouseState::Pressed { start: *position };
            }
            InputEvent::MouseMove { position } => self.mouse_move(*position, &mut out),
            InputEvent::MouseUp { position } => {
                match self.mouse {
                    MouseState::Pressed { .. } => out.push(Gesture::Click { position: *position }),
                    MouseState::Dragging { .. } => out.push(Gesture::End),
                    MouseState::Idle => {}
                }
                self.mouse = MouseState::Idle;
            }
            InputEvent::MouseLeave => {
                if let MouseState::Dragging { .. } = self.mouse {
                    out.push(Gesture::End);
                }
                self.mouse = MouseState::Idle;
            }
            InputEvent::Touch {
                event_type,
                touches,
            } => self.touch_event(*event_type, touches, &mut out),
            InputEvent::Wheel { .. } | InputEvent::Key { .. } => {}
        }
        out
    }

    fn mouse_move(&mut self, position: Point, out: &mut Vec<Gesture>) {
        match self.mouse {
            MouseState::Idle => {}
            MouseState::Pressed { start } => {
                if position.distance_to(&start) > self.drag_threshold {
                    out.push(Gesture::Pan {
                        delta: position.subtract(&start),
                    });
                    self.mouse = MouseState::Dragging { last: position };
                }
            }
            MouseState::Dragging { last } => {
                out.push(Gesture::Pan {
                    delta: position.subtract(&last),
                });
                self.mouse = MouseState::Dragging { last: position };
            }
        }
    }

    fn touch_event(&mut self, event_type: TouchEventType, touches: &[TouchPoint], out: &mut Vec<Gesture>) {
        match event_type {
            TouchEventType::Start => {
                for t in touches {
                    self.active_touches.insert(t.id, t.position);
                }
                self.touch_start(out);
            }
            TouchEventType::Move => {
                for t in touches {
                    if let Some(p) = self.active_touches.get_mut(&t.id) {
                        *p = t.position;
                    }
                }
                self.touch_move(out);
            }
            TouchEventType::End | TouchEventType::Cancel => {
                for t in touches {
                    self.active_touches.remove(&t.id);
                }
                self.touch_end(event_type == TouchEventType::Cancel, touches, out);
            }
        }
    }

    /// The two lowest-id fingers, which drive a pinch.
    fn finger_pair(&self) -> Option<(Point, Point)> {
        let mut ids: Vec<&u64> = self.active_touches.keys().collect();
        ids.sort();
        match ids.as_slice() {
            [a, b, ..] => Some((self.active_touches[*a], self.active_touches[*b])),
            _ => None,
        }
    }

    fn single_finger(&self) -> Option<Point> {
        if self.active_touches.len() == 1 {
            self.active_touches.values().next().copied()
        } else {
            None
        }
    }

    fn touch_start(&mut self, out: &mut Vec<Gesture>) {
        if let Some((a, b)) = self.finger_pair() {
            if !matches!(self.touch, TouchState::Pinching { .. }) {
                self.touch = TouchState::Pinching {
                    start_distance: a.distance_to(&b).max(1.0),
                    last_center: a.midpoint(&b),
                };
                out.push(Gesture::PinchStart);
            }
        } else if let Some(p) = self.single_finger() {
            self.touch = TouchState::Pressed { start: p };
        }
    }

    fn touch_move(&mut self, out: &mut Vec<Gesture>) {
        match self.touch {
            TouchState::Idle => {}
            TouchState::Pressed { start } => {
                if let Some(p) = self.single_finger() {
                    if p.distance_to(&start) > self.drag_threshold {
                        out.push(Gesture::Pan {
                            delta: p.subtract(&start),
                        });
                        self.touch = TouchState::Panning { last: p };
                    }
                }
            }
            TouchState::Panning { last } => {
                if let Some(p) = self.single_finger() {
                    out.push(Gesture::Pan {
                        delta: p.subtract(&last),
                    });
                    self.touch = TouchState::Panning { last: p };
                }
            }
            TouchState::Pinching {
                start_distance,
                last_center,
            } => {
                if let Some((a, b)) = self.finger_pair() {
                    let center = a.midpoint(&b);
                    out.push(Gesture::Pinch {
                        scale: a.distance_to(&b) / start_distance,
                        center,
                        pan: center.subtract(&last_center),
                    });
                    self.touch = TouchState::Pinching {
                        start_distance,
                        last_center: center,
                    };
                }
            }
        }
    }

    fn touch_end(&mut self, cancelled: bool, lifted: &[TouchPoint], out: &mut Vec<Gesture>) {
        match (self.touch, self.active_touches.len()) {
            (TouchState::Pressed { .. }, 0) => {
                if !cancelled {
                    if let Some(t) = lifted.first() {
                        out.push(Gesture::Click { position: t.position });
                    }
                }
                self.touch = TouchState::Idle;
            }
            (TouchState::Pinching { .. }, 1) => {
                // the remaining finger carries on panning from where it is
                out.push(Gesture::End);
                if let Some(p) = self.single_finger() {
                    self.touch = TouchState::Panning { last: p };
                }
            }
            (TouchState::Pinching { .. }, n) if n >= 2 => {
                // a third finger lifted; re-anchor on the current pair
                if let Some((a, b)) = self.finger_pair() {
                    self.touch = TouchState::Pinching {
                        start_distance: a.distance_to(&b).max(1.0),
                        last_center: a.midpoint(&b),
                    };
                    out.push(Gesture::PinchStart);
                }
            }
            (TouchState::Idle, _) => {}
            (_, 0) => {
                out.push(Gesture::End);
                self.touch = TouchState::Idle;
            }
            _ => {}
        }
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(crate::core::constants::DRAG_THRESHOLD_PX)
    }
}
