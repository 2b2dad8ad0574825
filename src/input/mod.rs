pub mod events;
pub mod gestures;
pub mod handler;

pub use events::{ChannelListener, InputEvent, Key, MapEvent, MapListener, TouchEventType, TouchPoint};
pub use gestures::{Gesture, GestureRecognizer};
pub use handler::{Action, ClickTarget, InteractionController};
