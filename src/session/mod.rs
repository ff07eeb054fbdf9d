//! Gesture session state machine

mod controller;
mod state;

pub use controller::GestureSessionController;
pub use state::{RecognitionMode, SessionState};
