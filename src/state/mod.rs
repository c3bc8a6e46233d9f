pub mod camera;
pub mod gesture;
pub mod long_press;
pub mod touch;
pub mod wheel;

pub use camera::Viewport;
pub use gesture::{Contact, GestureConfig, GestureHost, PointerModifiers, TouchController, TouchFrame};
pub use long_press::{BrowserTimers, TimerToken};
pub use wheel::{wheel_viewport, WheelInput};
