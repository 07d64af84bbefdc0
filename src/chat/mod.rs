pub mod session;
pub mod throttle;
pub mod ticker;

pub use session::{ChatSession, ConnectionState};
pub use throttle::{Rejection, ThrottleConfig};
