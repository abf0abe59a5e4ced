mod controller;
mod state;

pub use controller::{PunchController, PunchSnapshot};
pub use state::{PunchPhase, PunchState};
