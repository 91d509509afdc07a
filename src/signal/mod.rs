//! Signal paths and light time solving
mod leg;
mod path;

pub use leg::{EndpointSelector, SignalLeg, NO_STATION_FEASIBILITY_DEG};
pub use path::SignalPath;
