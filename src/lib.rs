//! Weather dashboard core: data sources, location resolution and the
//! display schema the terminal UI renders.

pub mod display;
pub mod error;
pub mod geocode;
pub mod http;
pub mod icon;
pub mod location;
pub mod provider;
pub mod refresh;
pub mod source;

pub use display::{DisplayWeather, HourSlot, Metric, Reading};
pub use error::{Error, LocationError, Result};
pub use refresh::{refresh_once, spawn_refresher, Dashboard, Refresher};
pub use source::Source;
