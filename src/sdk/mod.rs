pub mod config;
pub mod deliveries;
pub mod geo;
pub mod navigation;
pub mod routing;
pub mod util;
