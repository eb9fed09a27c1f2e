// Domain layer: athlete/result models and the calculator port.

pub mod model;
pub mod ports;
