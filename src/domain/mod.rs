// Domain layer: build artifacts and ports. No process or filesystem access here.

pub mod model;
pub mod ports;
