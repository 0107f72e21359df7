// Domain layer: API records, flat rows and the ports the core talks through.

pub mod model;
pub mod ports;
