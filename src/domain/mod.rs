// Domain layer: core models and ports (interfaces). No cloud SDK types here.

pub mod model;
pub mod ports;
