// Domain layer: entities and ports (interfaces) to the backend, the map and the detail panel.

pub mod model;
pub mod ports;
