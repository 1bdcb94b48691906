// Domain layer: the port record, its validation, and the interfaces the core depends on.

pub mod model;
pub mod ports;
