// Domain layer: shared models and the storage/pipeline ports.

pub mod model;
pub mod ports;
