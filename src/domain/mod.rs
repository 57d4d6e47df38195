// Domain layer: records, request status and the ports adapters implement.

pub mod model;
pub mod ports;
