// Domain layer: value types shared by the lessons and the port they implement.

pub mod model;
pub mod ports;
