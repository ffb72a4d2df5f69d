pub mod cozy;

pub use cozy::{MoveError, Position};
