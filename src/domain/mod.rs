pub mod grid;
pub mod measurement;
pub mod scenario;
pub mod turbine;
pub mod weather;

pub use grid::*;
pub use measurement::*;
pub use scenario::*;
pub use turbine::*;
pub use weather::*;
