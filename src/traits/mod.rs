pub mod runner;
pub mod unit;

pub use runner::Runner;
pub use unit::{Implementation, StatefulUnit, UnitConstructor, UnitFn, UnitOutput};
