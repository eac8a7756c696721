pub mod config;
pub mod error;
pub mod gradebook;
pub mod io;
pub mod model;
pub mod normalize;
pub mod store;
pub mod year;

pub use error::{GradeError, Result};
