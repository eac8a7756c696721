//! Core library for the quick-grader command line application.
//!
//! The library exposes the gradebook operations that power the command-line
//! interface as well as the tests. File adapters live under
//! [`classroom::grades::io`], the table and roster types in
//! [`classroom::grades::model`], the merge and grade transforms in
//! [`classroom::grades::gradebook`], and the period and year folders in
//! [`classroom::grades::store`] and [`classroom::grades::year`].

pub mod classroom;

pub use classroom::grades::{
    GradeError, Result, config, error, gradebook, io, model, normalize, store, year,
};
