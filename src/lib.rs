extern crate self as calmform;

pub mod form;
pub mod prelude;
