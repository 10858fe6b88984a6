pub mod builder;

pub use builder::{Constraint, DatalogQuery, Term};
