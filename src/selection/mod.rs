pub mod set;

pub use set::{Membership, SelectionSet, SelectionSnapshot};
