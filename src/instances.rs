//! # Conflict Graph and Constraint Network Representations
//!
//! Types representing weighted conflict graphs and the constraint networks
//! derived from them, with functionality to reduce a graph to its decision
//! kernel and to normalize the result for file output.

mod ccg;
mod dcop;

pub mod fio;

pub use ccg::{Ccg, Infeasibility, KernelWcsp, NotDeclared, Vertex, WcspConstraint, WcspVariable};
pub use dcop::{Agent, Dcop, DcopInstance, DcopVariable, InstanceVariable, TableConstraint, DEFAULT_COST};
