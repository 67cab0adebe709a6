//! # ccg2dcop - Conflict Graph Kernelization for DCOP Solvers
//!
//! `ccg2dcop` reduces weighted conflict graphs (CCG) to distributed
//! constraint optimization instances over binary variables and writes them
//! in the file formats consumed by external DCOP/WCSP solvers.

pub mod instances;
pub mod types;
