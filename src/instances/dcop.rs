//! # DCOP Instance Representations
//!
//! Grouping of kernel variables into agents and the normalized tuple-table
//! instance that all serializers consume.

use std::{collections::BTreeMap, io, path::Path};

use itertools::Itertools;

use crate::types::{RsHashMap, VertexId};

use super::{
    ccg::{KernelWcsp, WcspConstraint},
    fio,
};

/// Default cost declared for table constraints; also substituted for any
/// infeasible or negative cost during tuple expansion
pub const DEFAULT_COST: u64 = 999_999;

/// An agent of the DCOP, owning the variables grouped under it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    decision: VertexId,
    variables: Vec<VertexId>,
}

impl Agent {
    /// Gets the decision vertex this agent was derived from
    #[must_use]
    pub fn decision(&self) -> VertexId {
        self.decision
    }

    /// Gets the variables owned by this agent
    #[must_use]
    pub fn variables(&self) -> &[VertexId] {
        &self.variables
    }
}

/// A variable of the DCOP bound to its owning agent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DcopVariable {
    pub(crate) id: VertexId,
    pub(crate) vtype: Option<i32>,
    pub(crate) agent: usize,
    pub(crate) constraints: Vec<usize>,
}

impl DcopVariable {
    /// Gets the identity of the variable
    #[must_use]
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Gets the type of the variable, if one was declared
    #[must_use]
    pub fn vtype(&self) -> Option<i32> {
        self.vtype
    }

    /// Gets the numeric identity of the owning agent
    #[must_use]
    pub fn agent(&self) -> usize {
        self.agent
    }

    /// Gets the identities of the constraints touching this variable
    #[must_use]
    pub fn constraints(&self) -> &[usize] {
        &self.constraints
    }
}

/// A kernel network grouped into agents, with numeric agent identities
/// allocated in first-encounter order
#[derive(Clone, Debug, PartialEq)]
pub struct Dcop {
    agents: Vec<Agent>,
    variables: BTreeMap<VertexId, DcopVariable>,
    constraints: Vec<WcspConstraint>,
    assigned: BTreeMap<VertexId, bool>,
}

impl Dcop {
    /// Groups the kernel variables into agents
    #[must_use]
    pub fn build(kernel: KernelWcsp) -> Dcop {
        let mut agents: Vec<Agent> = vec![];
        let mut indices: RsHashMap<VertexId, usize> = RsHashMap::default();
        let mut variables = BTreeMap::new();
        for (vid, var) in kernel.variables {
            let agent = *indices.entry(var.agent).or_insert_with(|| {
                agents.push(Agent {
                    decision: var.agent,
                    variables: vec![],
                });
                agents.len() - 1
            });
            agents[agent].variables.push(vid);
            variables.insert(
                vid,
                DcopVariable {
                    id: vid,
                    vtype: var.vtype,
                    agent,
                    constraints: var.constraints,
                },
            );
        }
        Dcop {
            agents,
            variables,
            constraints: kernel.constraints,
            assigned: kernel.assigned,
        }
    }

    /// Gets the number of agents
    #[must_use]
    pub fn n_agents(&self) -> usize {
        self.agents.len()
    }

    /// Gets the number of variables
    #[must_use]
    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    /// Gets the number of constraints
    #[must_use]
    pub fn n_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Gets the agents in numeric identity order
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Iterates over the variables in identity order
    pub fn variables(&self) -> impl Iterator<Item = &DcopVariable> {
        self.variables.values()
    }

    /// Gets the constraints of the network
    #[must_use]
    pub fn constraints(&self) -> &[WcspConstraint] {
        &self.constraints
    }

    /// Gets the values fixed during reduction, keyed by vertex
    #[must_use]
    pub fn assigned(&self) -> &BTreeMap<VertexId, bool> {
        &self.assigned
    }

    /// Expands each compact cost vector into a full tuple table over the
    /// cartesian product of the binary domain, producing the normalized
    /// instance the serializers consume
    #[must_use]
    pub fn to_instance(&self, name: &str) -> DcopInstance {
        let variables = self
            .variables
            .values()
            .map(|var| InstanceVariable {
                id: var.id,
                domain: 0,
                agent: var.agent,
            })
            .collect();
        let constraints = self
            .constraints
            .iter()
            .map(|con| {
                let tuples = std::iter::repeat([0u8, 1])
                    .take(con.scope.arity())
                    .multi_cartesian_product()
                    .zip(con.costs.iter())
                    .map(|(values, &cost)| {
                        let cost = match cost.finite() {
                            Some(val) if val >= 0. => val,
                            _ => DEFAULT_COST as f64,
                        };
                        (values, cost)
                    })
                    .collect();
                TableConstraint {
                    scope: con.scope.vars(),
                    default_cost: DEFAULT_COST,
                    tuples,
                }
            })
            .collect();
        DcopInstance {
            name: name.to_string(),
            n_agents: self.agents.len(),
            variables,
            domains: vec![vec![0, 1]],
            constraints,
        }
    }

    /// Writes the intermediate agent/variable/constraint structure as JSON.
    /// For more details see [`fio::json::write_raw`].
    ///
    /// # Errors
    ///
    /// If writing fails, returns [`serde_json::Error`].
    pub fn write_json<W: io::Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        fio::json::write_raw(writer, self)
    }

    /// Writes the intermediate agent/variable/constraint structure as JSON
    /// to a file path
    ///
    /// # Errors
    ///
    /// If the file cannot be created or writing fails.
    pub fn write_json_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let writer = fio::open_writer(path)?;
        Ok(self.write_json(writer)?)
    }
}

/// A variable of the normalized instance, bound to one domain and one agent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceVariable {
    /// The identity of the variable
    pub id: VertexId,
    /// Index of the variable's domain
    pub domain: usize,
    /// Numeric identity of the owning agent
    pub agent: usize,
}

/// A fully enumerated tuple-table constraint
#[derive(Clone, Debug, PartialEq)]
pub struct TableConstraint {
    /// The ordered scope of the constraint
    pub scope: Vec<VertexId>,
    /// Cost assumed for tuples not listed in the table
    pub default_cost: u64,
    /// Value tuples in lexicographic order, each with its cost
    pub tuples: Vec<(Vec<u8>, f64)>,
}

impl TableConstraint {
    /// Gets the arity of the constraint
    #[must_use]
    pub fn arity(&self) -> usize {
        self.scope.len()
    }
}

/// A normalized DCOP instance: agents, variables with domain and agent
/// bindings, domains, and tuple-table constraints. This is the only
/// structure the format serializers read.
#[derive(Clone, Debug, PartialEq)]
pub struct DcopInstance {
    name: String,
    n_agents: usize,
    variables: Vec<InstanceVariable>,
    domains: Vec<Vec<i32>>,
    constraints: Vec<TableConstraint>,
}

impl DcopInstance {
    /// Gets the name of the instance
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the number of agents
    #[must_use]
    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    /// Gets the variables in identity order
    #[must_use]
    pub fn variables(&self) -> &[InstanceVariable] {
        &self.variables
    }

    /// Gets the domains of the instance
    #[must_use]
    pub fn domains(&self) -> &[Vec<i32>] {
        &self.domains
    }

    /// Gets the constraints of the instance
    #[must_use]
    pub fn constraints(&self) -> &[TableConstraint] {
        &self.constraints
    }

    /// Gets the maximum constraint arity of the instance
    #[must_use]
    pub fn max_arity(&self) -> usize {
        self.constraints
            .iter()
            .map(TableConstraint::arity)
            .max()
            .unwrap_or(0)
    }

    /// Writes the instance as an XCSP 2.1 XML document. For more details
    /// see [`fio::xcsp::write_xcsp`].
    ///
    /// # Errors
    ///
    /// If writing fails, returns [`io::Error`].
    pub fn write_xcsp<W: io::Write>(&self, writer: W) -> Result<(), io::Error> {
        fio::xcsp::write_xcsp(writer, self)
    }

    /// Writes the instance as an XCSP 2.1 XML document to a file path
    ///
    /// # Errors
    ///
    /// If the file cannot be created or writing fails.
    pub fn write_xcsp_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let writer = fio::open_writer(path)?;
        Ok(self.write_xcsp(writer)?)
    }

    /// Writes the instance in the WCSP text format. For more details see
    /// [`fio::wcsp::write_wcsp`].
    ///
    /// # Errors
    ///
    /// If writing fails, returns [`io::Error`].
    pub fn write_wcsp<W: io::Write>(&self, writer: W) -> Result<(), io::Error> {
        fio::wcsp::write_wcsp(writer, self)
    }

    /// Writes the instance in the WCSP text format to a file path
    ///
    /// # Errors
    ///
    /// If the file cannot be created or writing fails.
    pub fn write_wcsp_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let writer = fio::open_writer(path)?;
        Ok(self.write_wcsp(writer)?)
    }

    /// Writes the instance as a JSON document. For more details see
    /// [`fio::json::write_json`].
    ///
    /// # Errors
    ///
    /// If writing fails, returns [`serde_json::Error`].
    pub fn write_json<W: io::Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        fio::json::write_json(writer, self)
    }

    /// Writes the instance as a JSON document to a file path
    ///
    /// # Errors
    ///
    /// If the file cannot be created or writing fails.
    pub fn write_json_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let writer = fio::open_writer(path)?;
        Ok(self.write_json(writer)?)
    }
}
