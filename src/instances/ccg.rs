//! # Conflict Graph Representation and Kernelization
//!
//! The raw CCG input graph and its reduction to a weighted binary-domain
//! constraint network over the vertices still reachable from a decision
//! variable.

use std::{collections::BTreeMap, io, path::Path};

use thiserror::Error;

use crate::types::{Cost, EdgeId, RsHashSet, Scope, VertexId};

use super::fio;

/// A vertex of the conflict graph
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    id: VertexId,
    weight: f64,
    vtype: Option<i32>,
    value: Option<bool>,
    edges: Vec<EdgeId>,
}

impl Vertex {
    fn new(id: VertexId, weight: f64) -> Vertex {
        Vertex {
            id,
            weight,
            vtype: None,
            value: None,
            edges: vec![],
        }
    }

    /// Gets the identity of the vertex
    #[must_use]
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Checks whether the vertex is a decision variable (type 0)
    #[must_use]
    pub fn is_decision(&self) -> bool {
        self.vtype == Some(0)
    }

    /// Checks whether the vertex is in the kernel, i.e., has no fixed value
    #[must_use]
    pub fn in_kernel(&self) -> bool {
        self.value.is_none()
    }

    /// Gets the weight of the vertex
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Gets the type of the vertex, if one was declared
    #[must_use]
    pub fn vtype(&self) -> Option<i32> {
        self.vtype
    }

    /// Gets the fixed value of the vertex, if one was assigned
    #[must_use]
    pub fn value(&self) -> Option<bool> {
        self.value
    }
}

/// Error for referencing a vertex that has not been declared
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("vertex {0} has not been declared")]
pub struct NotDeclared(pub VertexId);

/// Two adjacent vertices are both fixed to 0: the conflict between them can
/// never be satisfied and no kernelization can repair it
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("problem is unsatisfiable: vertices {0} and {1} are both deselected")]
pub struct Infeasibility(pub VertexId, pub VertexId);

/// A weighted conflict graph with an optional partial vertex assignment
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ccg {
    vertices: BTreeMap<VertexId, Vertex>,
    edges: BTreeMap<EdgeId, (VertexId, VertexId)>,
    next_edge: usize,
}

impl Ccg {
    /// Creates a new empty conflict graph
    #[must_use]
    pub fn new() -> Ccg {
        Ccg::default()
    }

    /// Parses a CCG instance from a reader object. For details on the file
    /// format see [`fio::ccg`].
    ///
    /// # Errors
    ///
    /// Parsing errors from [`fio::ccg`] or [`io::Error`].
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Ccg, fio::ParsingError> {
        fio::ccg::parse_ccg(reader)
    }

    /// Parses a CCG instance from a file path. For more details see
    /// [`Ccg::from_reader`].
    ///
    /// # Errors
    ///
    /// Parsing errors from [`fio::ccg`] or [`io::Error`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Ccg, fio::ParsingError> {
        let reader = fio::open_reader(path)?;
        Ccg::from_reader(reader)
    }

    /// Declares a vertex with a given weight, resetting any earlier
    /// declaration of the same identity
    pub fn add_vertex(&mut self, id: VertexId, weight: f64) {
        self.vertices.insert(id, Vertex::new(id, weight));
    }

    /// Adds a conflict edge between two declared vertices
    ///
    /// # Errors
    ///
    /// [`NotDeclared`] if either endpoint has not been declared.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> Result<EdgeId, NotDeclared> {
        for endpoint in [u, v] {
            if !self.vertices.contains_key(&endpoint) {
                return Err(NotDeclared(endpoint));
            }
        }
        let id = EdgeId::new(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(id, (u, v));
        for endpoint in [u, v] {
            if let Some(vertex) = self.vertices.get_mut(&endpoint) {
                vertex.edges.push(id);
            }
        }
        Ok(id)
    }

    /// Sets the type of a vertex, creating the vertex with zero weight if it
    /// has not been declared
    pub fn set_vertex_type(&mut self, id: VertexId, vtype: i32) {
        self.vertices
            .entry(id)
            .or_insert_with(|| Vertex::new(id, 0.))
            .vtype = Some(vtype);
    }

    /// Fixes the value of a declared vertex
    ///
    /// # Errors
    ///
    /// [`NotDeclared`] if the vertex has not been declared.
    pub fn set_assignment(&mut self, id: VertexId, value: bool) -> Result<(), NotDeclared> {
        match self.vertices.get_mut(&id) {
            Some(vertex) => {
                vertex.value = Some(value);
                Ok(())
            }
            None => Err(NotDeclared(id)),
        }
    }

    /// Gets the number of vertices in the graph
    #[must_use]
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Gets the number of conflict edges in the graph
    #[must_use]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Gets a vertex of the graph
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    fn other_endpoint(&self, edge: EdgeId, v: VertexId) -> VertexId {
        let (a, b) = self.edges[&edge];
        if b == v {
            a
        } else {
            b
        }
    }

    /// Depth-first search for any decision variable reachable from `v`
    /// without passing through removed vertices. The explored-edge set is
    /// fresh per top-level call so independent searches do not share state
    /// and cycles terminate.
    fn find_decision(
        &self,
        v: VertexId,
        removed: &RsHashSet<VertexId>,
        explored: &mut RsHashSet<EdgeId>,
    ) -> Option<VertexId> {
        if removed.contains(&v) {
            return None;
        }
        if self.vertices[&v].is_decision() {
            return Some(v);
        }
        for &eid in &self.vertices[&v].edges {
            if !explored.insert(eid) {
                continue;
            }
            let (a, b) = self.edges[&eid];
            if a == b {
                // a self-loop cannot extend a path
                continue;
            }
            let next = if a == v { b } else { a };
            if let Some(decision) = self.find_decision(next, removed, explored) {
                return Some(decision);
            }
        }
        None
    }

    /// Reduces the graph to its decision kernel: a weighted binary-domain
    /// constraint network over the vertices that are unassigned and can
    /// still reach a decision variable, each bound to an owning agent.
    ///
    /// # Errors
    ///
    /// Returns [`Infeasibility`] if two adjacent vertices are both fixed to
    /// 0. No partial network is produced in that case.
    pub fn kernelize(self) -> Result<KernelWcsp, Infeasibility> {
        let mut unary: BTreeMap<VertexId, [Cost; 2]> = BTreeMap::new();
        let mut resolved: RsHashSet<EdgeId> = RsHashSet::default();
        let mut dead_edges: RsHashSet<EdgeId> = RsHashSet::default();
        let mut dead_vertices: RsHashSet<VertexId> = RsHashSet::default();
        let mut assigned: BTreeMap<VertexId, bool> = BTreeMap::new();

        // Fixed vertices leave the kernel. Each of their conflicts either
        // collapses into a unary cost on a kernel neighbour or, between two
        // deselected vertices, makes the instance infeasible.
        for (&vid, vertex) in &self.vertices {
            let Some(value) = vertex.value else { continue };
            for &eid in &vertex.edges {
                if !resolved.insert(eid) {
                    continue;
                }
                let other = self.other_endpoint(eid, vid);
                match self.vertices[&other].value {
                    None => {
                        // a deselected vertex forbids its kernel neighbour
                        // from being deselected as well
                        let entry = unary.entry(other).or_insert([Cost::ZERO; 2]);
                        if !value {
                            entry[0] += Cost::Infeasible;
                        }
                    }
                    Some(other_value) => {
                        if !value && !other_value {
                            return Err(Infeasibility(vid, other));
                        }
                    }
                }
                dead_edges.insert(eid);
            }
            dead_vertices.insert(vid);
            assigned.insert(vid, value);
        }

        // Kernel vertices that cannot reach any decision variable cannot
        // influence one and are dropped; the others inherit the agent of the
        // first decision variable found. Zero-weight decision vertices
        // without any incident edge are equally disconnected from every
        // other decision and are dropped as well.
        let mut variables: BTreeMap<VertexId, WcspVariable> = BTreeMap::new();
        for (&vid, vertex) in &self.vertices {
            if dead_vertices.contains(&vid) {
                continue;
            }
            if vertex.is_decision() && vertex.edges.is_empty() && vertex.weight == 0. {
                dead_vertices.insert(vid);
                continue;
            }
            let mut explored: RsHashSet<EdgeId> = RsHashSet::default();
            match self.find_decision(vid, &dead_vertices, &mut explored) {
                Some(decision) => {
                    variables.insert(
                        vid,
                        WcspVariable {
                            id: vid,
                            vtype: vertex.vtype,
                            agent: decision,
                            constraints: vec![],
                        },
                    );
                }
                None => {
                    dead_vertices.insert(vid);
                }
            }
        }

        // Apply removals: accumulated unary costs of removed vertices are
        // discarded, not redistributed
        for vid in &dead_vertices {
            unary.remove(vid);
        }
        let kept_edges: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|&(eid, &(u, v))| {
                !dead_edges.contains(eid)
                    && !dead_vertices.contains(&u)
                    && !dead_vertices.contains(&v)
            })
            .map(|(&eid, _)| eid)
            .collect();

        // Finalize unary cost tables: selecting a vertex always carries its
        // own weight
        let mut constraints: Vec<WcspConstraint> = vec![];
        for (&vid, var) in &mut variables {
            let mut table = unary.remove(&vid).unwrap_or([Cost::ZERO; 2]);
            table[1] += Cost::Finite(self.vertices[&vid].weight);
            var.constraints.push(constraints.len());
            constraints.push(WcspConstraint {
                scope: Scope::Unary(vid),
                costs: table.to_vec(),
            });
        }

        // Every surviving conflict becomes a binary constraint forbidding
        // the double-deselection tuple
        for eid in kept_edges {
            let (u, v) = self.edges[&eid];
            let cid = constraints.len();
            constraints.push(WcspConstraint {
                scope: Scope::Binary(u, v),
                costs: vec![Cost::Infeasible, Cost::ZERO, Cost::ZERO, Cost::ZERO],
            });
            for endpoint in [u, v] {
                if let Some(var) = variables.get_mut(&endpoint) {
                    var.constraints.push(cid);
                }
            }
        }

        Ok(KernelWcsp {
            variables,
            constraints,
            assigned,
        })
    }
}

/// A variable of the kernel network
#[derive(Clone, Debug, PartialEq)]
pub struct WcspVariable {
    pub(crate) id: VertexId,
    pub(crate) vtype: Option<i32>,
    pub(crate) agent: VertexId,
    pub(crate) constraints: Vec<usize>,
}

impl WcspVariable {
    /// Gets the identity of the variable
    #[must_use]
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Checks whether the variable is a decision variable (type 0)
    #[must_use]
    pub fn is_decision(&self) -> bool {
        self.vtype == Some(0)
    }

    /// Gets the decision vertex owning this variable
    #[must_use]
    pub fn agent(&self) -> VertexId {
        self.agent
    }

    /// Gets the identities of the constraints touching this variable
    #[must_use]
    pub fn constraints(&self) -> &[usize] {
        &self.constraints
    }
}

/// A cost-table constraint over one or two binary variables. Costs are
/// indexed by the lexicographic enumeration of the domain tuples over the
/// scope.
#[derive(Clone, Debug, PartialEq)]
pub struct WcspConstraint {
    /// The ordered scope of the constraint
    pub scope: Scope,
    /// The cost vector, of length two or four
    pub costs: Vec<Cost>,
}

/// The decision kernel of a conflict graph: a weighted constraint network
/// over binary domains together with the values fixed during reduction
#[derive(Clone, Debug, PartialEq)]
pub struct KernelWcsp {
    pub(crate) variables: BTreeMap<VertexId, WcspVariable>,
    pub(crate) constraints: Vec<WcspConstraint>,
    pub(crate) assigned: BTreeMap<VertexId, bool>,
}

impl KernelWcsp {
    /// Gets the number of variables in the kernel
    #[must_use]
    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    /// Gets the number of constraints in the kernel
    #[must_use]
    pub fn n_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Gets a variable of the kernel
    #[must_use]
    pub fn variable(&self, id: VertexId) -> Option<&WcspVariable> {
        self.variables.get(&id)
    }

    /// Iterates over the variables of the kernel in identity order
    pub fn variables(&self) -> impl Iterator<Item = &WcspVariable> {
        self.variables.values()
    }

    /// Gets the constraints of the kernel
    #[must_use]
    pub fn constraints(&self) -> &[WcspConstraint] {
        &self.constraints
    }

    /// Gets the values fixed during reduction, keyed by vertex
    #[must_use]
    pub fn assigned(&self) -> &BTreeMap<VertexId, bool> {
        &self.assigned
    }

    /// Checks whether the input was already solved, i.e., no decision
    /// variable survived into the kernel
    #[must_use]
    pub fn is_solved(&self) -> bool {
        !self.variables.values().any(WcspVariable::is_decision)
    }

    /// Checks that every variable participates in at least one constraint
    #[must_use]
    pub fn all_constrained(&self) -> bool {
        self.variables.values().all(|var| !var.constraints.is_empty())
    }
}
