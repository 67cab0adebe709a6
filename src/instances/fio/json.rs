//! # Writing JSON DCOP Files
//!
//! Serde writers for the normalized `{variables, agents, constraints}`
//! document and for the raw dump of the intermediate agent/variable/
//! constraint structure.

use std::{collections::BTreeMap, io::Write};

use serde::{ser::Error as _, Serialize};

use crate::{
    instances::{Dcop, DcopInstance},
    types::Cost,
};

#[derive(Serialize)]
struct JsonVariable {
    value: Option<u8>,
    domain: Vec<i32>,
    agent: String,
    id: u32,
    cons: Vec<String>,
}

#[derive(Serialize)]
struct JsonAgent {
    vars: Vec<String>,
}

#[derive(Serialize)]
struct JsonConstraint {
    scope: Vec<String>,
    vals: Vec<f64>,
}

#[derive(Serialize)]
struct JsonInstance {
    variables: BTreeMap<String, JsonVariable>,
    agents: BTreeMap<String, JsonAgent>,
    constraints: BTreeMap<String, JsonConstraint>,
}

/// Writes the normalized DCOP instance as a JSON document. Constraint cost
/// lists are flat, relying on the canonical tuple order.
///
/// # Errors
///
/// If writing fails, returns [`serde_json::Error`].
pub fn write_json<W: Write>(mut writer: W, inst: &DcopInstance) -> Result<(), serde_json::Error> {
    let mut variables: BTreeMap<String, JsonVariable> = inst
        .variables()
        .iter()
        .map(|var| {
            (
                var.id.to_string(),
                JsonVariable {
                    value: None,
                    domain: inst.domains()[var.domain].clone(),
                    agent: format!("a{}", var.agent),
                    id: var.id.idx(),
                    cons: vec![],
                },
            )
        })
        .collect();
    let mut agents: BTreeMap<String, JsonAgent> = (0..inst.n_agents())
        .map(|aid| (format!("a{aid}"), JsonAgent { vars: vec![] }))
        .collect();
    for var in inst.variables() {
        if let Some(agent) = agents.get_mut(&format!("a{}", var.agent)) {
            agent.vars.push(var.id.to_string());
        }
    }
    let mut constraints = BTreeMap::new();
    for (cid, con) in inst.constraints().iter().enumerate() {
        let name = format!("c{cid}");
        for var in &con.scope {
            if let Some(entry) = variables.get_mut(&var.to_string()) {
                entry.cons.push(name.clone());
            }
        }
        constraints.insert(
            name,
            JsonConstraint {
                scope: con.scope.iter().map(ToString::to_string).collect(),
                vals: con.tuples.iter().map(|&(_, cost)| cost).collect(),
            },
        );
    }
    serde_json::to_writer_pretty(
        &mut writer,
        &JsonInstance {
            variables,
            agents,
            constraints,
        },
    )?;
    writer.flush().map_err(serde_json::Error::custom)
}

#[derive(Serialize)]
struct RawVariable {
    id: u32,
    domain: Vec<i32>,
    agent: String,
    value: Option<u8>,
    #[serde(rename = "type")]
    vtype: Option<i32>,
    cons: Vec<String>,
}

#[derive(Serialize)]
struct RawConstraint {
    scope: Vec<String>,
    vals: Vec<Cost>,
}

#[derive(Serialize)]
struct RawAgent {
    id: usize,
    vars: Vec<String>,
}

#[derive(Serialize)]
struct RawDump {
    variables: BTreeMap<String, RawVariable>,
    constraints: BTreeMap<String, RawConstraint>,
    assigned_vars: BTreeMap<String, u8>,
    agents: BTreeMap<String, RawAgent>,
}

/// Writes the intermediate agent/variable/constraint structure as JSON.
/// Agent keys derive from the owning decision vertex and infeasible costs
/// are rendered as the finite sentinel (see
/// [`crate::types::INFEASIBLE_SENTINEL`]).
///
/// # Errors
///
/// If writing fails, returns [`serde_json::Error`].
pub fn write_raw<W: Write>(mut writer: W, dcop: &Dcop) -> Result<(), serde_json::Error> {
    let agent_name = |idx: usize| format!("a{}", dcop.agents()[idx].decision().idx());
    let variables = dcop
        .variables()
        .map(|var| {
            (
                var.id().to_string(),
                RawVariable {
                    id: var.id().idx(),
                    domain: vec![0, 1],
                    agent: agent_name(var.agent()),
                    value: None,
                    vtype: var.vtype(),
                    cons: var
                        .constraints()
                        .iter()
                        .map(|cid| format!("c{cid}"))
                        .collect(),
                },
            )
        })
        .collect();
    let constraints = dcop
        .constraints()
        .iter()
        .enumerate()
        .map(|(cid, con)| {
            (
                format!("c{cid}"),
                RawConstraint {
                    scope: con.scope.vars().iter().map(ToString::to_string).collect(),
                    vals: con.costs.clone(),
                },
            )
        })
        .collect();
    let assigned_vars = dcop
        .assigned()
        .iter()
        .map(|(vid, &value)| (vid.to_string(), u8::from(value)))
        .collect();
    let agents = dcop
        .agents()
        .iter()
        .enumerate()
        .map(|(idx, agent)| {
            (
                format!("a{}", agent.decision().idx()),
                RawAgent {
                    id: idx,
                    vars: agent.variables().iter().map(ToString::to_string).collect(),
                },
            )
        })
        .collect();
    serde_json::to_writer_pretty(
        &mut writer,
        &RawDump {
            variables,
            constraints,
            assigned_vars,
            agents,
        },
    )?;
    writer.flush().map_err(serde_json::Error::custom)
}
