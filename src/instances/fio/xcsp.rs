//! # Writing XCSP 2.1 XML Files
//!
//! Writer for the FRODO flavour of the XCSP 2.1 XML encoding of a DCOP
//! instance. The tree is indented with one tab per depth level and every
//! relation lists its full tuple table as `cost:v1 v2` entries, pipe
//! separated.
//!
//! ## References
//!
//! - [XCSP 2.1](https://arxiv.org/abs/0902.2362)

use std::io::{self, Write};

use itertools::Itertools;

use crate::instances::DcopInstance;

/// Writes a DCOP instance as an XCSP 2.1 XML document
///
/// # Errors
///
/// If writing fails, returns [`io::Error`].
pub fn write_xcsp<W: Write>(mut writer: W, inst: &DcopInstance) -> Result<(), io::Error> {
    writeln!(writer, r#"<?xml version="1.0" ?>"#)?;
    writeln!(writer, "<instance>")?;
    writeln!(
        writer,
        "\t<presentation name=\"{}\" maxConstraintArity=\"{}\" maximize=\"false\" format=\"XCSP 2.1_FRODO\"/>",
        inst.name(),
        inst.max_arity(),
    )?;
    writeln!(writer, "\t<agents nbAgents=\"{}\">", inst.n_agents())?;
    for aid in 0..inst.n_agents() {
        writeln!(writer, "\t\t<agent name=\"a{aid}\"/>")?;
    }
    writeln!(writer, "\t</agents>")?;
    writeln!(
        writer,
        "\t<variables nbVariables=\"{}\">",
        inst.variables().len()
    )?;
    for var in inst.variables() {
        writeln!(
            writer,
            "\t\t<variable name=\"{}\" domain=\"d{}\" agent=\"a{}\"/>",
            var.id,
            var.domain + 1,
            var.agent,
        )?;
    }
    writeln!(writer, "\t</variables>")?;
    writeln!(writer, "\t<domains nbDomains=\"{}\">", inst.domains().len())?;
    for (idx, dom) in inst.domains().iter().enumerate() {
        writeln!(
            writer,
            "\t\t<domain name=\"d{}\" nbValues=\"{}\">{}..{}</domain>",
            idx + 1,
            dom.len(),
            dom.first().copied().unwrap_or_default(),
            dom.last().copied().unwrap_or_default(),
        )?;
    }
    writeln!(writer, "\t</domains>")?;
    writeln!(
        writer,
        "\t<relations nbRelations=\"{}\">",
        inst.constraints().len()
    )?;
    for (cid, con) in inst.constraints().iter().enumerate() {
        let tuples = con
            .tuples
            .iter()
            .map(|(values, cost)| format!("{cost}:{}", values.iter().join(" ")))
            .join(" |");
        writeln!(
            writer,
            "\t\t<relation name=\"r{cid}\" arity=\"{}\" nbTuples=\"{}\" semantics=\"soft\" defaultCost=\"{}\">{tuples}</relation>",
            con.arity(),
            con.tuples.len(),
            con.default_cost,
        )?;
    }
    writeln!(writer, "\t</relations>")?;
    writeln!(
        writer,
        "\t<constraints nbConstraints=\"{}\">",
        inst.constraints().len()
    )?;
    for (cid, con) in inst.constraints().iter().enumerate() {
        writeln!(
            writer,
            "\t\t<constraint name=\"c{cid}\" arity=\"{}\" scope=\"{}\" reference=\"r{cid}\"/>",
            con.arity(),
            con.scope.iter().join(" "),
        )?;
    }
    writeln!(writer, "\t</constraints>")?;
    writeln!(writer, "</instance>")?;
    writer.flush()
}
