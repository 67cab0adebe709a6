//! # Parsing CCG Files
//!
//! Internal module containing functions for parsing CCG conflict graph
//! files. The approach is to accept input instances, even if they are not
//! technically in spec, as long as the input is still reasonable: lines
//! that do not declare anything are skipped.
//!
//! ## File Format
//!
//! The format is line oriented and whitespace tokenized:
//!
//! - `v <id> <weight>` declares a vertex
//! - `e <id1> <id2>` declares a conflict edge
//! - a block delimited by `vertex types begin` / `vertex types end` lines
//!   holds `<id> <type>` lines; type 0 marks a decision variable
//! - a block delimited by `assignments begin` / `assignments end` lines
//!   holds `<id> <value>` lines fixing 0/1 values

use std::io::{BufRead, BufReader, Read};

use nom::{
    bytes::complete::tag,
    character::complete::{i32, multispace1, u32, u8},
    number::complete::double,
    sequence::{separated_pair, terminated},
    IResult,
};
use thiserror::Error;

use crate::{instances::Ccg, types::VertexId};

/// Errors occurring within the CCG parsing module
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Encountered an invalid line
    #[error("invalid line {0}: {1:?}")]
    InvalidLine(usize, String),
    /// A line references a vertex that has not been declared
    #[error("line {0}: vertex {1} has not been declared")]
    UnknownVertex(usize, VertexId),
}

/// The block of the file currently being parsed
enum Section {
    Body,
    VertexTypes,
    Assignments,
}

/// Parses a CCG instance from a reader (typically a file)
///
/// # Errors
///
/// [`Error`] on malformed declarations, [`std::io::Error`] on failed reads.
pub fn parse_ccg<R: Read>(reader: R) -> Result<Ccg, super::ParsingError> {
    let mut reader = BufReader::new(reader);
    let mut graph = Ccg::new();
    let mut section = Section::Body;
    let mut buf = String::new();
    let mut line_num = 0;
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            return Ok(graph);
        }
        line_num += 1;
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }
        match section {
            Section::Body => {
                if line.contains("vertex types begin") {
                    section = Section::VertexTypes;
                    continue;
                }
                if line.contains("assignments begin") {
                    section = Section::Assignments;
                    continue;
                }
                match line.split_whitespace().next() {
                    Some("v") => {
                        let (id, weight) = full(vertex_line, line, line_num)?;
                        graph.add_vertex(id, weight);
                    }
                    Some("e") => {
                        let (u, v) = full(edge_line, line, line_num)?;
                        graph
                            .add_edge(u, v)
                            .map_err(|err| Error::UnknownVertex(line_num, err.0))?;
                    }
                    // other lines are tolerated and skipped
                    _ => (),
                }
            }
            Section::VertexTypes => {
                if line.contains("vertex types end") {
                    section = Section::Body;
                } else {
                    let (id, vtype) = full(type_line, line, line_num)?;
                    graph.set_vertex_type(id, vtype);
                }
            }
            Section::Assignments => {
                if line.contains("assignments end") {
                    section = Section::Body;
                } else {
                    let (id, value) = full(assignment_line, line, line_num)?;
                    graph
                        .set_assignment(id, value)
                        .map_err(|err| Error::UnknownVertex(line_num, err.0))?;
                }
            }
        }
    }
}

/// Runs a line parser and requires it to consume the entire line
fn full<'input, T>(
    mut parser: impl FnMut(&'input str) -> IResult<&'input str, T>,
    line: &'input str,
    line_num: usize,
) -> Result<T, Error> {
    match parser(line) {
        Ok((rest, val)) if rest.trim().is_empty() => Ok(val),
        _ => Err(Error::InvalidLine(line_num, line.to_string())),
    }
}

/// Parses a `v <id> <weight>` vertex declaration
fn vertex_line(input: &str) -> IResult<&str, (VertexId, f64)> {
    let (input, _) = terminated(tag("v"), multispace1)(input)?;
    separated_pair(vertex_id, multispace1, double)(input)
}

/// Parses an `e <id1> <id2>` conflict edge declaration
fn edge_line(input: &str) -> IResult<&str, (VertexId, VertexId)> {
    let (input, _) = terminated(tag("e"), multispace1)(input)?;
    separated_pair(vertex_id, multispace1, vertex_id)(input)
}

/// Parses an `<id> <type>` line of the vertex type block
fn type_line(input: &str) -> IResult<&str, (VertexId, i32)> {
    separated_pair(vertex_id, multispace1, i32)(input)
}

/// Parses an `<id> <value>` line of the assignment block
fn assignment_line(input: &str) -> IResult<&str, (VertexId, bool)> {
    let (input, (id, value)) = separated_pair(vertex_id, multispace1, u8)(input)?;
    Ok((input, (id, value != 0)))
}

/// Nuclear parser for a vertex identity
fn vertex_id(input: &str) -> IResult<&str, VertexId> {
    let (input, idx) = u32(input)?;
    Ok((input, VertexId::new(idx)))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{
        assignment_line, edge_line, full, parse_ccg, type_line, vertex_line, Error,
    };
    use crate::{instances::Ccg, types::VertexId};

    fn vid(idx: u32) -> VertexId {
        VertexId::new(idx)
    }

    #[test]
    fn vertex_line_pass() {
        assert_eq!(vertex_line("v 3 2.5"), Ok(("", (vid(3), 2.5))));
        assert_eq!(vertex_line("v 3 17"), Ok(("", (vid(3), 17.))));
        assert_eq!(vertex_line("v  42  1e2"), Ok(("", (vid(42), 100.))));
    }

    #[test]
    fn vertex_line_fail() {
        assert!(vertex_line("v 3").is_err());
        assert!(vertex_line("v abc 2.5").is_err());
        assert!(vertex_line("w 3 2.5").is_err());
    }

    #[test]
    fn edge_line_pass() {
        assert_eq!(edge_line("e 1 2"), Ok(("", (vid(1), vid(2)))));
        assert_eq!(edge_line("e 2 2"), Ok(("", (vid(2), vid(2)))));
    }

    #[test]
    fn edge_line_fail() {
        assert!(edge_line("e 1").is_err());
        assert!(edge_line("e -1 2").is_err());
        assert!(edge_line("1 2").is_err());
    }

    #[test]
    fn type_line_pass() {
        assert_eq!(type_line("3 0"), Ok(("", (vid(3), 0))));
        assert_eq!(type_line("3 -1"), Ok(("", (vid(3), -1))));
    }

    #[test]
    fn assignment_line_pass() {
        assert_eq!(assignment_line("3 0"), Ok(("", (vid(3), false))));
        assert_eq!(assignment_line("3 1"), Ok(("", (vid(3), true))));
    }

    #[test]
    fn full_rejects_trailing_junk() {
        assert_eq!(
            full(vertex_line, "v 3 2.5 junk", 7),
            Err(Error::InvalidLine(7, "v 3 2.5 junk".to_string()))
        );
        assert_eq!(full(vertex_line, "v 3 2.5 ", 7), Ok((vid(3), 2.5)));
    }

    #[test]
    fn parse_small_instance() {
        let input = "\
            v 1 2.5\n\
            v 2 0\n\
            e 1 2\n\
            vertex types begin\n\
            1 0\n\
            2 1\n\
            vertex types end\n\
            assignments begin\n\
            2 0\n\
            assignments end\n";
        let graph = parse_ccg(Cursor::new(input)).unwrap();
        let mut expected = Ccg::new();
        expected.add_vertex(vid(1), 2.5);
        expected.add_vertex(vid(2), 0.);
        expected.add_edge(vid(1), vid(2)).unwrap();
        expected.set_vertex_type(vid(1), 0);
        expected.set_vertex_type(vid(2), 1);
        expected.set_assignment(vid(2), false).unwrap();
        assert_eq!(graph, expected);
    }

    #[test]
    fn type_block_creates_vertex() {
        let input = "vertex types begin\n5 0\nvertex types end\n";
        let graph = parse_ccg(Cursor::new(input)).unwrap();
        assert_eq!(graph.n_vertices(), 1);
        let vertex = graph.vertex(vid(5)).unwrap();
        assert_eq!(vertex.weight(), 0.);
        assert!(vertex.is_decision());
    }

    #[test]
    fn unknown_lines_skipped() {
        let input = "c a comment\nv 1 1\nproblem statistics\nv 2 1\ne 1 2\n\n";
        let graph = parse_ccg(Cursor::new(input)).unwrap();
        assert_eq!(graph.n_vertices(), 2);
        assert_eq!(graph.n_edges(), 1);
    }

    #[test]
    fn edge_to_undeclared_vertex() {
        let input = "v 1 1\ne 1 2\n";
        match parse_ccg(Cursor::new(input)) {
            Err(super::super::ParsingError::Ccg(Error::UnknownVertex(2, v))) => {
                assert_eq!(v, vid(2));
            }
            other => panic!("expected unknown vertex error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_vertex_line() {
        let input = "v 1 abc\n";
        assert!(matches!(
            parse_ccg(Cursor::new(input)),
            Err(super::super::ParsingError::Ccg(Error::InvalidLine(1, _)))
        ));
    }
}
