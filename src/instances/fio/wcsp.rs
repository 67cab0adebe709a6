//! # Writing and Parsing WCSP Files
//!
//! The line-oriented WCSP text format: a problem header, a line of domain
//! sizes, and per constraint a scope header followed by one line per cost
//! tuple.
//!
//! ## References
//!
//! - [WCSP format](https://toulbar2.github.io/toulbar2/formats/wcspformat.html)

use std::io::{self, BufRead, BufReader, Read, Write};

use itertools::Itertools;
use nom::{
    bytes::complete::take_till1,
    character::complete::{multispace0, multispace1, u32, u64, u8},
    combinator::map_res,
    multi::{count, separated_list1},
    number::complete::double,
    sequence::preceded,
    IResult,
};
use thiserror::Error;

use crate::instances::DcopInstance;

/// Global upper bound declared in the problem header
pub const UPPER_BOUND: u64 = 99_999;

/// Writes a DCOP instance in the WCSP text format
///
/// # Errors
///
/// If writing fails, returns [`io::Error`].
pub fn write_wcsp<W: Write>(mut writer: W, inst: &DcopInstance) -> Result<(), io::Error> {
    let max_domain = inst.domains().iter().map(Vec::len).max().unwrap_or(0);
    writeln!(
        writer,
        "{} {} {} {} {}",
        inst.name(),
        inst.variables().len(),
        max_domain,
        inst.constraints().len(),
        UPPER_BOUND,
    )?;
    writeln!(
        writer,
        "{}",
        inst.variables()
            .iter()
            .map(|var| inst.domains()[var.domain].len())
            .join(" "),
    )?;
    for con in inst.constraints() {
        writeln!(
            writer,
            "{} {} {} {}",
            con.arity(),
            con.scope.iter().map(|v| v.idx()).join(" "),
            con.default_cost,
            con.tuples.len(),
        )?;
        for (values, cost) in &con.tuples {
            writeln!(writer, "{} {cost}", values.iter().join(" "))?;
        }
    }
    writer.flush()
}

/// Errors occurring within the WCSP parsing module
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Encountered an invalid problem header
    #[error("invalid problem header")]
    InvalidHeader,
    /// Encountered an invalid domain size line
    #[error("invalid domain size line")]
    InvalidDomains,
    /// Encountered an invalid constraint
    #[error("invalid constraint at line {0}")]
    InvalidConstraint(usize),
    /// The file ended before all declared constraints were read
    #[error("unexpected end of file")]
    UnexpectedEof,
}

/// In-memory form of a parsed WCSP file
#[derive(Clone, Debug, PartialEq)]
pub struct WcspFile {
    /// The problem name
    pub name: String,
    /// The maximum domain size declared in the header
    pub max_domain: usize,
    /// The global upper bound declared in the header
    pub upper_bound: u64,
    /// The domain size of each variable, in variable order
    pub domain_sizes: Vec<usize>,
    /// The table constraints of the problem
    pub constraints: Vec<WcspFileConstraint>,
}

/// A table constraint read back from a WCSP file
#[derive(Clone, Debug, PartialEq)]
pub struct WcspFileConstraint {
    /// The raw variable identities in the constraint scope
    pub scope: Vec<u32>,
    /// The default cost of unlisted tuples
    pub default_cost: f64,
    /// The listed value tuples with their costs
    pub tuples: Vec<(Vec<u8>, f64)>,
}

/// Parses a WCSP instance from a reader (typically a file)
///
/// # Errors
///
/// [`Error`] on malformed content, [`std::io::Error`] on failed reads.
pub fn parse_wcsp<R: Read>(reader: R) -> Result<WcspFile, super::ParsingError> {
    let mut reader = BufReader::new(reader);
    let mut buf = String::new();
    let mut line_num = 0;
    if !next_line(&mut reader, &mut buf, &mut line_num)? {
        return Err(Error::UnexpectedEof.into());
    }
    let (name, n_vars, max_domain, n_constraints, upper_bound) =
        full(header_line, buf.trim()).ok_or(Error::InvalidHeader)?;
    if !next_line(&mut reader, &mut buf, &mut line_num)? {
        return Err(Error::UnexpectedEof.into());
    }
    let domain_sizes = full(domains_line, buf.trim()).ok_or(Error::InvalidDomains)?;
    if domain_sizes.len() != n_vars {
        return Err(Error::InvalidDomains.into());
    }
    let mut constraints = Vec::with_capacity(n_constraints);
    for _ in 0..n_constraints {
        if !next_line(&mut reader, &mut buf, &mut line_num)? {
            return Err(Error::UnexpectedEof.into());
        }
        let (scope, default_cost, n_tuples) =
            full(constraint_header, buf.trim()).ok_or(Error::InvalidConstraint(line_num))?;
        let mut tuples = Vec::with_capacity(n_tuples);
        for _ in 0..n_tuples {
            if !next_line(&mut reader, &mut buf, &mut line_num)? {
                return Err(Error::UnexpectedEof.into());
            }
            let tuple = full(tuple_line(scope.len()), buf.trim())
                .ok_or(Error::InvalidConstraint(line_num))?;
            tuples.push(tuple);
        }
        constraints.push(WcspFileConstraint {
            scope,
            default_cost,
            tuples,
        });
    }
    Ok(WcspFile {
        name,
        max_domain,
        upper_bound,
        domain_sizes,
        constraints,
    })
}

/// Loads the next non-empty line into the buffer. Returns `false` at the
/// end of the input.
fn next_line<R: BufRead>(
    reader: &mut R,
    buf: &mut String,
    line_num: &mut usize,
) -> Result<bool, io::Error> {
    loop {
        buf.clear();
        if reader.read_line(buf)? == 0 {
            return Ok(false);
        }
        *line_num += 1;
        if !buf.trim().is_empty() {
            return Ok(true);
        }
    }
}

/// Runs a line parser and requires it to consume the entire line
fn full<'input, T>(
    mut parser: impl FnMut(&'input str) -> IResult<&'input str, T>,
    line: &'input str,
) -> Option<T> {
    match parser(line) {
        Ok((rest, val)) if rest.trim().is_empty() => Some(val),
        _ => None,
    }
}

/// Parses the `<name> <N> <K> <C> <UB>` problem header
fn header_line(input: &str) -> IResult<&str, (String, usize, usize, usize, u64)> {
    let (input, name) = take_till1(char::is_whitespace)(input)?;
    let (input, n_vars) = preceded(multispace1, number)(input)?;
    let (input, max_domain) = preceded(multispace1, number)(input)?;
    let (input, n_constraints) = preceded(multispace1, number)(input)?;
    let (input, upper_bound) = preceded(multispace1, u64)(input)?;
    Ok((
        input,
        (name.to_string(), n_vars, max_domain, n_constraints, upper_bound),
    ))
}

/// Parses the line of per-variable domain sizes
fn domains_line(input: &str) -> IResult<&str, Vec<usize>> {
    separated_list1(multispace1, number)(input)
}

/// Parses an `<arity> <scope..> <defaultCost> <nTuples>` constraint header
fn constraint_header(input: &str) -> IResult<&str, (Vec<u32>, f64, usize)> {
    let (input, arity) = number(input)?;
    let (input, scope) = count(preceded(multispace1, u32), arity)(input)?;
    let (input, default_cost) = preceded(multispace1, double)(input)?;
    let (input, n_tuples) = preceded(multispace1, number)(input)?;
    Ok((input, (scope, default_cost, n_tuples)))
}

/// Parses a `<val..> <cost>` tuple line for a given arity
fn tuple_line(arity: usize) -> impl FnMut(&str) -> IResult<&str, (Vec<u8>, f64)> {
    move |input| {
        let (input, values) = count(preceded(multispace0, u8), arity)(input)?;
        let (input, cost) = preceded(multispace1, double)(input)?;
        Ok((input, (values, cost)))
    }
}

/// Nuclear parser for a count value
fn number(input: &str) -> IResult<&str, usize> {
    map_res(u64, usize::try_from)(input)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{
        constraint_header, header_line, parse_wcsp, tuple_line, write_wcsp, Error, UPPER_BOUND,
    };
    use crate::{
        instances::{Ccg, Dcop, DcopInstance},
        types::VertexId,
    };

    fn two_decision_instance() -> DcopInstance {
        let mut graph = Ccg::new();
        graph.add_vertex(VertexId::new(1), 1.);
        graph.add_vertex(VertexId::new(2), 2.);
        graph.set_vertex_type(VertexId::new(1), 0);
        graph.set_vertex_type(VertexId::new(2), 0);
        graph.add_edge(VertexId::new(1), VertexId::new(2)).unwrap();
        Dcop::build(graph.kernelize().unwrap()).to_instance("ccg_dcop")
    }

    #[test]
    fn header_line_pass() {
        assert_eq!(
            header_line("ccg_dcop 2 2 3 99999"),
            Ok(("", ("ccg_dcop".to_string(), 2, 2, 3, 99999)))
        );
    }

    #[test]
    fn header_line_fail() {
        assert!(header_line("ccg_dcop 2 2").is_err());
        assert!(header_line("ccg_dcop 2 2 abc 99999").is_err());
    }

    #[test]
    fn constraint_header_pass() {
        assert_eq!(
            constraint_header("2 1 2 999999 4"),
            Ok(("", (vec![1, 2], 999999., 4)))
        );
        assert_eq!(constraint_header("1 7 999999 2"), Ok(("", (vec![7], 999999., 2))));
    }

    #[test]
    fn tuple_line_pass() {
        assert_eq!(tuple_line(2)("0 1 5"), Ok(("", (vec![0, 1], 5.))));
        assert_eq!(tuple_line(1)("1 999999"), Ok(("", (vec![1], 999999.))));
    }

    #[test]
    fn written_document() {
        let mut buf = vec![];
        write_wcsp(&mut buf, &two_decision_instance()).unwrap();
        let expected = "\
ccg_dcop 2 2 3 99999
2 2
1 1 999999 2
0 0
1 1
1 2 999999 2
0 0
1 2
2 1 2 999999 4
0 0 999999
0 1 0
1 0 0
1 1 0
";
        assert_eq!(String::from_utf8(buf).unwrap(), expected);
    }

    #[test]
    fn round_trip() {
        let inst = two_decision_instance();
        let mut buf = vec![];
        write_wcsp(&mut buf, &inst).unwrap();
        let parsed = parse_wcsp(Cursor::new(buf)).unwrap();
        assert_eq!(parsed.name, inst.name());
        assert_eq!(parsed.upper_bound, UPPER_BOUND);
        assert_eq!(parsed.domain_sizes.len(), inst.variables().len());
        assert_eq!(parsed.constraints.len(), inst.constraints().len());
        for (got, want) in parsed.constraints.iter().zip(inst.constraints()) {
            let scope: Vec<u32> = want.scope.iter().map(|v| v.idx()).collect();
            assert_eq!(got.scope, scope);
            assert_eq!(got.default_cost, want.default_cost as f64);
            assert_eq!(got.tuples, want.tuples);
        }
    }

    #[test]
    fn truncated_input() {
        let input = "ccg_dcop 2 2 3 99999\n2 2\n1 1 999999 2\n0 0\n";
        assert!(matches!(
            parse_wcsp(Cursor::new(input)),
            Err(super::super::ParsingError::Wcsp(Error::UnexpectedEof))
        ));
    }
}
