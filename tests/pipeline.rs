//! Integration tests driving the full CCG to DCOP pipeline through the
//! file formats.

use std::{fs, io::Cursor};

use ccg2dcop::instances::{fio, Ccg, Dcop, DEFAULT_COST};

/// A graph with two decision vertices, one auxiliary vertex, and one vertex
/// already fixed to 0
const INPUT: &str = "\
v 1 1.5
v 2 2
v 3 3
v 4 4
e 1 2
e 2 3
e 3 4
vertex types begin
1 0
2 0
3 1
4 1
vertex types end
assignments begin
4 0
assignments end
";

fn converted() -> Dcop {
    let graph = Ccg::from_reader(Cursor::new(INPUT)).unwrap();
    Dcop::build(graph.kernelize().unwrap())
}

#[test]
fn kernel_shape() {
    let dcop = converted();
    // v4 is assigned and leaves the kernel, forcing v3
    assert_eq!(dcop.n_agents(), 2);
    assert_eq!(dcop.n_variables(), 3);
    // three unary tables plus the two surviving conflicts
    assert_eq!(dcop.n_constraints(), 5);
}

#[test]
fn agent_lists_partition_variables() {
    let dcop = converted();
    let mut owned = vec![];
    for agent in dcop.agents() {
        owned.extend_from_slice(agent.variables());
    }
    let mut deduped = owned.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(owned.len(), deduped.len());
    assert_eq!(owned.len(), dcop.n_variables());
}

#[test]
fn table_shapes() {
    let inst = converted().to_instance("ccg_dcop");
    for con in inst.constraints() {
        match con.arity() {
            1 => assert_eq!(con.tuples.len(), 2),
            2 => {
                assert_eq!(con.tuples.len(), 4);
                assert_eq!(con.tuples[0].0, [0, 0]);
                assert_eq!(con.tuples[0].1, DEFAULT_COST as f64);
            }
            arity => panic!("unexpected arity {arity}"),
        }
    }
}

#[test]
fn wcsp_round_trip() {
    let inst = converted().to_instance("ccg_dcop");
    let mut buf = vec![];
    inst.write_wcsp(&mut buf).unwrap();
    let parsed = fio::wcsp::parse_wcsp(Cursor::new(buf)).unwrap();
    assert_eq!(parsed.domain_sizes.len(), inst.variables().len());
    assert_eq!(parsed.constraints.len(), inst.constraints().len());
    for (got, want) in parsed.constraints.iter().zip(inst.constraints()) {
        assert_eq!(got.tuples, want.tuples);
    }
}

#[test]
fn output_file_set() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("instance");
    let dcop = converted();
    dcop.write_json_path(base.with_extension("json")).unwrap();
    let inst = dcop.to_instance("ccg_dcop");
    inst.write_xcsp_path(dir.path().join("instance_dcop.xml"))
        .unwrap();
    inst.write_wcsp_path(dir.path().join("instance_dcop.wcsp"))
        .unwrap();
    inst.write_json_path(dir.path().join("instance_dcop.json"))
        .unwrap();

    let xml = fs::read_to_string(dir.path().join("instance_dcop.xml")).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" ?>\n<instance>"));
    assert!(xml.contains("format=\"XCSP 2.1_FRODO\""));

    let wcsp = fs::read_to_string(dir.path().join("instance_dcop.wcsp")).unwrap();
    assert!(wcsp.starts_with("ccg_dcop 3 2 5 99999\n2 2 2\n"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("instance_dcop.json")).unwrap())
            .unwrap();
    assert_eq!(json["variables"]["v3"]["agent"], "a1");

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(base.with_extension("json")).unwrap()).unwrap();
    assert_eq!(raw["assigned_vars"]["v4"], 0);
    assert_eq!(raw["agents"]["a2"]["vars"], serde_json::json!(["v2", "v3"]));
}

#[test]
fn infeasible_input_rejected() {
    let input = "\
v 1 1
v 2 1
e 1 2
vertex types begin
1 1
2 1
vertex types end
assignments begin
1 0
2 0
assignments end
";
    let graph = Ccg::from_reader(Cursor::new(input)).unwrap();
    assert!(graph.kernelize().is_err());
}

#[test]
fn fully_decided_input_is_solved() {
    let input = "\
v 1 1
vertex types begin
1 0
vertex types end
assignments begin
1 1
assignments end
";
    let graph = Ccg::from_reader(Cursor::new(input)).unwrap();
    assert!(graph.kernelize().unwrap().is_solved());
}
