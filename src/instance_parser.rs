use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use std::str::FromStr;
use indexmap::IndexSet;
use log::{debug, warn};
use crate::error::InstanceError;
use crate::instance::{Instance, NodeId, NodeKind};

/// reads an instance file (see parse_instance for the format)
pub fn read_instance_from_file(file: impl AsRef<Path>, with_budget: bool) -> Result<Instance, InstanceError> {
    let f = File::open(file.as_ref())?;                     // open file or return error
    debug!("reading instance {:?}", file.as_ref());
    parse_instance(io::BufReader::new(f), with_budget)
}

/// splits a line into its prefix and the remaining tokens
fn tokens(line: &str) -> (&str, std::str::SplitWhitespace<'_>) {
    let mut split = line.split_whitespace();
    let prefix = split.next().unwrap_or_default();
    (prefix, split)
}

fn expect_prefix(line_no: usize, line: &str, expected: char) -> Result<(), InstanceError> {
    let (prefix, _) = tokens(line);
    if prefix.len() == 1 && prefix.starts_with(expected) {
        Ok(())
    } else {
        Err(InstanceError::UnexpectedPrefix { line: line_no, expected, found: prefix.to_owned() })
    }
}

fn next_value<'s, T: FromStr>(split: &mut impl Iterator<Item = &'s str>, line: usize,
                               field: &'static str) -> Result<T, InstanceError> {
    let token = split.next().ok_or(InstanceError::MissingField { line, field })?;
    token.parse::<T>().map_err(|_| InstanceError::InvalidNumber { line, token: token.to_owned() })
}

/// parses an instance in the following line-based format:
///   c <comment>                   (anywhere, ignored; blank lines are ignored too)
///   p <num_nodes> <num_terminals> (first record)
///   n <id> <is_terminal> <profit> <cost> <num_neighbours> <neighbour ids...>
///   b <budget>                    (last record, only if 'with_budget')
pub fn parse_instance(reader: impl BufRead, with_budget: bool) -> Result<Instance, InstanceError> {
    // (line number, content) of all records
    let mut records: Vec<(usize, String)> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;                                               // ignore comments
        }
        records.push((i + 1, trimmed.to_owned()));
    }
    let mut records = records.into_iter();

    let (line_no, first) = records.next().ok_or(InstanceError::Empty)?;
    expect_prefix(line_no, &first, 'p')?;
    let (_, mut split) = tokens(&first);
    let num_nodes: usize = next_value(&mut split, line_no, "number of nodes")?;
    let num_terminals: usize = next_value(&mut split, line_no, "number of terminals")?;

    let mut rest: Vec<(usize, String)> = records.collect();
    let mut builder = Instance::builder();
    if with_budget {
        let (line_no, budget_line) = rest.pop().ok_or(InstanceError::MissingBudget)?;
        expect_prefix(line_no, &budget_line, 'b')?;
        let (_, mut split) = tokens(&budget_line);
        builder.set_budget(Some(next_value(&mut split, line_no, "budget")?));
    }

    let mut nodes: IndexSet<NodeId> = IndexSet::with_capacity(num_nodes);
    let mut terminals = 0;
    for (line_no, line) in &rest {
        let line_no = *line_no;
        expect_prefix(line_no, line, 'n')?;
        let (_, mut split) = tokens(line);
        let id: NodeId = next_value(&mut split, line_no, "node id")?;
        let is_terminal: u8 = next_value(&mut split, line_no, "terminal flag")?;
        let profit: f64 = next_value(&mut split, line_no, "profit")?;
        let cost: f64 = next_value(&mut split, line_no, "cost")?;
        let num_neighbours: usize = next_value(&mut split, line_no, "number of neighbours")?;
        let mut neighbours: IndexSet<NodeId> = IndexSet::with_capacity(num_neighbours);
        for token in split {
            let neighbour = token.parse::<NodeId>()
                .map_err(|_| InstanceError::InvalidNumber { line: line_no, token: token.to_owned() })?;
            neighbours.insert(neighbour);
        }
        if neighbours.len() != num_neighbours {
            return Err(InstanceError::NeighbourCount { node: id, expected: num_neighbours, found: neighbours.len() });
        }

        let kind = if is_terminal != 0 { NodeKind::Terminal } else { NodeKind::NonTerminal };
        if kind == NodeKind::Terminal && !nodes.contains(&id) {
            terminals += 1;
        }
        nodes.insert(id);
        builder.add_node(id, kind, profit, cost);
        for neighbour in neighbours {
            if neighbour == id {
                warn!("line {}: ignoring self-loop at node {}", line_no, id);
                continue;
            }
            builder.add_edge(id, neighbour);
        }
    }

    if nodes.len() != num_nodes {
        return Err(InstanceError::NodeCount { expected: num_nodes, found: nodes.len() });
    }
    if terminals != num_terminals {
        return Err(InstanceError::TerminalCount { expected: num_terminals, found: terminals });
    }
    builder.build()
}
