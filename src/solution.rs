use indexmap::IndexMap;
use crate::instance::{Edge, Instance, NodeId};

/// snapshot of the variable values after an optimal relaxation solve
/// (terminals are implicitly selected and therefore not part of 'node_values')
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Solution {
    node_values: IndexMap<NodeId, f64>,
    edge_values: IndexMap<Edge, f64>,
    objective: f64,
}

impl Solution {
    pub fn new(node_values: IndexMap<NodeId, f64>, edge_values: IndexMap<Edge, f64>, objective: f64) -> Self {
        Solution { node_values, edge_values, objective }
    }

    /// creates a solution from (node, value) and ((u, v), value) pairs
    /// CAUTION: pairs with u == v are ignored!
    pub fn from_values(nodes: &[(NodeId, f64)], edges: &[((NodeId, NodeId), f64)]) -> Self {
        Solution {
            node_values: nodes.iter().copied().collect(),
            edge_values: edges.iter()
                .filter_map(|&((u, v), value)| Edge::new(u, v).map(|e| (e, value)))
                .collect(),
            objective: 0.0,
        }
    }

    /// value of the non-terminal 'v' (0.0 if 'v' has no variable)
    pub fn node_value(&self, v: NodeId) -> f64 {
        self.node_values.get(&v).copied().unwrap_or_default()
    }

    pub fn edge_value(&self, e: &Edge) -> f64 {
        self.edge_values.get(e).copied().unwrap_or_default()
    }

    /// value of 'v' w.r.t. 'instance' (terminals are always 1.0)
    pub fn selection(&self, instance: &Instance, v: NodeId) -> f64 {
        if instance.is_terminal(v) {
            1.0
        } else {
            self.node_value(v)
        }
    }

    pub fn node_values(&self) -> &IndexMap<NodeId, f64> {
        &self.node_values
    }

    pub fn edge_values(&self) -> &IndexMap<Edge, f64> {
        &self.edge_values
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// edges with a strictly positive value (in insertion order)
    pub fn positive_edges(&self) -> impl Iterator<Item = (Edge, f64)> + '_ {
        self.edge_values.iter().filter(|(_, &x)| x > 0.0).map(|(&e, &x)| (e, x))
    }

    pub fn positive_node_count(&self) -> usize {
        self.node_values.values().filter(|&&y| y > 0.0).count()
    }

    pub fn positive_edge_count(&self) -> usize {
        self.edge_values.values().filter(|&&x| x > 0.0).count()
    }

    /// number of values strictly between 'eps' and 1 - 'eps'
    pub fn fractional_count(&self, eps: f64) -> usize {
        self.node_values.values().chain(self.edge_values.values())
            .filter(|&&value| value > eps && value < 1.0 - eps)
            .count()
    }

    pub fn is_integral(&self, eps: f64) -> bool {
        self.fractional_count(eps) == 0
    }
}

/// optimal connected subgraph found by the cutting-plane loop
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectedSubgraph {
    pub nodes: Vec<NodeId>,     // selected nodes incl. terminals (sorted)
    pub edges: Vec<Edge>,       // selected edges (sorted)
    pub profit: f64,            // total profit of the selected nodes (incl. terminals)
    pub cost: f64,              // total cost of the selected nodes (incl. terminals)
    pub objective: f64,         // objective value of the last relaxation (w/o terminal profit)
    pub iterations: usize,
    pub general_cuts: usize,
    pub non_terminal_cuts: usize,
    pub tightened: bool,
}

impl ConnectedSubgraph {
    /// rounds the integral 'solution' to a node and edge selection
    pub(crate) fn from_solution(instance: &Instance, solution: &Solution, eps: f64) -> Self {
        let mut nodes: Vec<NodeId> = instance.terminals().iter().copied()
            .chain(solution.node_values().iter().filter(|(_, &y)| y >= 1.0 - eps).map(|(&v, _)| v))
            .collect();
        nodes.sort_unstable();
        let mut edges: Vec<Edge> = solution.edge_values().iter()
            .filter(|(_, &x)| x >= 1.0 - eps)
            .map(|(&e, _)| e)
            .collect();
        edges.sort_unstable();
        ConnectedSubgraph {
            profit: nodes.iter().map(|&v| instance.profit(v)).sum(),
            cost: nodes.iter().map(|&v| instance.cost(v)).sum(),
            nodes,
            edges,
            objective: solution.objective(),
            iterations: 0,
            general_cuts: 0,
            non_terminal_cuts: 0,
            tightened: false,
        }
    }
}
