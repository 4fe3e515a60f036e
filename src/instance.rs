use std::fmt;
use ahash::AHashMap;
use indexmap::IndexSet;
use petgraph::unionfind::UnionFind;
use thiserror::Error;
use crate::error::InstanceError;

pub type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Terminal,
    NonTerminal,
}

/// undirected edge {u,v}, stored with the smaller id first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge(NodeId, NodeId);

impl Edge {
    /// returns the normalized edge {u,v} (None if u == v)
    pub fn new(u: NodeId, v: NodeId) -> Option<Self> {
        match u.cmp(&v) {
            std::cmp::Ordering::Less => Some(Edge(u, v)),
            std::cmp::Ordering::Greater => Some(Edge(v, u)),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn u(&self) -> NodeId {
        self.0
    }

    pub fn v(&self) -> NodeId {
        self.1
    }

    pub fn endpoints(&self) -> [NodeId; 2] {
        [self.0, self.1]
    }

    /// returns whether 'node' is an endpoint of the edge
    pub fn contains(&self, node: NodeId) -> bool {
        self.0 == node || self.1 == node
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// reasons why a node/edge selection is not a feasible connected subgraph
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SelectionDefect {
    #[error("terminal {0} is not selected")]
    MissingTerminal(NodeId),
    #[error("node {0} does not belong to the instance")]
    UnknownNode(NodeId),
    #[error("edge {0} does not belong to the instance")]
    UnknownEdge(Edge),
    #[error("edge {0} has an endpoint outside the selection")]
    DanglingEdge(Edge),
    #[error("selection costs {cost} but the budget is {budget}")]
    OverBudget { cost: f64, budget: f64 },
    #[error("selected edges do not connect the selected nodes")]
    Disconnected,
}

/// immutable problem instance of the prize-collecting connected subgraph problem
#[derive(Clone, Debug)]
pub struct Instance {
    terminals: IndexSet<NodeId>,
    non_terminals: IndexSet<NodeId>,
    costs: AHashMap<NodeId, f64>,
    profits: AHashMap<NodeId, f64>,
    edges: IndexSet<Edge>,
    budget: Option<f64>,
}

impl Instance {
    pub fn builder() -> InstanceBuilder {
        InstanceBuilder::default()
    }

    pub fn terminals(&self) -> &IndexSet<NodeId> {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &IndexSet<NodeId> {
        &self.non_terminals
    }

    /// iterates over all nodes (terminals first, then non-terminals, both in insertion order)
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.terminals.iter().chain(self.non_terminals.iter()).copied()
    }

    pub fn node_count(&self) -> usize {
        self.terminals.len() + self.non_terminals.len()
    }

    pub fn edges(&self) -> &IndexSet<Edge> {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn budget(&self) -> Option<f64> {
        self.budget
    }

    pub fn contains_node(&self, v: NodeId) -> bool {
        self.terminals.contains(&v) || self.non_terminals.contains(&v)
    }

    pub fn is_terminal(&self, v: NodeId) -> bool {
        self.terminals.contains(&v)
    }

    pub fn kind(&self, v: NodeId) -> Option<NodeKind> {
        if self.terminals.contains(&v) {
            Some(NodeKind::Terminal)
        } else if self.non_terminals.contains(&v) {
            Some(NodeKind::NonTerminal)
        } else {
            None
        }
    }

    pub fn cost(&self, v: NodeId) -> f64 {
        self.costs.get(&v).copied().unwrap_or_default()
    }

    pub fn profit(&self, v: NodeId) -> f64 {
        self.profits.get(&v).copied().unwrap_or_default()
    }

    /// cost of all terminals (always paid)
    pub fn terminal_cost(&self) -> f64 {
        self.terminals.iter().map(|&t| self.cost(t)).sum()
    }

    /// profit of all terminals (constant part of every objective value)
    pub fn terminal_profit(&self) -> f64 {
        self.terminals.iter().map(|&t| self.profit(t)).sum()
    }

    /// returns the edges with both endpoints in 'set' (i.e. E(S))
    pub fn edges_within<'a>(&'a self, set: &'a IndexSet<NodeId>) -> impl Iterator<Item = Edge> + 'a {
        self.edges.iter()
            .filter(move |e| set.contains(&e.u()) && set.contains(&e.v()))
            .copied()
    }

    /// checks that 'nodes' and 'edges' form a connected subgraph that contains every terminal
    /// and respects the budget
    pub fn verify_selection(&self, nodes: &[NodeId], edges: &[Edge]) -> Result<(), SelectionDefect> {
        let selected: IndexSet<NodeId> = nodes.iter().copied().collect();
        if let Some(&v) = selected.iter().find(|&&v| !self.contains_node(v)) {
            return Err(SelectionDefect::UnknownNode(v));
        }
        if let Some(&t) = self.terminals.iter().find(|t| !selected.contains(*t)) {
            return Err(SelectionDefect::MissingTerminal(t));
        }
        if let Some(budget) = self.budget {
            let cost: f64 = selected.iter().map(|&v| self.cost(v)).sum();
            if cost > budget + 1e-9 {
                return Err(SelectionDefect::OverBudget { cost, budget });
            }
        }

        // union-find over the positions of the selected nodes
        let mut components = UnionFind::<usize>::new(selected.len());
        for e in edges {
            if !self.edges.contains(e) {
                return Err(SelectionDefect::UnknownEdge(*e));
            }
            match (selected.get_index_of(&e.u()), selected.get_index_of(&e.v())) {
                (Some(a), Some(b)) => {
                    components.union(a, b);
                }
                _ => return Err(SelectionDefect::DanglingEdge(*e)),
            }
        }
        if (1..selected.len()).any(|i| !components.equiv(0, i)) {
            return Err(SelectionDefect::Disconnected);
        }
        Ok(())
    }
}

/// collects nodes and edges and validates them into an 'Instance'
#[derive(Clone, Debug, Default)]
pub struct InstanceBuilder {
    nodes: Vec<(NodeId, NodeKind, f64, f64)>,   // (id, kind, profit, cost)
    edges: Vec<(NodeId, NodeId)>,
    budget: Option<f64>,
}

impl InstanceBuilder {
    pub fn node(mut self, id: NodeId, kind: NodeKind, profit: f64, cost: f64) -> Self {
        self.add_node(id, kind, profit, cost);
        self
    }

    pub fn terminal(self, id: NodeId, profit: f64, cost: f64) -> Self {
        self.node(id, NodeKind::Terminal, profit, cost)
    }

    pub fn non_terminal(self, id: NodeId, profit: f64, cost: f64) -> Self {
        self.node(id, NodeKind::NonTerminal, profit, cost)
    }

    pub fn edge(mut self, u: NodeId, v: NodeId) -> Self {
        self.add_edge(u, v);
        self
    }

    pub fn budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn add_node(&mut self, id: NodeId, kind: NodeKind, profit: f64, cost: f64) {
        self.nodes.push((id, kind, profit, cost));
    }

    pub fn add_edge(&mut self, u: NodeId, v: NodeId) {
        self.edges.push((u, v));
    }

    pub fn set_budget(&mut self, budget: Option<f64>) {
        self.budget = budget;
    }

    pub fn build(self) -> Result<Instance, InstanceError> {
        let mut instance = Instance {
            terminals: IndexSet::new(),
            non_terminals: IndexSet::new(),
            costs: AHashMap::with_capacity(self.nodes.len()),
            profits: AHashMap::with_capacity(self.nodes.len()),
            edges: IndexSet::with_capacity(self.edges.len()),
            budget: self.budget,
        };
        for (id, kind, profit, cost) in self.nodes {
            if instance.contains_node(id) {
                return Err(InstanceError::DuplicateNode(id));
            }
            if !profit.is_finite() || profit < 0.0 {
                return Err(InstanceError::InvalidWeight { node: id, field: "profit", value: profit });
            }
            if !cost.is_finite() || cost < 0.0 {
                return Err(InstanceError::InvalidWeight { node: id, field: "cost", value: cost });
            }
            match kind {
                NodeKind::Terminal => instance.terminals.insert(id),
                NodeKind::NonTerminal => instance.non_terminals.insert(id),
            };
            instance.profits.insert(id, profit);
            instance.costs.insert(id, cost);
        }
        if instance.terminals.is_empty() {
            return Err(InstanceError::NoTerminals);
        }
        if let Some(b) = instance.budget {
            if !b.is_finite() {
                return Err(InstanceError::InvalidBudget(b));
            }
        }
        for (u, v) in self.edges {
            let edge = Edge::new(u, v).ok_or(InstanceError::SelfLoop(u))?;
            for endpoint in edge.endpoints() {
                if !instance.contains_node(endpoint) {
                    return Err(InstanceError::UnknownEndpoint { u, v, unknown: endpoint });
                }
            }
            instance.edges.insert(edge);  // duplicates (incl. reversed ones) are merged
        }
        Ok(instance)
    }
}
