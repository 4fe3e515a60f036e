use indexmap::IndexSet;
use petgraph::graph::{DiGraph, NodeIndex};
use crate::error::SolverError;
use crate::instance::{Edge, Instance, NodeId};
use crate::min_cut::{st_min_cut, MinCut};
use crate::solution::Solution;

/// identity of a node of the auxiliary flow network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowNode {
    Source,
    Edge(Edge),     // layer V1
    Node(NodeId),   // layer V2
    Sink,
}

/// auxiliary network  source -> V1 (edges) -> V2 (nodes) -> sink  built from a fractional solution
/// 'elements' maps flow node index <-> identity (index i of 'elements' is node i of 'graph')
#[derive(Debug)]
pub struct FlowNetwork {
    elements: IndexSet<FlowNode>,
    graph: DiGraph<FlowNode, f64>,
    source_capacity: f64,           // sum of the weights of all arcs leaving the source
}

impl FlowNetwork {
    /// builds the network for exclusion node 'excluded' and the node set 'universe'
    /// V1: edges with positive value whose endpoints lie in universe ∪ {excluded}
    /// V2: nodes of universe \ {excluded} that are terminals or have positive value
    pub fn build(instance: &Instance, solution: &Solution, excluded: NodeId,
                 universe: &IndexSet<NodeId>) -> Result<Self, SolverError> {
        let in_scope = |v: NodeId| v == excluded || universe.contains(&v);

        let mut elements: IndexSet<FlowNode> = IndexSet::new();
        elements.insert(FlowNode::Source);
        let mut source_capacity = 0.0;
        for (e, x) in solution.positive_edges() {
            if in_scope(e.u()) && in_scope(e.v()) {
                elements.insert(FlowNode::Edge(e));
                source_capacity += x;
            }
        }
        for &v in universe {
            if v != excluded && (instance.is_terminal(v) || solution.node_value(v) > 0.0) {
                elements.insert(FlowNode::Node(v));
            }
        }
        let (sink, _) = elements.insert_full(FlowNode::Sink);

        // arcs and weights are produced by one traversal over the elements
        let mut arcs: Vec<(usize, usize)> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        for (index, element) in elements.iter().enumerate() {
            match *element {
                FlowNode::Edge(e) => {
                    arcs.push((0, index));
                    weights.push(solution.edge_value(&e));
                    for endpoint in e.endpoints() {
                        if let Some(target) = elements.get_index_of(&FlowNode::Node(endpoint)) {
                            arcs.push((index, target));
                            weights.push(f64::INFINITY);
                        }
                    }
                }
                FlowNode::Node(v) => {
                    arcs.push((index, sink));
                    weights.push(solution.selection(instance, v));
                }
                FlowNode::Source | FlowNode::Sink => {}
            }
        }
        if arcs.len() != weights.len() {
            return Err(SolverError::FlowConstruction { arcs: arcs.len(), weights: weights.len() });
        }

        let mut graph = DiGraph::with_capacity(elements.len(), arcs.len());
        for &element in &elements {
            graph.add_node(element);
        }
        for (&(u, v), &w) in arcs.iter().zip(weights.iter()) {
            graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), w);
        }
        debug_assert_eq!(graph.edge_count(), weights.len());

        Ok(FlowNetwork { elements, graph, source_capacity })
    }

    pub fn source(&self) -> usize {
        0
    }

    pub fn sink(&self) -> usize {
        self.elements.len() - 1
    }

    /// identity of flow node 'index'
    pub fn element(&self, index: usize) -> Option<FlowNode> {
        self.elements.get_index(index).copied()
    }

    /// flow node index of 'element'
    pub fn index_of(&self, element: &FlowNode) -> Option<usize> {
        self.elements.get_index_of(element)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// sum of the values of all edges in V1
    pub fn source_capacity(&self) -> f64 {
        self.source_capacity
    }

    pub fn min_cut(&self) -> MinCut {
        let cut = st_min_cut(&self.graph, NodeIndex::new(self.source()), NodeIndex::new(self.sink()));
        debug_assert!(cut.sink_side().contains(&self.sink()));
        cut
    }

    /// min cut value minus the source capacity (= slack of the connectivity inequality of the
    /// source side) and the source side mapped back to original node ids (incl. 'excluded')
    pub fn reduce(&self, cut: &MinCut, excluded: NodeId) -> (f64, IndexSet<NodeId>) {
        let mut set: IndexSet<NodeId> = IndexSet::new();
        for &index in cut.source_side() {
            match self.element(index) {
                Some(FlowNode::Edge(e)) => {
                    set.extend(e.endpoints());
                }
                Some(FlowNode::Node(v)) => {
                    set.insert(v);
                }
                _ => {}
            }
        }
        set.insert(excluded);
        set.sort();
        (cut.value - self.source_capacity, set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // complete graph on the non-terminals 2, 3, 4 (terminal 1 is attached to 2)
    fn setup() -> (Instance, Solution) {
        let instance = Instance::builder()
            .terminal(1, 0.0, 0.0)
            .non_terminal(2, 1.0, 1.0)
            .non_terminal(3, 1.0, 1.0)
            .non_terminal(4, 1.0, 1.0)
            .edge(2, 3).edge(2, 4).edge(3, 4).edge(1, 2)
            .build()
            .unwrap();
        let solution = Solution::from_values(&[(2, 0.5), (3, 0.6), (4, 0.3)],
                                             &[((2, 3), 0.4), ((2, 4), 0.7), ((3, 4), 0.9), ((1, 2), 0.0)]);
        (instance, solution)
    }

    #[test]
    fn test_compute_cut_discarding_nonexistent_node() {
        let (instance, solution) = setup();
        let universe = instance.non_terminals().clone();
        let network = FlowNetwork::build(&instance, &solution, 1, &universe).unwrap();
        // source, 3 edges, 3 nodes, sink
        assert_eq!(network.node_count(), 8);
        assert_eq!(network.arc_count(), 3 + 6 + 3);
        assert_eq!(network.element(7), Some(FlowNode::Sink));
        assert_eq!(network.index_of(&FlowNode::Node(2)), Some(4));
        let cut = network.min_cut();
        assert!(approx(cut.value, 1.4));
        assert_eq!(cut.sink_side(), &[7]);
        assert_eq!(cut.source_side(), &[0, 1, 2, 3, 4, 5, 6]);
        let (reduced, set) = network.reduce(&cut, 1);
        assert!(approx(reduced, -0.6));
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_compute_cut_discarding_existent_node() {
        let (instance, solution) = setup();
        let universe = instance.non_terminals().clone();
        let network = FlowNetwork::build(&instance, &solution, 2, &universe).unwrap();
        // source, 3 edges, nodes 3 and 4, sink
        assert_eq!(network.node_count(), 7);
        assert_eq!(network.index_of(&FlowNode::Node(2)), None);
        let cut = network.min_cut();
        assert!(approx(cut.value, 0.9));
        assert_eq!(cut.sink_side(), &[6]);
        assert_eq!(cut.source_side(), &[0, 1, 2, 3, 4, 5]);
        let (reduced, set) = network.reduce(&cut, 2);
        assert!(approx(reduced, -1.1));
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_terminals_have_unit_weight() {
        let (instance, solution) = setup();
        let universe: IndexSet<NodeId> = instance.nodes().collect();
        let network = FlowNetwork::build(&instance, &solution, 4, &universe).unwrap();
        // (1,2) has value 0 -> not part of V1, but terminal 1 is part of V2
        assert_eq!(network.index_of(&FlowNode::Edge(Edge::new(1, 2).unwrap())), None);
        assert!(network.index_of(&FlowNode::Node(1)).is_some());
        assert!(approx(network.source_capacity(), 2.0));
        let cut = network.min_cut();
        // terminal 1 has no incident positive edge -> stays on the sink side
        let terminal = network.index_of(&FlowNode::Node(1)).unwrap();
        assert!(cut.sink_side().contains(&terminal));
    }
}
