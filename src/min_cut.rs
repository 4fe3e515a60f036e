use std::collections::VecDeque;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// residual capacities below this value count as saturated
const FLOW_TOLERANCE: f64 = 1e-12;

/// minimum s-t cut of a weighted directed graph
#[derive(Clone, Debug, PartialEq)]
pub struct MinCut {
    /// sum of the weights of all arcs from the source side to the sink side
    pub value: f64,
    source_side: Vec<usize>,
    sink_side: Vec<usize>,
}

impl MinCut {
    /// node indices reachable from the source in the residual network (sorted)
    pub fn source_side(&self) -> &[usize] {
        &self.source_side
    }

    /// all other node indices (sorted)
    pub fn sink_side(&self) -> &[usize] {
        &self.sink_side
    }
}

/// residual network for Dinic's algorithm
/// arc 2i is the i-th arc of the input graph, arc 2i+1 its reverse arc
struct Dinic {
    head: Vec<usize>,
    residual: Vec<f64>,
    adjacency: Vec<Vec<usize>>,
    level: Vec<usize>,
    next: Vec<usize>,
}

impl Dinic {
    fn new<N>(network: &DiGraph<N, f64>) -> Self {
        let n = network.node_count();
        let mut dinic = Dinic {
            head: Vec::with_capacity(2 * network.edge_count()),
            residual: Vec::with_capacity(2 * network.edge_count()),
            adjacency: vec![Vec::new(); n],
            level: vec![usize::MAX; n],
            next: vec![0; n],
        };
        for arc in network.edge_references() {
            let (u, v) = (arc.source().index(), arc.target().index());
            debug_assert!(*arc.weight() >= 0.0);
            dinic.adjacency[u].push(dinic.head.len());
            dinic.head.push(v);
            dinic.residual.push(*arc.weight());
            dinic.adjacency[v].push(dinic.head.len());
            dinic.head.push(u);
            dinic.residual.push(0.0);
        }
        dinic
    }

    /// BFS from 's' over non-saturated arcs; returns whether 't' was reached
    fn compute_levels(&mut self, s: usize, t: usize) -> bool {
        self.level.iter_mut().for_each(|l| *l = usize::MAX);
        self.level[s] = 0;
        let mut queue = VecDeque::from([s]);
        while let Some(u) = queue.pop_front() {
            for &arc in &self.adjacency[u] {
                let v = self.head[arc];
                if self.level[v] == usize::MAX && self.residual[arc] > FLOW_TOLERANCE {
                    self.level[v] = self.level[u] + 1;
                    queue.push_back(v);
                }
            }
        }
        self.level[t] != usize::MAX
    }

    /// pushes at most 'limit' units along one shortest augmenting path; returns the amount
    fn augment(&mut self, u: usize, t: usize, limit: f64) -> f64 {
        if u == t {
            return limit;
        }
        while self.next[u] < self.adjacency[u].len() {
            let arc = self.adjacency[u][self.next[u]];
            let v = self.head[arc];
            if self.level[v] == self.level[u] + 1 && self.residual[arc] > FLOW_TOLERANCE {
                let pushed = self.augment(v, t, limit.min(self.residual[arc]));
                if pushed > 0.0 {
                    self.residual[arc] -= pushed;
                    self.residual[arc ^ 1] += pushed;
                    return pushed;
                }
            }
            self.next[u] += 1;  // arc is saturated or leads into a dead end
        }
        0.0
    }

    fn max_flow(&mut self, s: usize, t: usize) -> f64 {
        let mut value = 0.0;
        while self.compute_levels(s, t) {
            self.next.iter_mut().for_each(|i| *i = 0);
            loop {
                let pushed = self.augment(s, t, f64::INFINITY);
                if pushed <= FLOW_TOLERANCE {
                    break;
                }
                value += pushed;
            }
        }
        value
    }
}

/// computes a minimum s-t cut of 'network' (arc weights are capacities, +inf is allowed as long
/// as every s-t path contains a finite arc)
/// the source side is the set of nodes reachable from 'source' after a maximum flow was found
pub fn st_min_cut<N>(network: &DiGraph<N, f64>, source: NodeIndex, sink: NodeIndex) -> MinCut {
    assert_ne!(source, sink);
    let (s, t) = (source.index(), sink.index());
    let mut dinic = Dinic::new(network);
    dinic.max_flow(s, t);

    // after the last (failed) BFS, 'level' marks exactly the nodes reachable from 's'
    dinic.compute_levels(s, t);
    let (source_side, sink_side): (Vec<usize>, Vec<usize>) = (0..network.node_count())
        .partition(|&v| dinic.level[v] != usize::MAX);

    let value = network.edge_references()
        .filter(|arc| dinic.level[arc.source().index()] != usize::MAX
            && dinic.level[arc.target().index()] == usize::MAX)
        .map(|arc| *arc.weight())
        .sum();

    MinCut { value, source_side, sink_side }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn network(n: usize, arcs: &[(usize, usize, f64)]) -> DiGraph<(), f64> {
        let mut g = DiGraph::new();
        for _ in 0..n {
            g.add_node(());
        }
        for &(u, v, w) in arcs {
            g.add_edge(NodeIndex::new(u), NodeIndex::new(v), w);
        }
        g
    }

    #[test]
    fn min_cut_test() {
        // s = 0, v1..v4 = 1..4, t = 5 -> max flow 23
        let g = network(6, &[(0, 1, 16.0), (0, 2, 13.0), (1, 3, 12.0), (2, 1, 4.0), (2, 4, 14.0),
                             (3, 2, 9.0), (3, 5, 20.0), (4, 3, 7.0), (4, 5, 4.0)]);
        let cut = st_min_cut(&g, NodeIndex::new(0), NodeIndex::new(5));
        assert!(approx(cut.value, 23.0));
        assert_eq!(cut.source_side(), &[0, 1, 2, 4]);
        assert_eq!(cut.sink_side(), &[3, 5]);
    }

    #[test]
    fn min_cut_infinite_arcs() {
        // an infinite arc forces both of its ends to the same side of every finite cut
        let g = network(4, &[(0, 1, 0.5), (1, 2, f64::INFINITY), (2, 3, 0.3), (0, 2, 0.1)]);
        let cut = st_min_cut(&g, NodeIndex::new(0), NodeIndex::new(3));
        assert!(approx(cut.value, 0.3));
        assert_eq!(cut.source_side(), &[0, 1, 2]);
        assert_eq!(cut.sink_side(), &[3]);
    }

    #[test]
    fn min_cut_disconnected() {
        let g = network(4, &[(0, 1, 1.0), (2, 3, 1.0)]);
        let cut = st_min_cut(&g, NodeIndex::new(0), NodeIndex::new(3));
        assert_eq!(cut.value, 0.0);
        assert_eq!(cut.source_side(), &[0, 1]);
        assert_eq!(cut.sink_side(), &[2, 3]);
    }
}
