use indexmap::IndexSet;
use log::trace;
use crate::error::SolverError;
use crate::flow_network::FlowNetwork;
use crate::instance::{Instance, NodeId};
use crate::relaxation::CuttingPlaneConstraint;
use crate::solution::Solution;

/// default tolerance of the violation and fractionality tests
pub const EPSILON: f64 = 1e-5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeparationKind {
    /// excluded node k ranges over the terminals, universe = all nodes
    General,
    /// excluded node k ranges over the non-terminals, universe = non-terminals
    NonTerminal,
}

/// result of one flow network construction for a fixed excluded node
#[derive(Clone, Debug, PartialEq)]
pub struct SeparationCut {
    pub kind: SeparationKind,
    pub excluded: NodeId,
    pub cut_value: f64,         // min cut value of the flow network
    pub reduced_value: f64,     // cut_value minus the capacity of all source arcs
    pub nodes: IndexSet<NodeId>,    // S (sorted, contains 'excluded')
}

impl SeparationCut {
    pub fn is_violated(&self, eps: f64) -> bool {
        self.reduced_value < -eps
    }

    /// connectivity inequality of S that the current solution violates
    pub fn to_constraint(&self, instance: &Instance) -> CuttingPlaneConstraint {
        match self.kind {
            SeparationKind::General => CuttingPlaneConstraint::general(instance, &self.nodes),
            SeparationKind::NonTerminal => CuttingPlaneConstraint::non_terminal(instance, &self.nodes, self.excluded),
        }
    }
}

/// searches violated connectivity inequalities for a fixed (fractional) solution
#[derive(Debug)]
pub struct SeparationOracle<'a> {
    instance: &'a Instance,
    solution: &'a Solution,
    eps: f64,
}

impl<'a> SeparationOracle<'a> {
    pub fn new(instance: &'a Instance, solution: &'a Solution) -> Self {
        SeparationOracle { instance, solution, eps: EPSILON }
    }

    pub fn with_tolerance(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    fn universe(&self, kind: SeparationKind) -> IndexSet<NodeId> {
        match kind {
            SeparationKind::General => self.instance.nodes().collect(),
            SeparationKind::NonTerminal => self.instance.non_terminals().clone(),
        }
    }

    fn candidates(&self, kind: SeparationKind) -> &'a IndexSet<NodeId> {
        match kind {
            SeparationKind::General => self.instance.terminals(),
            SeparationKind::NonTerminal => self.instance.non_terminals(),
        }
    }

    /// builds the flow network for excluded node 'excluded' and computes its min cut
    pub fn compute_cut(&self, excluded: NodeId, kind: SeparationKind) -> Result<SeparationCut, SolverError> {
        let universe = self.universe(kind);
        self.cut_in_universe(excluded, kind, &universe)
    }

    fn cut_in_universe(&self, excluded: NodeId, kind: SeparationKind,
                       universe: &IndexSet<NodeId>) -> Result<SeparationCut, SolverError> {
        let network = FlowNetwork::build(self.instance, self.solution, excluded, universe)?;
        let cut = network.min_cut();
        let (reduced_value, nodes) = network.reduce(&cut, excluded);
        trace!("{:?} cut for k = {}: value {:.6}, reduced {:.6}, |S| = {}",
               kind, excluded, cut.value, reduced_value, nodes.len());
        Ok(SeparationCut { kind, excluded, cut_value: cut.value, reduced_value, nodes })
    }

    /// returns the most violated inequality over all excluded nodes of 'kind'
    /// (the first one found in case of ties) or None if no violation exceeds the tolerance
    pub fn find(&self, kind: SeparationKind) -> Result<Option<SeparationCut>, SolverError> {
        let universe = self.universe(kind);
        let mut best: Option<SeparationCut> = None;
        for &k in self.candidates(kind) {
            let cut = self.cut_in_universe(k, kind, &universe)?;
            if best.as_ref().map_or(true, |b| cut.reduced_value < b.reduced_value) {
                best = Some(cut);
            }
        }
        Ok(best.filter(|cut| cut.is_violated(self.eps)))
    }
}
