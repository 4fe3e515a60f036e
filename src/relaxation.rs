use indexmap::{IndexMap, IndexSet};
use log::debug;
use crate::instance::{Edge, Instance, NodeId};
use crate::microlp_engine::MicrolpEngine;
use crate::mip_trait::{Comparison, MipEngine, SolveStatus, VarDomain, VarId};
use crate::solution::Solution;

/// connectivity inequality  sum_{e in edges} x_e <= sum_{v in nodes} y_v + constant
#[derive(Clone, Debug, PartialEq)]
pub struct CuttingPlaneConstraint {
    pub edges: Vec<Edge>,       // E(S)
    pub nodes: Vec<NodeId>,     // non-terminals on the right-hand side
    pub constant: f64,
}

impl CuttingPlaneConstraint {
    /// x(E(S)) <= y(S ∩ N) + |S ∩ T| - 1  (valid for every S that contains a terminal)
    pub fn general(instance: &Instance, set: &IndexSet<NodeId>) -> Self {
        let terminals = set.iter().filter(|&&v| instance.is_terminal(v)).count();
        CuttingPlaneConstraint {
            edges: instance.edges_within(set).collect(),
            nodes: set.iter().copied().filter(|&v| !instance.is_terminal(v)).collect(),
            constant: terminals as f64 - 1.0,
        }
    }

    /// x(E(S)) <= y(S ∩ N \ {k})  (valid for every S and every k in S)
    pub fn non_terminal(instance: &Instance, set: &IndexSet<NodeId>, excluded: NodeId) -> Self {
        CuttingPlaneConstraint {
            edges: instance.edges_within(set).collect(),
            nodes: set.iter().copied().filter(|&v| v != excluded && !instance.is_terminal(v)).collect(),
            constant: 0.0,
        }
    }

    /// right-hand side minus left-hand side at 'solution' (negative iff violated)
    pub fn slack(&self, solution: &Solution) -> f64 {
        let rhs: f64 = self.nodes.iter().map(|&v| solution.node_value(v)).sum::<f64>() + self.constant;
        let lhs: f64 = self.edges.iter().map(|e| solution.edge_value(e)).sum();
        rhs - lhs
    }

    /// checks the inequality for the 0/1 selection given by 'nodes' and 'edges'
    pub fn holds_for(&self, nodes: &IndexSet<NodeId>, edges: &IndexSet<Edge>) -> bool {
        let lhs = self.edges.iter().filter(|e| edges.contains(*e)).count() as f64;
        let rhs = self.nodes.iter().filter(|v| nodes.contains(*v)).count() as f64 + self.constant;
        lhs <= rhs + 1e-9
    }
}

/// LP/MIP relaxation of the connected subgraph problem
/// one variable per non-terminal (y_v) and per edge (x_e); terminals are fixed to 1
#[derive(Debug)]
pub struct RelaxationModel<'a, E: MipEngine = MicrolpEngine> {
    instance: &'a Instance,
    engine: E,
    node_vars: IndexMap<NodeId, VarId>,
    edge_vars: IndexMap<Edge, VarId>,
    integral: bool,             // all variables are binary
    cuts: usize,                // number of cutting planes added so far
}

impl<'a, E: MipEngine + Default> RelaxationModel<'a, E> {
    pub fn create(instance: &'a Instance, integral: bool) -> Self {
        Self::with_engine(instance, E::default(), integral)
    }
}

impl<'a, E: MipEngine> RelaxationModel<'a, E> {
    /// creates the variables in 'engine' (binary if 'integral', else continuous in [0,1])
    pub fn with_engine(instance: &'a Instance, mut engine: E, integral: bool) -> Self {
        let domain = if integral { VarDomain::Binary } else { VarDomain::Continuous };
        let mut node_vars = IndexMap::with_capacity(instance.non_terminals().len());
        for &v in instance.non_terminals() {
            let v_name = format!("y_{v}");
            node_vars.insert(v, engine.add_variable(&v_name, domain));
        }
        let mut edge_vars = IndexMap::with_capacity(instance.edge_count());
        for &e in instance.edges() {
            let e_name = format!("x_{}_{}", e.u(), e.v());
            edge_vars.insert(e, engine.add_variable(&e_name, domain));
        }
        RelaxationModel { instance, engine, node_vars, edge_vars, integral, cuts: 0 }
    }

    /// x(E) = y(N) + |T| - 1
    pub fn add_cardinality_constraint(&mut self) {
        let terms: Vec<(VarId, f64)> = self.edge_vars.values().map(|&x| (x, 1.0))
            .chain(self.node_vars.values().map(|&y| (y, -1.0)))
            .collect();
        let rhs = self.instance.terminals().len() as f64 - 1.0;
        self.engine.add_constraint("card_cons", &terms, Comparison::Eq, rhs);
    }

    /// sum of cost_v * y_v <= budget - cost(T)  (skipped if the instance has no budget)
    pub fn add_budget_constraint(&mut self) {
        let Some(budget) = self.instance.budget() else {
            debug!("instance has no budget -> no budget constraint");
            return;
        };
        let terms: Vec<(VarId, f64)> = self.node_vars.iter()
            .map(|(&v, &y)| (y, self.instance.cost(v)))
            .filter(|&(_, cost)| cost != 0.0)
            .collect();
        let rhs = budget - self.instance.terminal_cost();
        self.engine.add_constraint("budget_cons", &terms, Comparison::Le, rhs);
    }

    /// maximize sum of profit_v * y_v (the profit of the terminals is constant)
    pub fn maximize_profit(&mut self) {
        let terms: Vec<(VarId, f64)> = self.node_vars.iter()
            .map(|(&v, &y)| (y, self.instance.profit(v)))
            .collect();
        self.engine.maximize(&terms);
    }

    pub fn add_cutting_plane(&mut self, constraint: &CuttingPlaneConstraint) {
        // x(E(S)) - y(...) <= constant
        let terms: Vec<(VarId, f64)> = constraint.edges.iter()
            .filter_map(|e| self.edge_vars.get(e).map(|&x| (x, 1.0)))
            .chain(constraint.nodes.iter().filter_map(|v| self.node_vars.get(v).map(|&y| (y, -1.0))))
            .collect();
        let name = format!("cut_{}", self.cuts);
        self.engine.add_constraint(&name, &terms, Comparison::Le, constraint.constant);
        self.cuts += 1;
    }

    /// switches all variables to binary domains (constraints are kept; never reversed)
    pub fn tighten_to_integral(&mut self) {
        if self.integral {
            return;
        }
        for &var in self.node_vars.values().chain(self.edge_vars.values()) {
            self.engine.set_domain(var, VarDomain::Binary);
        }
        self.integral = true;
    }

    pub fn solve(&mut self) -> SolveStatus {
        self.engine.solve()
    }

    /// reads back the values of the last optimal solve
    pub fn current_solution(&self) -> Solution {
        let node_values = self.node_vars.iter().map(|(&v, &y)| (v, self.engine.value(y))).collect();
        let edge_values = self.edge_vars.iter().map(|(&e, &x)| (e, self.engine.value(x))).collect();
        Solution::new(node_values, edge_values, self.engine.objective_value())
    }

    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn is_integral(&self) -> bool {
        self.integral
    }

    pub fn cut_count(&self) -> usize {
        self.cuts
    }

    pub fn variable_count(&self) -> usize {
        self.engine.variable_count()
    }

    pub fn constraint_count(&self) -> usize {
        self.engine.constraint_count()
    }
}
