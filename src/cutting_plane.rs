use log::{debug, info};
use crate::error::SolverError;
use crate::instance::{Instance, NodeId};
use crate::microlp_engine::MicrolpEngine;
use crate::mip_trait::{MipEngine, SolveStatus};
use crate::relaxation::{CuttingPlaneConstraint, RelaxationModel};
use crate::separation::{SeparationCut, SeparationKind, SeparationOracle, EPSILON};
use crate::solution::{ConnectedSubgraph, Solution};

/// parameters of the cutting-plane loop
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopConfig {
    pub epsilon: f64,                   // violation and fractionality tolerance
    pub integral: bool,                 // start with binary variables
    pub max_iterations: Option<usize>,  // max. number of relaxation solves
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig { epsilon: EPSILON, integral: false, max_iterations: None }
    }
}

/// progress of the cutting-plane loop (passed to a 'SolveObserver')
#[derive(Debug)]
pub enum SolveEvent<'a> {
    Solved { iteration: usize, objective: f64, active_nodes: usize, active_edges: usize, fractional: usize },
    CutAdded { iteration: usize, kind: SeparationKind, excluded: NodeId, reduced_value: f64,
               constraint: &'a CuttingPlaneConstraint },
    Tightened { iteration: usize },
    Finished { result: &'a ConnectedSubgraph },
}

pub trait SolveObserver {
    fn notify(&mut self, event: &SolveEvent<'_>);
}

impl SolveObserver for () {
    fn notify(&mut self, _event: &SolveEvent<'_>) {}
}

impl<O: SolveObserver + ?Sized> SolveObserver for &mut O {
    fn notify(&mut self, event: &SolveEvent<'_>) {
        (**self).notify(event);
    }
}

impl<A: SolveObserver, B: SolveObserver> SolveObserver for (A, B) {
    fn notify(&mut self, event: &SolveEvent<'_>) {
        self.0.notify(event);
        self.1.notify(event);
    }
}

/// forwards all events to the 'log' facade
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl SolveObserver for LogObserver {
    fn notify(&mut self, event: &SolveEvent<'_>) {
        match event {
            SolveEvent::Solved { iteration, objective, active_nodes, active_edges, fractional } => {
                info!("iteration {}: objective {:.4}, {} active nodes, {} active edges ({} fractional values)",
                      iteration, objective, active_nodes, active_edges, fractional);
            }
            SolveEvent::CutAdded { iteration, kind, excluded, reduced_value, constraint } => {
                debug!("iteration {}: {:?} cut for k = {} (reduced value {:.6}, |E(S)| = {}, {} nodes on the rhs)",
                       iteration, kind, excluded, reduced_value, constraint.edges.len(), constraint.nodes.len());
            }
            SolveEvent::Tightened { iteration } => {
                info!("iteration {}: no violated cut, switching to binary variables", iteration);
            }
            SolveEvent::Finished { result } => {
                info!("finished after {} iterations: profit {}, cost {}, {} nodes, {} edges",
                      result.iterations, result.profit, result.cost, result.nodes.len(), result.edges.len());
            }
        }
    }
}

enum LoopState {
    Solving,
    Separating(Solution),
    Augmenting(SeparationCut, Solution),
    Tightening,
    Done(Solution),
}

/// solve -> separate -> (augment | tighten | done) on a prepared 'RelaxationModel'
pub struct CuttingPlaneLoop<'a, E: MipEngine = MicrolpEngine, O: SolveObserver = LogObserver> {
    model: RelaxationModel<'a, E>,
    observer: O,
    config: LoopConfig,
    iteration: usize,
    general_cuts: usize,
    non_terminal_cuts: usize,
    tightened: bool,
}

impl<'a, E: MipEngine, O: SolveObserver> CuttingPlaneLoop<'a, E, O> {
    /// 'model' has to contain the objective and the initial constraints already
    pub fn new(model: RelaxationModel<'a, E>, config: LoopConfig, observer: O) -> Self {
        CuttingPlaneLoop {
            model,
            observer,
            config,
            iteration: 0,
            general_cuts: 0,
            non_terminal_cuts: 0,
            tightened: false,
        }
    }

    pub fn into_parts(self) -> (RelaxationModel<'a, E>, O) {
        (self.model, self.observer)
    }

    pub fn run(&mut self) -> Result<ConnectedSubgraph, SolverError> {
        let eps = self.config.epsilon;
        let mut state = LoopState::Solving;
        loop {
            state = match state {
                LoopState::Solving => LoopState::Separating(self.solve_relaxation()?),
                LoopState::Separating(solution) => self.separate(solution)?,
                LoopState::Augmenting(cut, solution) => {
                    self.augment(&cut, &solution);
                    LoopState::Solving
                }
                LoopState::Tightening => {
                    self.model.tighten_to_integral();
                    self.tightened = true;
                    self.observer.notify(&SolveEvent::Tightened { iteration: self.iteration });
                    LoopState::Solving
                }
                LoopState::Done(solution) => {
                    let mut result = ConnectedSubgraph::from_solution(self.model.instance(), &solution, eps);
                    result.iterations = self.iteration;
                    result.general_cuts = self.general_cuts;
                    result.non_terminal_cuts = self.non_terminal_cuts;
                    result.tightened = self.tightened;
                    self.observer.notify(&SolveEvent::Finished { result: &result });
                    return Ok(result);
                }
            };
        }
    }

    fn solve_relaxation(&mut self) -> Result<Solution, SolverError> {
        if let Some(max) = self.config.max_iterations {
            if self.iteration >= max {
                return Err(SolverError::IterationLimit(max));
            }
        }
        self.iteration += 1;
        match self.model.solve() {
            SolveStatus::Optimal => {}
            status => return Err(SolverError::NotOptimal { iteration: self.iteration, status }),
        }
        let solution = self.model.current_solution();
        self.observer.notify(&SolveEvent::Solved {
            iteration: self.iteration,
            objective: solution.objective(),
            active_nodes: solution.positive_node_count(),
            active_edges: solution.positive_edge_count(),
            fractional: solution.fractional_count(self.config.epsilon),
        });
        Ok(solution)
    }

    /// Type I first, Type II only if Type I found nothing
    fn separate(&mut self, solution: Solution) -> Result<LoopState, SolverError> {
        let oracle = SeparationOracle::new(self.model.instance(), &solution)
            .with_tolerance(self.config.epsilon);
        let found = match oracle.find(SeparationKind::General)? {
            Some(cut) => Some(cut),
            None => oracle.find(SeparationKind::NonTerminal)?,
        };
        if let Some(cut) = found {
            return Ok(LoopState::Augmenting(cut, solution));
        }
        if solution.is_integral(self.config.epsilon) {
            return Ok(LoopState::Done(solution));
        }
        if self.model.is_integral() {
            return Err(SolverError::FractionalAfterTightening { iteration: self.iteration });
        }
        Ok(LoopState::Tightening)
    }

    fn augment(&mut self, cut: &SeparationCut, solution: &Solution) {
        let constraint = cut.to_constraint(self.model.instance());
        debug_assert!(constraint.slack(solution) < -self.config.epsilon);
        self.model.add_cutting_plane(&constraint);
        match cut.kind {
            SeparationKind::General => self.general_cuts += 1,
            SeparationKind::NonTerminal => self.non_terminal_cuts += 1,
        }
        self.observer.notify(&SolveEvent::CutAdded {
            iteration: self.iteration,
            kind: cut.kind,
            excluded: cut.excluded,
            reduced_value: cut.reduced_value,
            constraint: &constraint,
        });
    }
}

/// builds the standard model (cardinality, budget, profit objective) for 'instance'
pub fn build_model<E: MipEngine + Default>(instance: &Instance, integral: bool) -> RelaxationModel<'_, E> {
    let mut model = RelaxationModel::create(instance, integral);
    model.maximize_profit();
    model.add_cardinality_constraint();
    model.add_budget_constraint();
    model
}

/// solves 'instance' with microlp and logs the progress
pub fn solve(instance: &Instance, config: &LoopConfig) -> Result<ConnectedSubgraph, SolverError> {
    let model: RelaxationModel<MicrolpEngine> = build_model(instance, config.integral);
    CuttingPlaneLoop::new(model, *config, LogObserver).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Edge;

    // T = {1, 4}, N = {2, 3}, path 1-2-4 with 3 hanging at 4; the budget allows exactly one
    // non-terminal
    fn setup() -> Instance {
        Instance::builder()
            .terminal(1, 1.0, 1.0)
            .terminal(4, 1.0, 1.0)
            .non_terminal(2, 5.0, 4.0)
            .non_terminal(3, 3.0, 4.0)
            .edge(1, 2).edge(2, 4).edge(3, 4)
            .budget(6.0)
            .build()
            .unwrap()
    }

    // T = {1, 4}, N = {2, 3}, cycle 1-2-4-3-1; the first relaxation selects half of node 2
    fn setup_cycle() -> Instance {
        Instance::builder()
            .terminal(1, 1.0, 1.0)
            .terminal(4, 1.0, 1.0)
            .non_terminal(2, 5.0, 4.0)
            .non_terminal(3, 3.0, 2.0)
            .edge(1, 2).edge(2, 4).edge(1, 3).edge(3, 4)
            .budget(6.0)
            .build()
            .unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        solved: usize,
        active: Vec<(usize, usize)>,    // (active nodes, active edges) per solve
        cuts: Vec<SeparationKind>,
        tightened: usize,
        finished: usize,
    }

    impl SolveObserver for Recorder {
        fn notify(&mut self, event: &SolveEvent<'_>) {
            match event {
                SolveEvent::Solved { active_nodes, active_edges, .. } => {
                    self.solved += 1;
                    self.active.push((*active_nodes, *active_edges));
                }
                SolveEvent::CutAdded { kind, .. } => self.cuts.push(*kind),
                SolveEvent::Tightened { .. } => self.tightened += 1,
                SolveEvent::Finished { .. } => self.finished += 1,
            }
        }
    }

    fn check_optimum(instance: &Instance, result: &ConnectedSubgraph) {
        assert_eq!(result.nodes, vec![1, 2, 4]);
        assert_eq!(result.edges, vec![Edge::new(1, 2).unwrap(), Edge::new(2, 4).unwrap()]);
        assert_eq!(result.profit, 7.0);
        assert_eq!(result.cost, 6.0);
        assert!(instance.verify_selection(&result.nodes, &result.edges).is_ok());
    }

    #[test]
    fn test_cutting_plane_loop() {
        // y_2 = 1 in every relaxation; x_3_4 > 0 is cut off by x_3_4 <= y_3 (k = 4)
        let instance = setup();
        let result = solve(&instance, &LoopConfig::default()).unwrap();
        check_optimum(&instance, &result);
        assert!(result.general_cuts <= 1);
        assert_eq!(result.non_terminal_cuts, 0);
        assert!(!result.tightened);
        assert!(result.iterations <= 2);
    }

    #[test]
    fn test_cutting_plane_loop_with_tightening() {
        let instance = setup_cycle();
        let result = solve(&instance, &LoopConfig::default()).unwrap();
        check_optimum(&instance, &result);
        assert!(result.iterations >= 2);  // first relaxation is fractional
    }

    #[test]
    fn test_integral_start() {
        let instance = setup_cycle();
        let config = LoopConfig { integral: true, ..LoopConfig::default() };
        let result = solve(&instance, &config).unwrap();
        check_optimum(&instance, &result);
        assert!(!result.tightened);
    }

    #[test]
    fn test_observer_events() {
        let instance = setup_cycle();
        let model: RelaxationModel = build_model(&instance, false);
        let mut recorder = Recorder::default();
        let result = CuttingPlaneLoop::new(model, LoopConfig::default(), (&mut recorder, LogObserver))
            .run()
            .unwrap();
        assert_eq!(recorder.solved, result.iterations);
        assert_eq!(recorder.cuts.len(), result.general_cuts + result.non_terminal_cuts);
        assert_eq!(recorder.tightened, usize::from(result.tightened));
        assert_eq!(recorder.finished, 1);
        // every solve except the last one is followed by a cut or by tightening
        assert_eq!(recorder.solved, recorder.cuts.len() + recorder.tightened + 1);
        // first relaxation: y_2 = 0.5, y_3 = 1 and x(E) = 2.5 spread over at least 3 edges
        assert_eq!(recorder.active.len(), recorder.solved);
        assert_eq!(recorder.active[0].0, 2);
        assert!(recorder.active[0].1 >= 3);
    }

    #[test]
    fn test_iteration_limit() {
        let instance = setup_cycle();
        let config = LoopConfig { max_iterations: Some(1), ..LoopConfig::default() };
        assert!(matches!(solve(&instance, &config), Err(SolverError::IterationLimit(1))));
    }

    #[test]
    fn test_infeasible_budget() {
        // the terminals alone exceed the budget
        let instance = Instance::builder()
            .terminal(1, 1.0, 5.0)
            .terminal(2, 1.0, 5.0)
            .non_terminal(3, 1.0, 3.0)
            .edge(1, 3).edge(3, 2)
            .budget(4.0)
            .build()
            .unwrap();
        let err = solve(&instance, &LoopConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::NotOptimal { iteration: 1, status: SolveStatus::Infeasible }));
    }

    #[test]
    fn test_single_terminal() {
        let instance = Instance::builder()
            .terminal(1, 2.0, 1.0)
            .non_terminal(2, 5.0, 1.0)
            .edge(1, 2)
            .build()
            .unwrap();
        let result = solve(&instance, &LoopConfig::default()).unwrap();
        assert_eq!(result.nodes, vec![1, 2]);
        assert_eq!(result.edges, vec![Edge::new(1, 2).unwrap()]);
        assert_eq!(result.profit, 7.0);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_non_terminal_cycle() {
        // terminal 1 is isolated; the first relaxation selects the triangle 2-3-4, which only
        // the non-terminal inequality x(E({2,3,4})) <= y(S \ {k}) cuts off
        let instance = Instance::builder()
            .terminal(1, 2.0, 1.0)
            .non_terminal(2, 1.0, 1.0)
            .non_terminal(3, 1.0, 1.0)
            .non_terminal(4, 1.0, 1.0)
            .edge(2, 3).edge(3, 4).edge(2, 4)
            .build()
            .unwrap();
        let model: RelaxationModel = build_model(&instance, false);
        let mut recorder = Recorder::default();
        let result = CuttingPlaneLoop::new(model, LoopConfig::default(), &mut recorder).run().unwrap();
        assert_eq!(recorder.cuts.first(), Some(&SeparationKind::NonTerminal));
        assert_eq!(recorder.active[0], (3, 3));
        assert!(result.non_terminal_cuts >= 1);
        assert_eq!(result.nodes, vec![1]);
        assert!(result.edges.is_empty());
        assert_eq!(result.profit, 2.0);
        assert!(instance.verify_selection(&result.nodes, &result.edges).is_ok());
    }

    #[test]
    fn test_disconnected_terminals() {
        // no path between the terminals -> every relaxation is eventually cut off
        let instance = Instance::builder()
            .terminal(1, 1.0, 1.0)
            .terminal(2, 1.0, 1.0)
            .non_terminal(3, 1.0, 1.0)
            .non_terminal(4, 1.0, 1.0)
            .edge(1, 3).edge(2, 4)
            .build()
            .unwrap();
        let err = solve(&instance, &LoopConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::NotOptimal { status: SolveStatus::Infeasible, .. }));
    }
}
