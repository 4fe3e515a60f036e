/// index of a variable in a 'MipEngine' (numbered 0.. in the order of creation)
pub type VarId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarDomain {
	Continuous,
	Binary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
	Le,
	Ge,
	Eq,
}

/// terminal status of a solve
#[derive(Clone, Debug, PartialEq)]
pub enum SolveStatus {
	Optimal,
	Infeasible,
	Unbounded,
	Failed(String),
}

/// LP/MIP engine used by the relaxation model
/// (all variables are "selection fractions", i.e. bounded by [0,1])
pub trait MipEngine {
	/// adds a variable with bounds [0,1] and returns its id
	fn add_variable(&mut self, name: &str, domain: VarDomain) -> VarId;
	/// adds the linear constraint 'terms' 'cmp' 'rhs'
	/// (every variable may occur at most once in 'terms')
	fn add_constraint(&mut self, name: &str, terms: &[(VarId, f64)], cmp: Comparison, rhs: f64);
	/// replaces the objective by "maximize sum of 'terms'"
	fn maximize(&mut self, terms: &[(VarId, f64)]);
	/// changes the domain of 'var' (constraints are kept)
	fn set_domain(&mut self, var: VarId, domain: VarDomain);
	/// returns the domain of 'var'
	fn domain(&self, var: VarId) -> VarDomain;
	/// solves the current model
	fn solve(&mut self) -> SolveStatus;
	/// returns the value of 'var' in the last optimal solution (0.0 before the first one)
	fn value(&self, var: VarId) -> f64;
	/// returns the objective value of the last optimal solution
	fn objective_value(&self) -> f64;
	/// returns the number of variables
	fn variable_count(&self) -> usize;
	/// returns the number of constraints
	fn constraint_count(&self) -> usize;
}
