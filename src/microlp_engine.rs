use std::{fs, io, path::Path};
use log::trace;
use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};
use crate::mip_trait::{Comparison, MipEngine, SolveStatus, VarDomain, VarId};

#[derive(Clone, Debug)]
struct VariableSpec {
    name: String,
    domain: VarDomain,
    obj_coeff: f64,
}

#[derive(Clone, Debug)]
struct ConstraintSpec {
    name: String,
    terms: Vec<(VarId, f64)>,
    cmp: Comparison,
    rhs: f64,
}

/// 'MipEngine' backed by microlp
/// keeps the model declaratively and rebuilds the microlp problem on every solve, which allows
/// to change variable domains without losing any constraints
#[derive(Clone, Debug, Default)]
pub struct MicrolpEngine {
    variables: Vec<VariableSpec>,
    constraints: Vec<ConstraintSpec>,
    values: Vec<f64>,           // variable values of the last optimal solve
    objective_value: f64,
}

impl MicrolpEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// builds the microlp problem that corresponds to the current model
    fn build_problem(&self) -> (Problem, Vec<Variable>) {
        let mut problem = Problem::new(OptimizationDirection::Maximize);
        let vars: Vec<Variable> = self.variables.iter()
            .map(|spec| match spec.domain {
                VarDomain::Continuous => problem.add_var(spec.obj_coeff, (0.0, 1.0)),
                VarDomain::Binary => problem.add_binary_var(spec.obj_coeff),
            })
            .collect();
        for c in self.constraints.iter().filter(|c| !c.terms.is_empty()) {
            let op = match c.cmp {
                Comparison::Le => ComparisonOp::Le,
                Comparison::Ge => ComparisonOp::Ge,
                Comparison::Eq => ComparisonOp::Eq,
            };
            problem.add_constraint(c.terms.iter().map(|&(var, coeff)| (vars[var], coeff)), op, c.rhs);
        }
        (problem, vars)
    }

    /// rows without terms are not passed to microlp; they only have to hold as constants
    fn constant_rows_hold(&self) -> bool {
        self.constraints.iter().filter(|c| c.terms.is_empty()).all(|c| match c.cmp {
            Comparison::Le => 0.0 <= c.rhs + 1e-9,
            Comparison::Ge => 0.0 >= c.rhs - 1e-9,
            Comparison::Eq => c.rhs.abs() <= 1e-9,
        })
    }

    /// without constraints every variable sits at the bound its objective coefficient prefers
    fn solve_unconstrained(&mut self) -> SolveStatus {
        self.values = self.variables.iter()
            .map(|spec| if spec.obj_coeff > 0.0 { 1.0 } else { 0.0 })
            .collect();
        self.objective_value = self.variables.iter().map(|spec| spec.obj_coeff.max(0.0)).sum();
        SolveStatus::Optimal
    }

    /// writes the model in (CPLEX) LP format to 'path'
    pub fn write_lp(&self, path: impl AsRef<Path>) -> Result<(), io::Error> {
        fs::write(path, self.to_lp_string())
    }

    pub fn to_lp_string(&self) -> String {
        fn terms_to_string(terms: impl Iterator<Item = (String, f64)>) -> String {
            let mut out = String::new();
            for (name, coeff) in terms {
                if out.is_empty() {
                    out.push_str(&format!(" {} {}", coeff, name));
                } else if coeff < 0.0 {
                    out.push_str(&format!(" - {} {}", -coeff, name));
                } else {
                    out.push_str(&format!(" + {} {}", coeff, name));
                }
            }
            if out.is_empty() {
                out.push_str(" 0");
            }
            out
        }

        let mut out = String::from("Maximize\n obj:");
        out.push_str(&terms_to_string(self.variables.iter()
            .filter(|spec| spec.obj_coeff != 0.0)
            .map(|spec| (spec.name.clone(), spec.obj_coeff))));
        out.push_str("\nSubject To\n");
        for c in &self.constraints {
            let op = match c.cmp {
                Comparison::Le => "<=",
                Comparison::Ge => ">=",
                Comparison::Eq => "=",
            };
            let lhs = terms_to_string(c.terms.iter().map(|&(var, coeff)| (self.variables[var].name.clone(), coeff)));
            out.push_str(&format!(" {}:{} {} {}\n", c.name, lhs, op, c.rhs));
        }
        out.push_str("Bounds\n");
        for spec in self.variables.iter().filter(|spec| spec.domain == VarDomain::Continuous) {
            out.push_str(&format!(" 0 <= {} <= 1\n", spec.name));
        }
        let binaries: Vec<&str> = self.variables.iter()
            .filter(|spec| spec.domain == VarDomain::Binary)
            .map(|spec| spec.name.as_str())
            .collect();
        if !binaries.is_empty() {
            out.push_str("Binaries\n");
            for name in binaries {
                out.push_str(&format!(" {}\n", name));
            }
        }
        out.push_str("End\n");
        out
    }
}

impl MipEngine for MicrolpEngine {
    fn add_variable(&mut self, name: &str, domain: VarDomain) -> VarId {
        self.variables.push(VariableSpec { name: name.to_owned(), domain, obj_coeff: 0.0 });
        self.variables.len() - 1
    }

    fn add_constraint(&mut self, name: &str, terms: &[(VarId, f64)], cmp: Comparison, rhs: f64) {
        debug_assert!(terms.iter().all(|&(var, _)| var < self.variables.len()));
        self.constraints.push(ConstraintSpec { name: name.to_owned(), terms: terms.to_vec(), cmp, rhs });
    }

    fn maximize(&mut self, terms: &[(VarId, f64)]) {
        for spec in self.variables.iter_mut() {
            spec.obj_coeff = 0.0;
        }
        for &(var, coeff) in terms {
            self.variables[var].obj_coeff += coeff;
        }
    }

    fn set_domain(&mut self, var: VarId, domain: VarDomain) {
        self.variables[var].domain = domain;
    }

    fn domain(&self, var: VarId) -> VarDomain {
        self.variables[var].domain
    }

    fn solve(&mut self) -> SolveStatus {
        if !self.constant_rows_hold() {
            return SolveStatus::Infeasible;
        }
        if self.constraints.iter().all(|c| c.terms.is_empty()) {
            return self.solve_unconstrained();
        }
        let (problem, vars) = self.build_problem();
        trace!("solving {:?}", problem);
        match problem.solve() {
            Ok(solution) => {
                self.values = vars.iter().map(|&v| solution[v]).collect();
                self.objective_value = solution.objective();
                SolveStatus::Optimal
            }
            Err(microlp::Error::Infeasible) => SolveStatus::Infeasible,
            Err(microlp::Error::Unbounded) => SolveStatus::Unbounded,
            Err(microlp::Error::InternalError(msg)) => SolveStatus::Failed(msg),
        }
    }

    fn value(&self, var: VarId) -> f64 {
        self.values.get(var).copied().unwrap_or_default()
    }

    fn objective_value(&self) -> f64 {
        self.objective_value
    }

    fn variable_count(&self) -> usize {
        self.variables.len()
    }

    fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_continuous_and_binary() {
        // maximize x + y s.t. x + y <= 1.5
        let mut engine = MicrolpEngine::new();
        let x = engine.add_variable("x", VarDomain::Continuous);
        let y = engine.add_variable("y", VarDomain::Continuous);
        engine.add_constraint("c0", &[(x, 1.0), (y, 1.0)], Comparison::Le, 1.5);
        engine.maximize(&[(x, 1.0), (y, 1.0)]);
        assert_eq!(engine.solve(), SolveStatus::Optimal);
        assert!(approx(engine.objective_value(), 1.5));

        // binary domains keep the constraint -> optimum drops to 1
        engine.set_domain(x, VarDomain::Binary);
        engine.set_domain(y, VarDomain::Binary);
        assert_eq!(engine.domain(x), VarDomain::Binary);
        assert_eq!(engine.solve(), SolveStatus::Optimal);
        assert!(approx(engine.objective_value(), 1.0));
        assert!(approx(engine.value(x) + engine.value(y), 1.0));
        assert_eq!(engine.constraint_count(), 1);
        assert_eq!(engine.variable_count(), 2);
    }

    #[test]
    fn test_infeasible() {
        let mut engine = MicrolpEngine::new();
        let x = engine.add_variable("x", VarDomain::Continuous);
        engine.add_constraint("c0", &[(x, 1.0)], Comparison::Ge, 2.0);
        engine.maximize(&[(x, 1.0)]);
        assert_eq!(engine.solve(), SolveStatus::Infeasible);
    }

    #[test]
    fn test_constant_model() {
        let mut engine = MicrolpEngine::new();
        engine.add_constraint("card", &[], Comparison::Eq, 0.0);
        assert_eq!(engine.solve(), SolveStatus::Optimal);
        engine.add_constraint("budget", &[], Comparison::Le, -1.0);
        assert_eq!(engine.solve(), SolveStatus::Infeasible);
    }

    #[test]
    fn test_lp_format() {
        let mut engine = MicrolpEngine::new();
        let x = engine.add_variable("x_1_2", VarDomain::Continuous);
        let y = engine.add_variable("y_2", VarDomain::Binary);
        engine.add_constraint("card", &[(x, 1.0), (y, -1.0)], Comparison::Eq, 0.0);
        engine.add_constraint("empty", &[], Comparison::Le, 1.0);
        engine.maximize(&[(y, 3.0)]);
        let lp = engine.to_lp_string();
        assert!(lp.contains(" empty: 0 <= 1\n"));
        assert!(lp.starts_with("Maximize\n obj: 3 y_2\n"));
        assert!(lp.contains(" card: 1 x_1_2 - 1 y_2 = 0\n"));
        assert!(lp.contains("Bounds\n 0 <= x_1_2 <= 1\n"));
        assert!(lp.contains("Binaries\n y_2\n"));
        assert!(lp.ends_with("End\n"));
    }
}
