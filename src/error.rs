use std::io;
use thiserror::Error;
use crate::instance::NodeId;
use crate::mip_trait::SolveStatus;

/// errors raised while reading or validating an instance
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("failed to read instance file: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: expected '{expected}' as first character; found '{found}'")]
    UnexpectedPrefix { line: usize, expected: char, found: String },
    #[error("line {line}: could not parse '{token}' as a number")]
    InvalidNumber { line: usize, token: String },
    #[error("line {line}: missing value for {field}")]
    MissingField { line: usize, field: &'static str },
    #[error("node {node}: expected {expected} neighbours; found {found}")]
    NeighbourCount { node: NodeId, expected: usize, found: usize },
    #[error("expected {expected} nodes; found {found}")]
    NodeCount { expected: usize, found: usize },
    #[error("expected {expected} terminals; found {found}")]
    TerminalCount { expected: usize, found: usize },
    #[error("the instance file is empty")]
    Empty,
    #[error("expected a budget line at the end of the instance")]
    MissingBudget,
    #[error("node {0} is defined more than once")]
    DuplicateNode(NodeId),
    #[error("self-loop at node {0}")]
    SelfLoop(NodeId),
    #[error("edge ({u}, {v}) refers to unknown node {unknown}")]
    UnknownEndpoint { u: NodeId, v: NodeId, unknown: NodeId },
    #[error("node {node}: {field} must be finite and non-negative, got {value}")]
    InvalidWeight { node: NodeId, field: &'static str, value: f64 },
    #[error("budget must be finite, got {0}")]
    InvalidBudget(f64),
    #[error("the instance has no terminals")]
    NoTerminals,
}

/// fatal errors of the cutting-plane loop (all deterministic, never retried)
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("relaxation solve in iteration {iteration} was not optimal: {status:?}")]
    NotOptimal { iteration: usize, status: SolveStatus },
    #[error("flow network construction is inconsistent: {arcs} arcs but {weights} weights")]
    FlowConstruction { arcs: usize, weights: usize },
    #[error("solution of the binary model is still fractional in iteration {iteration}")]
    FractionalAfterTightening { iteration: usize },
    #[error("iteration limit of {0} reached")]
    IterationLimit(usize),
}
