use std::{path::PathBuf, process};
use clap::Parser;
use conn_subgraph::{instance_parser, cutting_plane};
use conn_subgraph::cutting_plane::{CuttingPlaneLoop, LogObserver, LoopConfig};
use conn_subgraph::instance::{Instance, NodeKind};
use conn_subgraph::microlp_engine::MicrolpEngine;
use conn_subgraph::relaxation::RelaxationModel;
use conn_subgraph::separation::EPSILON;
use conn_subgraph::solution::ConnectedSubgraph;
use conn_subgraph::stats::SolverStats;

/// The connected subgraph problem.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Specifies the input file
    #[arg(short, long)]
    file: PathBuf,

    /// Indicates that the input file ends with a budget value
    #[arg(short, long)]
    budget: bool,

    /// Appends the statistics of the run to this (tab-separated) file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Starts with binary instead of continuous variables
    #[arg(long)]
    integral: bool,

    /// Maximum number of relaxation solves
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Tolerance of the violation and fractionality tests
    #[arg(long, default_value_t = EPSILON)]
    epsilon: f64,

    /// Writes the final model in LP format to this file
    #[arg(long)]
    lp_file: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let instance = instance_parser::read_instance_from_file(&args.file, args.budget).unwrap_or_else(|err| {
        println!("Problem reading file {}: {err}", args.file.display());
        process::exit(1);
    });
    let config = LoopConfig { epsilon: args.epsilon, integral: args.integral, max_iterations: args.max_iterations };

    let model: RelaxationModel<MicrolpEngine> = cutting_plane::build_model(&instance, config.integral);
    let stats = SolverStats::new(&args.file.to_string_lossy(), &instance);
    let mut solver = CuttingPlaneLoop::new(model, config, (LogObserver, stats));
    let result = solver.run();
    let (model, (_, stats)) = solver.into_parts();

    if let Some(lp_file) = &args.lp_file {
        model.engine().write_lp(lp_file).unwrap_or_else(|err| {
            println!("Problem writing model to {}: {err}", lp_file.display());
        });
    }
    if let Some(out_file) = &args.output {
        match stats.write_stats(out_file) {
            Ok(()) => println!("Statistics written to {:?}", out_file),
            Err(err) => println!("Problem writing statistics to file: {err}"),
        }
    }

    match result {
        Ok(subgraph) => print_solution(&instance, &subgraph),
        Err(err) => {
            println!("Problem solving {}: {err}", args.file.display());
            process::exit(1);
        }
    }
}

/// prints the connected subgraph and makes sure that it is a feasible solution
fn print_solution(instance: &Instance, subgraph: &ConnectedSubgraph) {
    println!("SOLUTION:\nprofit = {} (terminals: {})\ncost = {} (terminals: {})",
             subgraph.profit, instance.terminal_profit(), subgraph.cost, instance.terminal_cost());
    match instance.budget() {
        Some(budget) => println!("budget = {budget}"),
        None => println!("budget = none"),
    }
    println!("iterations = {} (Type I cuts: {}, Type II cuts: {}, tightened: {})",
             subgraph.iterations, subgraph.general_cuts, subgraph.non_terminal_cuts, subgraph.tightened);
    println!("Nodes:");
    for v in &subgraph.nodes {
        match instance.kind(*v) {
            Some(NodeKind::Terminal) => println!("{v} (T)"),
            Some(NodeKind::NonTerminal) => println!("{v} (N)"),
            None => println!("{v} (?)"),
        }
    }
    println!("Edges:");
    for e in &subgraph.edges {
        println!("{e}");
    }

    if let Err(defect) = instance.verify_selection(&subgraph.nodes, &subgraph.edges) {
        println!("Solution is not a feasible connected subgraph: {defect}");
        process::exit(1);
    }
}
