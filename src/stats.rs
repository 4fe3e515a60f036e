use std::{fs::File, io, io::Write, path::Path, time::Instant};
use crate::cutting_plane::{SolveEvent, SolveObserver};
use crate::instance::Instance;
use crate::separation::SeparationKind;

/// collects the statistics of one solver run (see write_stats)
#[derive(Clone, Debug)]
pub struct SolverStats {
    file_name: String,              // name of the instance file
    start: Instant,                 // set on creation, runtime is taken on 'Finished'
    runtime: f32,                   // seconds until the loop finished
    nodes: usize,                   // |V|
    terminals: usize,               // |T|
    edges: usize,                   // |E|
    iterations: usize,              // no. of relaxation solves
    active_nodes: usize,            // non-terminals with positive value in the last relaxation
    active_edges: usize,            // edges with positive value in the last relaxation
    general_cuts: usize,            // no. of Type I cuts
    non_terminal_cuts: usize,       // no. of Type II cuts
    tightened: bool,                // switched to binary variables
    objective: Option<f64>,         // objective of the last relaxation
    profit: Option<f64>,            // total profit of the solution (None -> unsolved)
}

impl SolverStats {
    pub fn new(file_name: &str, instance: &Instance) -> Self {
        SolverStats {
            file_name: file_name.to_owned(),
            start: Instant::now(),
            runtime: 0.0,
            nodes: instance.node_count(),
            terminals: instance.terminals().len(),
            edges: instance.edge_count(),
            iterations: 0,
            active_nodes: 0,
            active_edges: 0,
            general_cuts: 0,
            non_terminal_cuts: 0,
            tightened: false,
            objective: None,
            profit: None,
        }
    }

    fn row(&self) -> String {
        let value = |v: Option<f64>| match v {
            Some(v) => v.to_string(),
            None => String::from("unsolved"),
        };
        format!("{}\t{:.2}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                self.file_name,
                self.runtime,
                self.nodes,
                self.terminals,
                self.edges,
                self.iterations,
                self.active_nodes,
                self.active_edges,
                self.general_cuts,
                self.non_terminal_cuts,
                self.tightened,
                value(self.objective),
                value(self.profit))
    }

    /// appends one row to 'path' (the header is written when the file is created)
    pub fn write_stats(&self, path: impl AsRef<Path>) -> Result<(), io::Error> {
        let path = path.as_ref();
        let mut file: File;
        if let Ok(f) = File::options().append(true).open(path) {
            // stats file already exists -> append data
            file = f;
        } else {
            file = File::create(path)?;
            file.write_all(b"File\tTime (s)\tNodes\tTerminals\tEdges\tIterations\tActive nodes\tActive edges\tType I cuts\tType II cuts\tTightened\tObjective\tProfit\n")?;
        }
        file.write_all(self.row().as_bytes())?;
        Ok(())
    }
}

impl SolveObserver for SolverStats {
    fn notify(&mut self, event: &SolveEvent<'_>) {
        match event {
            SolveEvent::Solved { iteration, objective, active_nodes, active_edges, .. } => {
                self.iterations = *iteration;
                self.active_nodes = *active_nodes;
                self.active_edges = *active_edges;
                self.objective = Some(*objective);
            }
            SolveEvent::CutAdded { kind: SeparationKind::General, .. } => self.general_cuts += 1,
            SolveEvent::CutAdded { kind: SeparationKind::NonTerminal, .. } => self.non_terminal_cuts += 1,
            SolveEvent::Tightened { .. } => self.tightened = true,
            SolveEvent::Finished { result } => {
                self.runtime = self.start.elapsed().as_secs_f32();
                self.profit = Some(result.profit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs, process};
    use crate::cutting_plane::{build_model, CuttingPlaneLoop, LoopConfig};
    use crate::relaxation::RelaxationModel;

    fn setup() -> Instance {
        Instance::builder()
            .terminal(0, 1.0, 1.0)
            .terminal(2, 1.0, 1.0)
            .non_terminal(1, 4.0, 1.0)
            .edge(0, 1).edge(1, 2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_stats_observer() {
        let instance = setup();
        let model: RelaxationModel = build_model(&instance, false);
        let mut stats = SolverStats::new("path.txt", &instance);
        let result = CuttingPlaneLoop::new(model, LoopConfig::default(), &mut stats).run().unwrap();
        assert_eq!(stats.iterations, result.iterations);
        assert_eq!((stats.general_cuts, stats.non_terminal_cuts), (result.general_cuts, result.non_terminal_cuts));
        assert_eq!(stats.profit, Some(6.0));
        assert_eq!((stats.active_nodes, stats.active_edges), (1, 2));  // path 0-1-2
        let row = stats.row();
        assert!(row.starts_with("path.txt\t"));
        assert!(row.ends_with("\t6\n"));
        assert_eq!(row.split('\t').count(), 13);
    }

    #[test]
    fn test_write_stats() {
        let instance = setup();
        let stats = SolverStats::new("path.txt", &instance);
        let path = env::temp_dir().join(format!("conn_subgraph_stats_{}.tsv", process::id()));
        let _ = fs::remove_file(&path);
        stats.write_stats(&path).unwrap();
        stats.write_stats(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);  // header + 2 rows
        assert!(lines[0].starts_with("File\t"));
        assert!(lines[1].ends_with("unsolved\tunsolved"));
        let _ = fs::remove_file(&path);
    }
}
