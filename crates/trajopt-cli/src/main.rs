//! `trajopt`: loads a declarative problem JSON file (§6), builds it against
//! the reference [`trajopt_kinematics::PlanarArm`] backend, runs the SQP
//! driver, and prints the resulting trajectory and per-cost/per-constraint
//! report.
//!
//! This binary exists to exercise the core end to end; a real deployment
//! swaps in its own [`trajopt_kinematics::RobotModel`] and
//! [`trajopt_kinematics::CollisionChecker`] implementations.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use trajopt_belief::{BeliefRobotModel, PlanarArmBelief};
use trajopt_kinematics::{CollisionChecker, NullCollisionChecker, PlanarArm, RobotModel, SphereObstacleChecker};
use trajopt_problem::{Problem, ProblemConstructionInfo};
use trajopt_sqp::{optimize, SqpParams};

/// Optimizes a joint-space or belief-space trajectory from a JSON problem
/// description.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a problem JSON file (§6's declarative format).
    problem: PathBuf,

    /// Places a spherical obstacle at `x,y,z` with `radius`, checked
    /// against the reference arm's end effector. Omit for an
    /// obstacle-free environment.
    #[arg(long, value_names = ["X", "Y", "Z", "RADIUS"], num_args = 4)]
    sphere_obstacle: Option<Vec<f64>>,

    /// Starting joint configuration, comma-separated (defaults to the
    /// zero configuration).
    #[arg(long, value_delimiter = ',')]
    start: Option<Vec<f64>>,

    /// Print the full per-timestep trajectory in addition to the summary
    /// report.
    #[arg(long)]
    print_trajectory: bool,

    #[command(flatten)]
    sqp: SqpArgs,
}

#[derive(Parser, Debug)]
struct SqpArgs {
    #[arg(long, default_value_t = SqpParams::default().max_iter)]
    max_iter: usize,
    #[arg(long, default_value_t = SqpParams::default().merit_error_coeff)]
    merit_error_coeff: f64,
    #[arg(long, default_value_t = SqpParams::default().trust_box_size)]
    trust_box_size: f64,
}

impl SqpArgs {
    fn into_params(self) -> SqpParams {
        SqpParams {
            max_iter: self.max_iter,
            merit_error_coeff: self.merit_error_coeff,
            trust_box_size: self.trust_box_size,
            ..SqpParams::default()
        }
    }
}

fn build_checker(cli: &Cli) -> Box<dyn CollisionChecker> {
    match &cli.sphere_obstacle {
        Some(v) => Box::new(SphereObstacleChecker::new([v[0], v[1], v[2]], v[3])),
        None => Box::new(NullCollisionChecker::default()),
    }
}

fn run_joint_only(cli: &Cli, pci: &ProblemConstructionInfo, checker: &dyn CollisionChecker) -> Result<()> {
    let mut arm = PlanarArm::new();
    if let Some(start) = &cli.start {
        arm.set_dof_values(start).context("invalid --start for a 3-dof reference arm")?;
    }

    let mut problem = Problem::build(pci, &arm, checker).context("failed to build problem")?;
    let params = cli.sqp_args_clone();
    let (x, report) = optimize(&mut problem, &params).context("SQP optimization failed")?;

    print_report(&report);
    if cli.print_trajectory {
        print_trajectory(&problem.trajectory(&x));
    }
    Ok(())
}

fn run_belief_space(cli: &Cli, pci: &ProblemConstructionInfo, checker: &dyn CollisionChecker) -> Result<()> {
    let mut arm = PlanarArmBelief::new();
    if let Some(start) = &cli.start {
        arm.set_dof_values(start).context("invalid --start for a 3-dof reference arm")?;
    }

    let mut problem = Problem::build_belief(pci, &arm, checker).context("failed to build belief-space problem")?;
    let params = cli.sqp_args_clone();
    let (x, report) = optimize(&mut problem, &params).context("SQP optimization failed")?;

    print_report(&report);
    if cli.print_trajectory {
        print_trajectory(&problem.trajectory(&x));
    }
    Ok(())
}

impl Cli {
    /// `clap`'s derive consumes `self.sqp` when flattened, but both solve
    /// paths need their own copy — `SqpArgs` is small and `Copy`-free, so
    /// this just clones the handful of fields rather than restructuring
    /// the CLI around a reference.
    fn sqp_args_clone(&self) -> SqpParams {
        SqpArgs {
            max_iter: self.sqp.max_iter,
            merit_error_coeff: self.sqp.merit_error_coeff,
            trust_box_size: self.sqp.trust_box_size,
        }
        .into_params()
    }
}

fn print_report(report: &trajopt_sqp::OptimizationReport) {
    println!("status: {:?}", report.status);
    println!("iterations: {}", report.iterations);
    println!("merit coefficient increases: {}", report.merit_coeff_increases);
    println!("final merit coefficient: {:.6}", report.final_merit_coeff);
    println!("final trust box size: {:.6}", report.final_trust_box_size);
    println!("costs:");
    for (name, value) in &report.cost_values {
        println!("  {name}: {value:.6}");
    }
    println!("constraint violations:");
    for (name, value) in &report.constraint_violations {
        println!("  {name}: {value:.6}");
    }
}

fn print_trajectory(traj: &[Vec<f64>]) {
    println!("trajectory:");
    for (t, row) in traj.iter().enumerate() {
        let formatted: Vec<String> = row.iter().map(|v| format!("{v:.4}")).collect();
        println!("  t={t}: [{}]", formatted.join(", "));
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let text = fs::read_to_string(&cli.problem).with_context(|| format!("reading problem file {}", cli.problem.display()))?;
    let pci: ProblemConstructionInfo = serde_json::from_str(&text).context("parsing problem JSON")?;
    let checker = build_checker(&cli);

    if pci.basic_info.belief_space {
        run_belief_space(&cli, &pci, checker.as_ref())
    } else {
        run_joint_only(&cli, &pci, checker.as_ref())
    }
}
