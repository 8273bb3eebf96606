use islandflow::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), PowerFlowError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // the five-bus network plus a detached feeder without a slack bus
    let mut net = islandflow::testcases::five_bus()?;
    net.add_bus(Bus::new(10, "feeder a", 10.0))?;
    net.add_bus(Bus::new(11, "feeder b", 10.0))?;
    net.add_branch(Branch::line("10-11", 10, 11, 0.02, 0.05))?;
    net.add_injection(Injection::static_generator("pv 10", 10, 5.0, 0.0))?;
    net.add_injection(Injection::load("load 11", 11, 5.0, 1.0))?;

    let config = PowerFlowConfig::from_json_str(r#"{ "tolerance": 1e-8, "max_iter": 20 }"#)?;
    let outcome = PowerFlowDriver::new(config).run(&net)?;
    let results = &outcome.results;

    println!("{}\n", results.convergence_table());
    println!("{}\n", results.bus_table());
    println!("{}\n", results.branch_table());

    let loading = results.series(ResultKind::BranchLoading);
    if let Some(values) = loading.values.as_real() {
        for (name, value) in loading.labels.iter().zip(values) {
            println!("{name:>12}: {value:6.2} {}", loading.unit);
        }
    }

    println!(
        "\nconverged: {}  worst error: {:e}  penalty: {:.4}  storage candidates: {:?}",
        results.converged(),
        results.error(),
        outcome.violations.penalty,
        outcome.violations.useful_for_storage
    );
    Ok(())
}
