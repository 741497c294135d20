//! Adversary Sweep
//!
//! Runs the reference scenario against every adversary model and a range of
//! malicious fractions, and prints one row per run.

use gossip_quorum::simulation::{AdversaryKind, Simulation, SimulationConfig};

fn main() {
    println!("\n{}", "=".repeat(90));
    println!("  Adaptive Quorum vs. Adversary Models");
    println!("{}", "=".repeat(90));
    println!();
    println!(
        "{:<14} | {:<10} | {:<10} | {:<12} | {:<8} | {:<8} | {}",
        "Adversary", "Malicious", "Compliant", "Cluster", "Agreed", "Valid", "Result"
    );
    println!("{}", "-".repeat(90));

    let kinds = [
        AdversaryKind::Silent,
        AdversaryKind::Flooding,
        AdversaryKind::Alternating,
    ];
    let fractions = [0.1, 0.2, 0.3, 0.45];

    for kind in kinds {
        for p_malicious in fractions {
            let config = SimulationConfig::default()
                .with_adversary(kind)
                .with_malicious_fraction(p_malicious);

            let mut simulation = match Simulation::new(config) {
                Ok(simulation) => simulation,
                Err(e) => {
                    println!(
                        "{:<14} | {:<10.2} | config error: {}",
                        format!("{:?}", kind),
                        p_malicious,
                        e
                    );
                    continue;
                }
            };
            let report = simulation.run();

            println!(
                "{:<14} | {:<10.2} | {:<10} | {:<12} | {:<8} | {:<8} | {}",
                format!("{:?}", kind),
                p_malicious,
                report.compliant_nodes,
                format!("{}/{}", report.largest_cluster, report.compliant_nodes),
                report.agreed.len(),
                if report.all_valid { "Yes" } else { "No" },
                if report.passed() { "PASS" } else { "FAIL" }
            );
        }
    }

    println!("{}", "=".repeat(90));
    println!();
}
