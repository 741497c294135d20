//! Cluster agreement scoring for a finished simulation

use crate::consensus::Transaction;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub finished_at: DateTime<Utc>,
    pub rounds: usize,
    pub compliant_nodes: usize,
    pub largest_cluster: usize,
    pub agreed: BTreeSet<u64>,
    pub majority_agree: bool,
    pub non_empty: bool,
    pub all_valid: bool,
}

impl SimulationReport {
    pub fn passed(&self) -> bool {
        self.majority_agree && self.non_empty && self.all_valid
    }
}

/// Score the final sets of compliant nodes only.
///
/// Identical sets form a cluster. The agreed set is the largest cluster's
/// set; ties go to the lexicographically smallest set so the report is
/// deterministic.
pub fn evaluate(
    final_sets: &[HashSet<Transaction>],
    malicious: &[bool],
    valid: &HashSet<Transaction>,
    agreement_ratio: f64,
    rounds: usize,
) -> SimulationReport {
    let mut clusters: HashMap<BTreeSet<u64>, usize> = HashMap::new();
    let mut compliant_nodes = 0;

    for (index, set) in final_sets.iter().enumerate() {
        if malicious.get(index).copied().unwrap_or(false) {
            continue;
        }
        compliant_nodes += 1;
        let key: BTreeSet<u64> = set.iter().map(|tx| tx.id()).collect();
        *clusters.entry(key).or_insert(0) += 1;
    }

    let (agreed, largest_cluster) = clusters
        .into_iter()
        .max_by(|(a_set, a_count), (b_set, b_count)| {
            a_count.cmp(b_count).then_with(|| b_set.cmp(a_set))
        })
        .unwrap_or_default();

    let required = (agreement_ratio * compliant_nodes as f64).ceil() as usize;
    let valid_ids: HashSet<u64> = valid.iter().map(|tx| tx.id()).collect();

    SimulationReport {
        finished_at: Utc::now(),
        rounds,
        compliant_nodes,
        largest_cluster,
        majority_agree: largest_cluster >= required,
        non_empty: !agreed.is_empty(),
        all_valid: agreed.iter().all(|id| valid_ids.contains(id)),
        agreed,
    }
}

/// Print the report in a formatted table
pub fn print_report(report: &SimulationReport) {
    println!("\n{}", "=".repeat(80));
    println!("  Gossip Quorum Simulation Results");
    println!("{}", "=".repeat(80));
    println!();
    println!("{:<30} | {}", "Rounds", report.rounds);
    println!("{:<30} | {}", "Compliant nodes", report.compliant_nodes);
    println!(
        "{:<30} | {} / {}",
        "Largest agreeing cluster", report.largest_cluster, report.compliant_nodes
    );
    println!("{:<30} | {}", "Agreed tx count", report.agreed.len());
    println!("{}", "-".repeat(80));
    println!(
        "{:<30} | {}",
        "Majority agree",
        if report.majority_agree { "Yes" } else { "No" }
    );
    println!(
        "{:<30} | {}",
        "Non-empty",
        if report.non_empty { "Yes" } else { "No" }
    );
    println!(
        "{:<30} | {}",
        "All valid",
        if report.all_valid { "Yes" } else { "No" }
    );
    println!("{}", "=".repeat(80));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u64]) -> HashSet<Transaction> {
        ids.iter().map(|id| Transaction(*id)).collect()
    }

    #[test]
    fn test_agreement_ignores_malicious_nodes() {
        let finals = vec![set(&[999]), set(&[1, 2]), set(&[1, 2]), set(&[1, 2]), set(&[2])];
        let malicious = vec![true, false, false, false, false];
        let report = evaluate(&finals, &malicious, &set(&[1, 2, 3]), 0.75, 15);

        assert_eq!(report.compliant_nodes, 4);
        assert_eq!(report.largest_cluster, 3);
        assert_eq!(report.agreed, BTreeSet::from([1, 2]));
        assert!(report.majority_agree);
        assert!(report.passed());
    }

    #[test]
    fn test_invalid_agreed_set_fails() {
        let finals = vec![set(&[1, 1_000_123]), set(&[1, 1_000_123])];
        let report = evaluate(&finals, &[false, false], &set(&[1]), 0.75, 3);
        assert!(report.majority_agree);
        assert!(!report.all_valid);
        assert!(!report.passed());
    }

    #[test]
    fn test_empty_agreement_fails() {
        let finals = vec![set(&[]), set(&[]), set(&[4])];
        let report = evaluate(&finals, &[false, false, false], &set(&[4]), 0.5, 3);
        assert_eq!(report.largest_cluster, 2);
        assert!(!report.non_empty);
        assert!(!report.passed());
    }

    #[test]
    fn test_no_compliant_nodes() {
        let report = evaluate(&[set(&[1])], &[true], &set(&[1]), 0.75, 1);
        assert_eq!(report.compliant_nodes, 0);
        assert!(!report.non_empty);
    }

    #[test]
    fn test_report_serializes() {
        let report = evaluate(&[set(&[2, 1])], &[false], &set(&[1, 2]), 1.0, 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["agreed"], serde_json::json!([1, 2]));
        assert_eq!(json["largest_cluster"], 1);
    }
}
