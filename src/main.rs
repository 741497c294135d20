use clap::Parser;
use gossip_quorum::log_with_context;
use gossip_quorum::logger::{self, LogFormat};
use gossip_quorum::simulation::{print_report, AdversaryKind, Simulation, SimulationConfig};
use std::error::Error;

/// Run a gossip network of adaptive quorum nodes against adversarial peers.
///
/// Settings start from the defaults, then `.env` / `GQ_*` variables, then
/// these flags.
#[derive(Parser, Debug)]
#[command(name = "gossip-quorum")]
#[command(version)]
struct Cli {
    /// Total number of nodes
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Probability that one node follows another
    #[arg(long)]
    p_graph: Option<f64>,

    /// Fraction of adversarial nodes
    #[arg(long)]
    p_malicious: Option<f64>,

    /// Transaction distribution density (seed pool is p_tx * 1000)
    #[arg(long)]
    p_tx: Option<f64>,

    /// Number of rounds to run
    #[arg(short, long)]
    rounds: Option<usize>,

    /// Seed for the follow graph and transaction seeding
    #[arg(long)]
    graph_seed: Option<u64>,

    /// Base seed for adversary noise
    #[arg(long)]
    adversary_seed: Option<u64>,

    /// Adversary behavior
    #[arg(long, value_enum)]
    adversary: Option<AdversaryKind>,

    /// Process each round's inboxes on parallel tasks
    #[arg(long)]
    parallel: bool,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

impl Cli {
    fn apply(&self, mut config: SimulationConfig) -> SimulationConfig {
        if let Some(nodes) = self.nodes {
            config = config.with_nodes(nodes);
        }
        if let Some(p) = self.p_graph {
            config = config.with_graph_density(p);
        }
        if let Some(p) = self.p_malicious {
            config = config.with_malicious_fraction(p);
        }
        if let Some(p) = self.p_tx {
            config = config.with_tx_distribution(p);
        }
        if let Some(rounds) = self.rounds {
            config = config.with_rounds(rounds);
        }
        if let Some(seed) = self.graph_seed {
            config.graph_seed = seed;
        }
        if let Some(seed) = self.adversary_seed {
            config.adversary_seed = seed;
        }
        if let Some(kind) = self.adversary {
            config = config.with_adversary(kind);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logger::init(cli.log_format);

    // Validated once, by Simulation::new, after the flags are applied.
    let config = cli.apply(SimulationConfig::load_env()?);
    let mut simulation = Simulation::new(config)?;

    let config = simulation.config();
    log_with_context!(
        info,
        nodes = config.num_nodes,
        rounds = config.num_rounds,
        adversary = ?config.adversary,
        parallel = cli.parallel,
        "Starting simulation"
    );

    let report = if cli.parallel {
        simulation.run_parallel().await?
    } else {
        simulation.run()
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.passed() {
        println!("[PASS] Compliant nodes agreed on a non-empty, valid set.");
        Ok(())
    } else {
        println!("[FAIL] One or more agreement checks failed.");
        std::process::exit(1);
    }
}
