// Tiramisu: Reachability Verification of Multi-Protocol Networks
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use tiramisu::cases::check_all;
use tiramisu::example_networks::{by_name, NAMES};
use tiramisu::layer2::L2Domains;
use tiramisu::netmodel::{printer, NetworkConfig, NetworkModel, Subnet};
use tiramisu::rag::ReachabilityTaintGraph;
use tiramisu::tpg::{FailureSet, FidelityVariant, TopologyPathGraph};

use clap::{ArgEnum, Args, Parser, Subcommand};
use log::*;
use std::error::Error as StdError;
use thiserror::Error;

fn main() -> Result<(), Box<dyn StdError>> {
    // initialize the env logger
    pretty_env_logger::init();
    // run clap
    let args = CommandLineArguments::parse();
    let cfg = args.network.load()?;
    let net = NetworkModel::from_config(&cfg)?;
    let l2 = L2Domains::new(&net);
    info!("Network has {} routers", net.routers().count());

    match args.cmd {
        MainCommand::Model => {
            println!("{}", printer::network(&net).join("\n"));
            println!("\nL2 domains:\n    {}", printer::l2_domains(&net, &l2).join("\n    "));
        }
        MainCommand::Taint { subnet } => {
            let subnet = Subnet::from(subnet);
            let mut rag = ReachabilityTaintGraph::new(&net, &l2, Some(&subnet));
            rag.taint();
            println!("{}", printer::rag(&net, &rag).join("\n"));
        }
        MainCommand::Query { dst, src, fail, variant, show, contract } => {
            let (dst, src) = (Subnet::from(dst), Subnet::from(src));
            let failures = FailureSet::from_names(&net, parse_failures(&fail)?);
            let mut rag = ReachabilityTaintGraph::new(&net, &l2, Some(&dst));
            rag.taint();
            let tpg = TopologyPathGraph::build(&net, &l2, &rag, (&dst, &src), variant.into())?;
            info!("Graph has {} vertices and {} edges", tpg.num_vertices(), tpg.num_edges());
            if show {
                println!("{}\n", printer::tpg(&net, &tpg).join("\n"));
            }

            match tpg.has_path(&failures) {
                Some(path) => {
                    println!("{} is reachable from {}:", dst, src);
                    println!("    {}", printer::path(&net, &path));
                }
                None => println!("{} is not reachable from {}", dst, src),
            }
            {
                let sim = tpg.simulate(&failures)?;
                debug!("Simulation converged after {} rounds", sim.rounds());
                match (sim.best_path(), sim.reprocess()) {
                    (Some(best), Some(routers)) => println!(
                        "Selected path ({}):\n    {}",
                        printer::signature(&best.signature),
                        printer::router_path(&net, &routers).join(" => ")
                    ),
                    (Some(_), None) => println!("The selected path contains a forwarding loop"),
                    (None, _) => println!("No path is selected"),
                }
            }

            if contract {
                let contracted = tpg.contract();
                println!(
                    "\nContracted graph with {} vertices and {} edges:",
                    contracted.num_vertices(),
                    contracted.num_edges()
                );
                for (a, b, _) in contracted.edges() {
                    println!("    [{}] -> [{}]", printer::path(&net, a), printer::path(&net, b));
                }
            }
        }
        MainCommand::Check { variant } => {
            let results = check_all(&net, &l2, &cfg.tests, variant.into());
            let mut failed = 0;
            for (case, result) in cfg.tests.iter().zip(results) {
                let status = match result {
                    Ok(outcome) if outcome.passed => "ok".to_string(),
                    Ok(outcome) => {
                        failed += 1;
                        let path = outcome.best_path;
                        format!("FAILED (found = {}, path = {:?})", outcome.found, path)
                    }
                    Err(e) => {
                        failed += 1;
                        format!("ERROR ({})", e)
                    }
                };
                println!("{} -> {}: {}", case.origin, case.destination, status);
            }
            println!("{} of {} cases passed", cfg.tests.len() - failed, cfg.tests.len());
            if failed > 0 {
                return Err(Box::new(CliError::CheckFailed(failed)));
            }
        }
    }
    Ok(())
}

/// Parse failed links of the form `A:B`.
fn parse_failures(links: &[String]) -> Result<Vec<(String, String)>, CliError> {
    links
        .iter()
        .map(|l| {
            let mut parts = l.splitn(2, ':');
            match (parts.next(), parts.next()) {
                (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
                    Ok((a.to_string(), b.to_string()))
                }
                _ => Err(CliError::InvalidLink(l.clone())),
            }
        })
        .collect()
}

/// Errors of the command line tool
#[derive(Debug, Error)]
enum CliError {
    /// A failed link is not of the form `A:B`
    #[error("Invalid link {0}, expected the form A:B")]
    InvalidLink(String),
    /// Some reachability cases did not pass
    #[error("{0} cases failed")]
    CheckFailed(usize),
    /// No example network with this name exists
    #[error("Unknown example network {0:?}, choose one of {names}", names = NAMES.join(", "))]
    UnknownExample(String),
}

/// Verify reachability of multi-protocol networks, by building the topology path graph for pairs
/// of subnets and querying it.
#[derive(Parser, Debug)]
#[clap(name = "Tiramisu", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Network to analyze
    #[clap(flatten)]
    network: NetworkSelection,
    /// Action to perform
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(Args, Debug)]
struct NetworkSelection {
    /// JSON configuration file
    #[clap(short = 'c', long, conflicts_with = "example", required_unless_present = "example")]
    config: Option<String>,
    /// Example network, like `ospfline:1`
    #[clap(short = 'e', long)]
    example: Option<String>,
}

impl NetworkSelection {
    fn load(&self) -> Result<NetworkConfig, Box<dyn StdError>> {
        match (self.config.as_ref(), self.example.as_ref()) {
            (Some(file), _) => Ok(NetworkConfig::load(file)?),
            (None, Some(name)) => {
                Ok(by_name(name).ok_or_else(|| CliError::UnknownExample(name.clone()))?)
            }
            (None, None) => Err(Box::new(CliError::UnknownExample(String::new()))),
        }
    }
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Print the network and its L2 domains
    #[clap(name = "model")]
    Model,
    /// Print the taint state of all routing processes
    #[clap(name = "taint")]
    Taint {
        /// Destination subnet
        subnet: String,
    },
    /// Check whether the destination is reachable from the source
    #[clap(name = "query")]
    Query {
        /// Destination subnet
        #[clap(short = 'd', long)]
        dst: String,
        /// Source subnet
        #[clap(short = 's', long)]
        src: String,
        /// Failed link, like `R1:R2` (may be repeated)
        #[clap(short = 'f', long = "fail")]
        fail: Vec<String>,
        /// Fidelity of the topology path graph
        #[clap(arg_enum, short = 'v', long, default_value = "coarse")]
        variant: Variant,
        /// Print all edges of the graph
        #[clap(long)]
        show: bool,
        /// Print the contracted graph
        #[clap(long)]
        contract: bool,
    },
    /// Run the reachability cases stored with the network
    #[clap(name = "check")]
    Check {
        /// Fidelity of the topology path graph
        #[clap(arg_enum, short = 'v', long, default_value = "coarse")]
        variant: Variant,
    },
}

#[derive(ArgEnum, Clone, Copy, Debug)]
enum Variant {
    Coarse,
    Fine,
}

impl From<Variant> for FidelityVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Coarse => FidelityVariant::Coarse,
            Variant::Fine => FidelityVariant::Fine,
        }
    }
}
