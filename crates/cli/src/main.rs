use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use wpdev_config::Config;
use wpdev_netcheck::{check_connectivity, Connectivity, HttpProbe};
use wpdev_provision_runner::{
    run_provision, DesiredState, HeadlessUI, HostBackend, ProvisionOptions, ProvisionReport,
    RealHost,
};

#[derive(Parser)]
#[command(name = "wpdev", version, about = "WordPress development VM provisioner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the host against the configured desired state
    Provision {
        /// Skip the connectivity gate (treat the host as online)
        #[arg(long)]
        skip_network: bool,
        /// Skip the dump import stage
        #[arg(long)]
        skip_dumps: bool,
    },
    /// Show the probed host state without mutating anything
    Status,
    /// Run only the connectivity check
    Network,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let base_path = PathBuf::from(".");
    let config = Config::load_from_dir(&base_path)?;
    let desired = DesiredState::from_config(&config);

    match cli.command {
        Commands::Provision {
            skip_network,
            skip_dumps,
        } => {
            let host = Arc::new(RealHost::new());
            let probe = HttpProbe::new(&desired.network.probe_url, desired.network.timeout)?;
            let mut ui = HeadlessUI;

            let report = run_provision(
                host,
                &probe,
                &desired,
                ProvisionOptions {
                    skip_network,
                    skip_dumps,
                },
                &mut ui,
            )
            .await;

            // Failed stages were already listed by the UI
            match report {
                ProvisionReport::Completed | ProvisionReport::CompletedWithoutNetwork => {
                    Ok(ExitCode::SUCCESS)
                }
                ProvisionReport::CompletedWithFailures(_) => Ok(ExitCode::FAILURE),
            }
        }

        Commands::Status => {
            print_status(&desired).await;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Network => {
            let probe = HttpProbe::new(&desired.network.probe_url, desired.network.timeout)?;
            match check_connectivity(&probe, desired.network.attempts).await {
                Connectivity::Reachable => {
                    println!("Network reachable via {}", desired.network.probe_url);
                    Ok(ExitCode::SUCCESS)
                }
                Connectivity::Unreachable => {
                    println!(
                        "Network unreachable ({} attempt(s) against {})",
                        desired.network.attempts, desired.network.probe_url
                    );
                    Ok(ExitCode::from(2))
                }
            }
        }
    }
}

/// Read-only report of desired vs. observed state. Never mutates the host.
async fn print_status(desired: &DesiredState) {
    let host = RealHost::new();

    println!("Packages:");
    if desired.packages.is_empty() {
        println!("  (none configured)");
    } else {
        match host.installed_packages().await {
            Ok(installed) => {
                for package in &desired.packages {
                    match installed.get(package) {
                        Some(version) => println!("  {package}: installed ({version})"),
                        None => println!("  {package}: missing"),
                    }
                }
            }
            Err(err) => println!("  probe failed: {err}"),
        }
    }

    println!("\nResources:");
    if desired.resources.is_empty() {
        println!("  (none configured)");
    }
    for resource in &desired.resources {
        let state = if host.path_exists(&resource.dest).await {
            "present"
        } else {
            "missing"
        };
        println!("  {}: {} ({})", resource.name, state, resource.dest.display());
    }

    println!("\nSecrets:");
    if desired.secrets.is_empty() {
        println!("  (none configured)");
    }
    for secret in &desired.secrets {
        let state = if host.path_exists(&secret.path).await {
            "present"
        } else {
            "missing"
        };
        println!("  {}: {} ({})", secret.name, state, secret.path.display());
    }

    println!("\nServices:");
    if desired.services.is_empty() {
        println!("  (none configured)");
    }
    for service in &desired.services {
        let state = if host.service_running(service).await {
            "running"
        } else {
            "stopped"
        };
        println!("  {service}: {state}");
    }

    if let Some(dir) = &desired.dump_dir {
        println!("\nDumps in {}:", dir.display());
        match host.list_dump_files(dir).await {
            Ok(mut files) => {
                if files.is_empty() {
                    println!("  (none)");
                }
                files.sort();
                for file in files {
                    let Some(database) = file.file_stem().and_then(|s| s.to_str()) else {
                        continue;
                    };
                    match host.database_state(database).await {
                        Ok(state) => match state.table_count() {
                            Some(tables) => println!("  {database}: {tables} table(s)"),
                            None => println!("  {database}: database missing"),
                        },
                        Err(err) => println!("  {database}: probe failed: {err}"),
                    }
                }
            }
            Err(err) => println!("  probe failed: {err}"),
        }
    }
}
