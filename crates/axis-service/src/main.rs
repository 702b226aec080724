//! Command-line entry point for the AXIS transaction tools.
//!
//! Offers read-only chain queries (`height`, `scan`), chain-only identifier
//! resolution (`resolve`) and a dry-run walk through the full transaction
//! lifecycle (`demo`).

use axis_chain::implementations::explorer::ExplorerClient;
use axis_chain::{ChainQueryInterface, ChainScanner};
use axis_config::Config;
use axis_core::{CancellationToken, IdentifierResolver, TransactionCoordinator};
use axis_types::{programs, ResolutionKind, TransactionEvent, WalletCapabilities};
use axis_wallet::implementations::scripted::ScriptedWallet;
use axis_wallet::WalletGateway;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line arguments for the transaction tools.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/testnet.toml", env = "AXIS_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the latest block height
	Height,
	/// Search recent blocks for a transaction touching a program
	Scan {
		/// Program id, e.g. axis_lending_v2.aleo
		#[arg(short, long, default_value = programs::LENDING_PROGRAM)]
		program: String,
		/// Height to start from; defaults to the latest height
		#[arg(short, long)]
		from: Option<u64>,
	},
	/// Resolve a wallet tracking id using the chain only
	Resolve {
		/// Tracking id returned by the wallet
		id: String,
		#[arg(short, long, default_value = programs::LENDING_PROGRAM)]
		program: String,
		/// Block height at submission time, if known
		#[arg(long)]
		height: Option<u64>,
	},
	/// Walk a simulated execution through every status
	Demo {
		#[arg(short, long, default_value = programs::SCORE_PROGRAM)]
		program: String,
		#[arg(short, long, default_value = "commit_score")]
		function: String,
		/// Literal inputs in program order
		#[arg(short, long)]
		input: Vec<String>,
		/// Signer address reported by the simulated wallet
		#[arg(short, long, default_value = "aleo1demo")]
		address: String,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!(
		api_url = %config.chain.api_url,
		network = %config.chain.network,
		"Loaded configuration"
	);

	let chain: Arc<dyn ChainQueryInterface> = Arc::new(ExplorerClient::from_config(&config.chain)?);

	match args.command {
		Command::Height => {
			println!("{}", chain.latest_height().await?);
		},
		Command::Scan { program, from } => {
			let from = match from {
				Some(height) => height,
				None => chain.latest_height().await?,
			};
			let scanner = ChainScanner::new(chain, &config.scanner);
			match scanner.scan(&program, from).await? {
				Some(id) => println!("{}", id),
				None => println!("no transaction for {} since block {}", program, from),
			}
		},
		Command::Resolve {
			id,
			program,
			height,
		} => {
			let resolver = IdentifierResolver::new(chain, &config.resolver, &config.scanner);
			let resolution = resolver
				.resolve(None, &id, &program, height, &CancellationToken::never())
				.await?;
			let kind = match resolution.kind {
				ResolutionKind::Canonical => "canonical",
				ResolutionKind::BestEffort => "best-effort",
			};
			println!("{} ({})", resolution.id, kind);
		},
		Command::Demo {
			program,
			function,
			input,
			address,
		} => {
			run_demo(&config, chain, &program, &function, input, address).await?;
		},
	}

	Ok(())
}

/// Runs a dry-run execution and prints every event as it happens.
async fn run_demo(
	config: &Config,
	chain: Arc<dyn ChainQueryInterface>,
	program: &str,
	function: &str,
	inputs: Vec<String>,
	address: String,
) -> Result<(), Box<dyn std::error::Error>> {
	let wallet = ScriptedWallet::new(address).with_capabilities(WalletCapabilities::all());
	let gateway = Arc::new(WalletGateway::new(Box::new(wallet)));
	let coordinator = TransactionCoordinator::new(gateway, chain, config).with_dry_run(true);

	let mut events = coordinator.events().subscribe();
	let execution = coordinator.execute(program, function, inputs, None);
	tokio::pin!(execution);

	let result = loop {
		tokio::select! {
			result = &mut execution => break result,
			Ok(event) = events.recv() => print_event(&event),
		}
	};
	while let Ok(event) = events.try_recv() {
		print_event(&event);
	}

	let resolution = result?;
	let state = coordinator.state();
	println!(
		"done: {} (degraded: {}, proof: {} ms)",
		resolution.id,
		state.degraded,
		state.proof_duration_ms.unwrap_or_default()
	);
	Ok(())
}

fn print_event(event: &TransactionEvent) {
	match event {
		TransactionEvent::StatusChanged { status, .. } => println!("status: {}", status),
		TransactionEvent::Submitted {
			raw_tracking_id, ..
		} => println!("submitted: {}", raw_tracking_id),
		TransactionEvent::Failed { error, .. } => println!("failed: {}", error),
		TransactionEvent::Resolved { .. } | TransactionEvent::Reset { .. } => {},
	}
}
