use anyhow::{Context as _, Result};
use base64::{engine::general_purpose, Engine as _};
use clap::Parser;
use contract_host::config::{DEFAULT_CONTRACT_ID, DEFAULT_FUNCTION, DEFAULT_RUNTIME_PATH};
use contract_host::{Host, HostConfig, Invocation};
use log::debug;
use std::{fs, path::PathBuf};

#[derive(Debug, Parser)]
#[clap(author, about, version)]
struct Args {
    /// The contract runtime, built to wasm with wasm-bindgen.
    #[arg(long, default_value = DEFAULT_RUNTIME_PATH)]
    runtime: PathBuf,

    #[arg(long, default_value = DEFAULT_CONTRACT_ID)]
    contract_id: String,

    /// Contract module to run. Defaults to the built-in pixel NFT contract.
    #[arg(long)]
    contract: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_FUNCTION)]
    function: String,

    /// Call arguments as base64 XDR.
    #[arg(long, default_value = "")]
    args: String,

    /// Limit guest execution to this much fuel.
    #[arg(long)]
    fuel: Option<u64>,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();
    debug!("{args:?}");

    let config = HostConfig {
        fuel: args.fuel,
        ..Default::default()
    };
    let mut invocation = Invocation {
        contract_id: args.contract_id,
        function: args.function,
        args: args.args,
        ..Default::default()
    };
    if let Some(path) = args.contract {
        let wasm = fs::read(&path)
            .with_context(|| format!("cannot read contract {}", path.display()))?;
        invocation = invocation.with_module_bytes(wasm);
    }

    let mut host = Host::from_file(&args.runtime, &config)?;
    let result = host.invoke(&invocation)?;
    if let Some(fuel) = host.remaining_fuel() {
        debug!("fuel left: {fuel}");
    }
    println!("{}", general_purpose::STANDARD.encode(result));
    Ok(())
}
