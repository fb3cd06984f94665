use std::env;
use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veltis::chain::WalletMinter;
use veltis::workflow::{HttpRegistryApi, MintRunner, UploadSource};

fn require_env(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{name} is not set"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "veltis=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: veltis-mint <file>"))?;

    let api_url =
        env::var("VELTIS_API_URL").unwrap_or_else(|_| "http://localhost:5001".to_string());
    let api_token = require_env("VELTIS_API_TOKEN")?;
    let wallet_key = require_env("VELTIS_WALLET_KEY")?;
    let rpc_url =
        env::var("VELTIS_RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());
    let contract_address = require_env("VELTIS_CONTRACT_ADDRESS")?;

    let wallet = WalletMinter::new(&wallet_key, &rpc_url, &contract_address)?;
    let recipient =
        env::var("VELTIS_RECIPIENT").unwrap_or_else(|_| wallet.address().to_string());

    let bytes = tokio::fs::read(&path).await?;
    let filename = Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    let api = HttpRegistryApi::new(&api_url, &api_token);
    let (runner, mut phases) = MintRunner::new(api, wallet, &recipient);

    let printer = tokio::spawn(async move {
        while let Some(phase) = phases.recv().await {
            println!("{}", phase.label());
        }
    });

    let source = UploadSource {
        bytes: bytes.into(),
        filename,
        mime_type,
    };
    let result = runner.run(source).await;
    // Close the channel so the printer drains and exits.
    drop(runner);
    printer.await?;

    let outcome = result?;
    println!(
        "Record {} saved (token {}, tx {}).",
        outcome.ip_record_id, outcome.token_id, outcome.tx_hash
    );
    Ok(())
}
