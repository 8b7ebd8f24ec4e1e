//! Demo CLI: runs the full checkin flow against an in-process signer.
//!
//! Connects, personal-signs the checkin message, typed-data-signs the
//! CheckIn payload, and verifies both signatures by address recovery.

use anyhow::{bail, Context, Result};
use clap::Parser;
use eseats_checkin::{
    personal, CheckinController, EcdsaSignature, LocalSigner, VerifyOutcome,
};
use serde::Serialize;

const PERSONAL_MESSAGE: &str = "check-in using tokenId 1";

#[derive(Parser)]
#[command(name = "eseats-checkin", about = "Eseats checkin signing demo")]
struct Args {
    /// 32-byte signer secret key in hex; a random key is generated when
    /// omitted
    #[arg(long)]
    secret: Option<String>,

    /// Chain id reported by the signer
    #[arg(long, default_value_t = 1)]
    chain_id: u64,

    /// Network id reported by the signer
    #[arg(long, default_value_t = 1)]
    network_id: u64,

    /// Emit a machine-readable JSON transcript instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Transcript {
    account: String,
    chain_id: u64,
    network_id: u64,
    personal_message: String,
    personal_signature: String,
    personal_outcome: VerifyOutcome,
    typed_data: serde_json::Value,
    typed_data_signature: String,
    typed_data_outcome: VerifyOutcome,
    final_state: eseats_checkin::FlowState,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let signer = match &args.secret {
        Some(secret) => LocalSigner::from_secret_hex(secret, args.chain_id, args.network_id)
            .context("invalid --secret")?,
        None => LocalSigner::random(args.chain_id, args.network_id),
    };

    let mut controller = CheckinController::new(signer);
    let session = controller.connect().context("connect failed")?;
    let account = session
        .active_account()
        .context("signer exposed no accounts")?
        .to_string();
    let (chain_id, network_id) = (session.chain_id, session.network_id);

    // personal-sign leg
    let message = PERSONAL_MESSAGE.as_bytes();
    let personal_signature = controller
        .request_personal_signature(message, &account)
        .context("personal sign failed")?;
    let personal_outcome =
        controller.verify_personal_signature(message, &personal_signature, &account)?;

    // typed-data leg
    let payload = controller.build_check_in_payload()?;
    let typed_data_signature = controller
        .request_signature(&payload, &account)
        .context("typed-data sign failed")?;
    let typed_data_outcome =
        controller.verify_signature(&payload, &typed_data_signature, &account)?;

    if args.json {
        let transcript = Transcript {
            account: account.clone(),
            chain_id,
            network_id,
            personal_message: PERSONAL_MESSAGE.to_string(),
            personal_signature,
            personal_outcome,
            typed_data: serde_json::to_value(&payload)?,
            typed_data_signature,
            typed_data_outcome,
            final_state: controller.state(),
        };
        println!("{}", serde_json::to_string_pretty(&transcript)?);
        return Ok(());
    }

    println!("Account:    {}", account);
    println!("Chain id:   {}", chain_id);
    println!("Network id: {}", network_id);
    println!();
    println!("personal_sign(\"{}\")", PERSONAL_MESSAGE);
    println!("  signature: {}", personal_signature);
    report("  ", &personal_outcome)?;

    let parsed = EcdsaSignature::from_hex(&personal_signature)?;
    println!(
        "  recovered: {}",
        personal::recover_personal(message, &parsed)?
    );
    println!();
    println!("eth_signTypedData_v4(CheckIn)");
    println!("  payload:   {}", payload.to_json()?);
    println!("  signature: {}", typed_data_signature);
    report("  ", &typed_data_outcome)?;

    Ok(())
}

fn report(indent: &str, outcome: &VerifyOutcome) -> Result<()> {
    match outcome {
        VerifyOutcome::Verified(address) => {
            println!("{}verified:  {}", indent, address);
            Ok(())
        }
        VerifyOutcome::Mismatch { recovered, expected } => {
            bail!("signer mismatch: recovered {recovered}, expected {expected}")
        }
    }
}
