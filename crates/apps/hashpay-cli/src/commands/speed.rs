//! Locked-transfer throughput benchmark.

use std::sync::Arc;
use std::time::Instant;

use hashpay_channel::{
    BlockHeightProvider, ChannelConfig, ChannelManager, InMemoryKeyProvider, ManualBlockHeight,
};
use hashpay_crypto::{address_from_private_key, keccak256, private_key_from_seed, Address};
use hashpay_types::{Amount, Secret};
use tracing::{debug, info};

use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, Render, SpeedOutput};
use crate::progress;

/// Parameters of one benchmark run.
#[derive(Debug, Clone)]
pub struct SpeedParams {
    pub transfers: u64,
    pub max_locked: u64,
    pub channel: ChannelConfig,
}

/// Execute the speed command.
pub fn speed(params: SpeedParams, format: OutputFormat) -> CliResult<String> {
    let output = run(&params, format)?;
    Ok(output.render(format))
}

/// Run the benchmark and collect its results.
pub fn run(params: &SpeedParams, format: OutputFormat) -> CliResult<SpeedOutput> {
    let sender_key = private_key_from_seed(b"speed:0")?;
    let receiver_key = private_key_from_seed(b"speed:1")?;
    let sender = address_from_private_key(&sender_key)?;
    let receiver = address_from_private_key(&receiver_key)?;
    let asset = asset_address("asset:0");

    let amounts: Vec<Amount> = (1..=params.transfers).map(|a| a % 100 + 1).collect();
    let deposit: Amount = amounts.iter().sum();
    let secrets: Vec<Secret> = (0..params.transfers)
        .map(|i| Secret::from(i.to_string().as_str()))
        .collect();

    let chain = Arc::new(ManualBlockHeight::new(0));
    let sender_node = ChannelManager::new(
        asset,
        sender,
        params.channel.clone(),
        chain.clone(),
        Arc::new(InMemoryKeyProvider::with_key(sender_key)?),
    );
    let receiver_node = ChannelManager::new(
        asset,
        receiver,
        params.channel.clone(),
        chain.clone(),
        Arc::new(InMemoryKeyProvider::with_key(receiver_key)?),
    );
    sender_node.open_channel(receiver, deposit, deposit)?;
    receiver_node.open_channel(sender, deposit, deposit)?;

    let expiration = chain.block_number() + params.channel.reveal_timeout + 3;
    let max_locked = usize::try_from(params.max_locked)
        .map_err(|_| CliError::user("--max-locked is too large"))?;
    info!(
        transfers = params.transfers,
        max_locked = params.max_locked,
        deposit,
        expiration,
        "Starting transfer benchmark"
    );

    let pb = progress::for_format(format, params.transfers, "Transferring");
    let mut claimed = 0u64;
    let start = Instant::now();

    for (i, amount) in amounts.iter().enumerate() {
        let transfer = sender_node.send_locked_transfer(
            &receiver,
            *amount,
            expiration,
            secrets[i].hashlock(),
            i as u64,
        )?;
        receiver_node.register_transfer(&sender, transfer)?;

        if i > max_locked {
            let secret = &secrets[i - max_locked];
            sender_node.claim_locked(&receiver, secret)?;
            receiver_node.claim_locked(&sender, secret)?;
            claimed += 1;
        }
        pb.inc(1);
    }

    let elapsed = start.elapsed().as_secs_f64();
    pb.finish_and_clear();

    let sender_view = sender_node.snapshot(&receiver)?;
    let receiver_view = receiver_node.snapshot(&sender)?;
    if sender_view.ours != receiver_view.partner {
        return Err(CliError::user("sender and receiver ledgers diverged"));
    }
    debug!(?sender_view, "Final channel state");

    let transfers_per_second = if elapsed > 0.0 {
        params.transfers as f64 / elapsed
    } else {
        0.0
    };

    Ok(SpeedOutput {
        transfers: params.transfers,
        max_locked: params.max_locked,
        elapsed_secs: elapsed,
        transfers_per_second,
        claimed,
        pending_locks: sender_view.ours.pending_locks.len(),
        sender_balance: sender_view.ours.balance,
        receiver_balance: receiver_view.ours.balance,
    })
}

/// First 20 bytes of `keccak256(seed)`.
fn asset_address(seed: &str) -> Address {
    let digest = keccak256(seed.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest.0[..20]);
    Address(bytes)
}
