//! EIP-3668 offchain lookups.
//!
//! A resolver that keeps its records off-chain reverts with
//! `OffchainLookup`; the caller fetches the answer from one of the listed
//! gateways and hands it back to the resolver's callback function.

use super::ens::ResolveError;
use alloy::{
    hex,
    primitives::{Bytes, FixedBytes},
    sol,
    sol_types::{SolError, SolValue},
};
use serde::Deserialize;
use std::time::Duration;

/// Selector of `OffchainLookup(address,string[],bytes,bytes4,bytes)`.
pub const OFFCHAIN_LOOKUP_SELECTOR: [u8; 4] = [0x55, 0x6f, 0x18, 0x30];

/// Gateway round trips allowed for a single resolver call.
pub const MAX_REDIRECTS: usize = 4;

pub const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

sol! {
    #[derive(Debug, PartialEq, Eq)]
    error OffchainLookup(
        address sender,
        string[] urls,
        bytes callData,
        bytes4 callbackFunction,
        bytes extraData
    );
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    data: Bytes,
}

/// Decodes revert data as an `OffchainLookup`, if it is one.
pub fn decode_offchain_lookup(revert: &[u8]) -> Option<OffchainLookup> {
    if !revert.starts_with(&OFFCHAIN_LOOKUP_SELECTOR) {
        return None;
    }
    OffchainLookup::abi_decode(revert).ok()
}

/// Substitutes `{sender}` and `{data}` into a gateway URL template.
pub fn gateway_url(template: &str, lookup: &OffchainLookup) -> String {
    template
        .replace("{sender}", &hex::encode_prefixed(lookup.sender))
        .replace("{data}", &hex::encode_prefixed(&lookup.callData))
}

/// Calldata for `callbackFunction(response, extraData)`.
pub fn callback_calldata(lookup: &OffchainLookup, response: Bytes) -> Bytes {
    let args = (response, lookup.extraData.clone()).abi_encode_params();
    let selector: FixedBytes<4> = lookup.callbackFunction;
    [selector.as_slice(), args.as_slice()].concat().into()
}

/// Asks each gateway in turn until one answers.
///
/// Templates containing `{data}` are fetched with GET, the rest with a JSON
/// POST. A 4xx answer ends the lookup; 5xx and connection failures move on
/// to the next URL.
pub async fn fetch_gateway(
    client: &reqwest::Client,
    lookup: &OffchainLookup,
) -> Result<Bytes, ResolveError> {
    let sender = hex::encode_prefixed(lookup.sender);
    let data = hex::encode_prefixed(&lookup.callData);
    let mut failures = Vec::new();

    for template in &lookup.urls {
        let url = gateway_url(template, lookup);
        let request = if template.contains("{data}") {
            client.get(&url)
        } else {
            client.post(&url).json(&serde_json::json!({
                "data": data,
                "sender": sender,
            }))
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(%url, error = %err, "ccip gateway unreachable");
                failures.push(format!("{url}: {err}"));
                continue;
            }
        };
        let status = response.status();
        if status.is_success() {
            let body: GatewayResponse = response.json().await?;
            return Ok(body.data);
        }
        if status.is_client_error() {
            return Err(ResolveError::Gateway(format!("{url} answered {status}")));
        }
        tracing::debug!(%url, %status, "ccip gateway failed, trying next");
        failures.push(format!("{url} answered {status}"));
    }

    if failures.is_empty() {
        return Err(ResolveError::Gateway("offchain lookup lists no gateways".into()));
    }
    Err(ResolveError::Gateway(failures.join("; ")))
}
