use super::{
    NameService,
    ccip::{self, MAX_REDIRECTS},
};
use crate::chain::Chain;
use alloy::{
    network::TransactionBuilder,
    primitives::{Address, B256, Bytes, FixedBytes, keccak256},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    sol,
    sol_types::SolCall,
    transports::TransportError,
};
use std::fmt;

/// `supportsInterface` id of ENSIP-10 wildcard resolvers.
pub const ENSIP10_RESOLVER_INTERFACE: [u8; 4] = [0x90, 0x61, 0xb9, 0x23];

const MAX_LABEL_LEN: usize = 63;

// JSON-RPC error code geth and most nodes use for `execution reverted`.
const REVERT_CODE: i64 = 3;

sol! {
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    interface IEnsResolver {
        function addr(bytes32 node) external view returns (address);
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
        function resolve(bytes name, bytes data) external view returns (bytes);
    }
}

#[derive(Debug)]
pub enum ResolveError {
    NoEndpoint(String),
    Unsupported(String),
    InvalidName(String),
    Transport(TransportError),
    Abi(alloy::sol_types::Error),
    Http(reqwest::Error),
    Gateway(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NoEndpoint(chain) => {
                write!(f, "no RPC endpoint configured for \"{chain}\"")
            }
            ResolveError::Unsupported(chain) => {
                write!(f, "network \"{chain}\" does not support ENS")
            }
            ResolveError::InvalidName(reason) => write!(f, "invalid ENS name: {reason}"),
            ResolveError::Transport(err) => write!(f, "rpc transport error: {err}"),
            ResolveError::Abi(err) => write!(f, "ens response decode error: {err}"),
            ResolveError::Http(err) => write!(f, "ccip gateway request failed: {err}"),
            ResolveError::Gateway(message) => write!(f, "ccip lookup failed: {message}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Transport(err) => Some(err),
            ResolveError::Abi(err) => Some(err),
            ResolveError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for ResolveError {
    fn from(value: TransportError) -> Self {
        ResolveError::Transport(value)
    }
}

impl From<alloy::sol_types::Error> for ResolveError {
    fn from(value: alloy::sol_types::Error) -> Self {
        ResolveError::Abi(value)
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(value: reqwest::Error) -> Self {
        ResolveError::Http(value)
    }
}

/// EIP-137 namehash of an already normalized name.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        node = keccak256([node.as_slice(), label_hash.as_slice()].concat());
    }
    node
}

/// DNS wire encoding used by ENSIP-10 `resolve(bytes,bytes)`.
pub fn dns_encode(name: &str) -> Result<Bytes, ResolveError> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.split('.') {
        if label.len() > MAX_LABEL_LEN {
            return Err(ResolveError::InvalidName(format!(
                "label \"{label}\" is longer than {MAX_LABEL_LEN} bytes"
            )));
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(out.into())
}

/// Lower-cases `name` and rejects shapes the registry can never hold.
pub fn normalize_name(name: &str) -> Result<String, ResolveError> {
    if name.trim().is_empty() {
        return Err(ResolveError::InvalidName("empty name".into()));
    }
    if looks_like_hex(name) {
        return Err(ResolveError::InvalidName(format!(
            "\"{name}\" is a hex string, not a name"
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ResolveError::InvalidName(format!(
            "\"{name}\" contains whitespace"
        )));
    }
    if name.split('.').any(str::is_empty) {
        return Err(ResolveError::InvalidName(format!(
            "\"{name}\" has an empty label"
        )));
    }
    Ok(name.to_lowercase())
}

fn looks_like_hex(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_hexdigit()))
}

fn non_zero(address: Address) -> Option<Address> {
    (!address.is_zero()).then_some(address)
}

/// Result of an `eth_call` that reached the node.
#[derive(Debug)]
enum CallOutcome {
    Returned(Bytes),
    /// The call reverted, with the revert data when the node reported it.
    Reverted(Option<Bytes>),
}

async fn eth_call<P: Provider>(
    provider: &P,
    to: Address,
    calldata: impl Into<Bytes>,
) -> Result<CallOutcome, ResolveError> {
    let tx = TransactionRequest::default()
        .with_to(to)
        .with_input(calldata.into());
    match provider.call(tx).await {
        Ok(output) => Ok(CallOutcome::Returned(output)),
        Err(err) => {
            let reverted = err
                .as_error_resp()
                .filter(|payload| {
                    payload.code == REVERT_CODE || payload.message.contains("revert")
                })
                .map(|payload| payload.as_revert_data());
            match reverted {
                Some(data) => Ok(CallOutcome::Reverted(data)),
                None => Err(err.into()),
            }
        }
    }
}

/// Resolves ENS names through the chain's first RPC endpoint.
#[derive(Debug, Clone, Default)]
pub struct EnsNameService {
    rpc_override: Option<String>,
    http: reqwest::Client,
}

impl EnsNameService {
    pub fn new(rpc_override: Option<String>) -> Result<Self, ResolveError> {
        let http = reqwest::Client::builder()
            .user_agent("evm-address-tui/0.1.0")
            .timeout(ccip::GATEWAY_TIMEOUT)
            .build()?;
        Ok(Self { rpc_override, http })
    }

    fn endpoint_for(&self, chain: &Chain) -> Result<String, ResolveError> {
        self.rpc_override
            .clone()
            .or_else(|| chain.primary_rpc().map(str::to_string))
            .ok_or_else(|| ResolveError::NoEndpoint(chain.name.clone()))
    }

    /// Walks from `name` towards the root until a resolver is registered.
    ///
    /// A resolver found on a parent is only used when it implements ENSIP-10.
    /// The walk never falls back to the `eth` resolver for names below it.
    async fn lookup<P: Provider>(
        &self,
        provider: &P,
        registry: Address,
        name: &str,
    ) -> Result<Option<Address>, ResolveError> {
        let mut current = name;
        loop {
            if current.is_empty() || (name != "eth" && current == "eth") {
                return Ok(None);
            }
            let resolver = Self::registry_resolver(provider, registry, current).await?;
            if !resolver.is_zero() {
                if current == name {
                    return self.resolve_addr(provider, resolver, name, false).await;
                }
                if !Self::supports_wildcard(provider, resolver).await? {
                    tracing::debug!(name, parent = current, "parent resolver is not wildcard");
                    return Ok(None);
                }
                return self.resolve_addr(provider, resolver, name, true).await;
            }
            current = current.split_once('.').map_or("", |(_, parent)| parent);
        }
    }

    async fn registry_resolver<P: Provider>(
        provider: &P,
        registry: Address,
        name: &str,
    ) -> Result<Address, ResolveError> {
        let calldata = IEnsRegistry::resolverCall {
            node: namehash(name),
        }
        .abi_encode();
        match eth_call(provider, registry, calldata).await? {
            CallOutcome::Returned(output) if output.len() == 32 => {
                Ok(IEnsRegistry::resolverCall::abi_decode_returns(&output)?)
            }
            _ => Ok(Address::ZERO),
        }
    }

    async fn supports_wildcard<P: Provider>(
        provider: &P,
        resolver: Address,
    ) -> Result<bool, ResolveError> {
        let calldata = IEnsResolver::supportsInterfaceCall {
            interfaceId: FixedBytes::from(ENSIP10_RESOLVER_INTERFACE),
        }
        .abi_encode();
        match eth_call(provider, resolver, calldata).await? {
            CallOutcome::Returned(output) if !output.is_empty() => {
                Ok(IEnsResolver::supportsInterfaceCall::abi_decode_returns(&output)?)
            }
            _ => Ok(false),
        }
    }

    async fn resolve_addr<P: Provider>(
        &self,
        provider: &P,
        resolver: Address,
        name: &str,
        wildcard: bool,
    ) -> Result<Option<Address>, ResolveError> {
        let inner = IEnsResolver::addrCall {
            node: namehash(name),
        }
        .abi_encode();
        let calldata = if wildcard {
            IEnsResolver::resolveCall {
                name: dns_encode(name)?,
                data: inner.into(),
            }
            .abi_encode()
        } else {
            inner
        };

        let Some(output) = self.call_resolver(provider, resolver, calldata.into()).await? else {
            return Ok(None);
        };
        let output = if wildcard {
            IEnsResolver::resolveCall::abi_decode_returns(&output)?
        } else {
            output
        };
        if output.is_empty() {
            return Ok(None);
        }
        let address = IEnsResolver::addrCall::abi_decode_returns(&output)?;
        Ok(non_zero(address))
    }

    /// Calls the resolver, following offchain lookups.
    ///
    /// `Ok(None)` when the resolver reverts with anything but
    /// `OffchainLookup`, or returns a bare error selector.
    async fn call_resolver<P: Provider>(
        &self,
        provider: &P,
        resolver: Address,
        mut calldata: Bytes,
    ) -> Result<Option<Bytes>, ResolveError> {
        for _ in 0..=MAX_REDIRECTS {
            let revert = match eth_call(provider, resolver, calldata.clone()).await? {
                CallOutcome::Returned(output) if output.len() % 32 == 4 => return Ok(None),
                CallOutcome::Returned(output) => return Ok(Some(output)),
                CallOutcome::Reverted(revert) => revert,
            };
            let Some(lookup) = revert.as_deref().and_then(|b| ccip::decode_offchain_lookup(b)) else {
                tracing::debug!(%resolver, "resolver reverted");
                return Ok(None);
            };
            if lookup.sender != resolver {
                return Err(ResolveError::Gateway(format!(
                    "offchain lookup sender {} does not match resolver {resolver}",
                    lookup.sender
                )));
            }
            tracing::debug!(%resolver, urls = lookup.urls.len(), "following offchain lookup");
            let response = ccip::fetch_gateway(&self.http, &lookup).await?;
            calldata = ccip::callback_calldata(&lookup, response);
        }
        Err(ResolveError::Gateway(format!(
            "more than {MAX_REDIRECTS} offchain lookups for one call"
        )))
    }
}

impl NameService for EnsNameService {
    async fn resolve_name(
        &self,
        chain: &Chain,
        name: &str,
    ) -> Result<Option<Address>, ResolveError> {
        let registry = chain
            .ens_registry
            .ok_or_else(|| ResolveError::Unsupported(chain.name.clone()))?;
        let normalized = normalize_name(name)?;
        let endpoint = self.endpoint_for(chain)?;

        tracing::debug!(name = %normalized, %endpoint, "resolving ens name");
        let provider = ProviderBuilder::new().connect(&endpoint).await?;
        let resolved = self.lookup(&provider, registry, &normalized).await?;
        tracing::debug!(name = %normalized, found = resolved.is_some(), "ens lookup finished");
        Ok(resolved)
    }
}
