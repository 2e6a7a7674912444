//! Turns raw, human-typed text into an account address.
//!
//! [`AddressResolver`] owns the raw input and re-derives a
//! [`ResolvedAddress`] whenever the input or the selected [`Chain`] changes:
//! the trimmed text is first checked as a literal address, and anything else
//! is handed to a [`NameService`] as a name. Lookups run on the tokio
//! runtime and are folded back in by [`AddressResolver::poll`], so a UI can
//! drive the resolver from its tick loop.

mod address;
mod ccip;
mod ens;

pub use address::is_literal_address;
pub use ens::{EnsNameService, ResolveError};

use crate::chain::Chain;
use alloy::primitives::Address;
use std::{future::Future, sync::Arc};
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

/// Remote name → address lookup.
pub trait NameService: Send + Sync + 'static {
    /// `Ok(None)` means the name exists in the service's namespace but maps
    /// to no address.
    fn resolve_name(
        &self,
        chain: &Chain,
        name: &str,
    ) -> impl Future<Output = Result<Option<Address>, ResolveError>> + Send;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub is_valid: bool,
    pub address: String,
}

impl ResolvedAddress {
    pub fn valid(address: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            address: address.into(),
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }
}

/// Validity of the current input alongside the input itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressStatus {
    pub is_valid: bool,
    pub input: String,
}

/// Resolves `input` against `chain`.
///
/// Only the literal check sees the trimmed text; the name service receives
/// `input` verbatim. A name without an address record is reported as valid
/// with an empty address, and every lookup failure as invalid.
pub async fn resolve_input<S: NameService>(
    input: &str,
    chain: &Chain,
    service: &S,
) -> ResolvedAddress {
    let value = input.trim();
    if is_literal_address(value) {
        return ResolvedAddress::valid(value);
    }
    match service.resolve_name(chain, input).await {
        Ok(Some(address)) => ResolvedAddress::valid(address.to_checksum(None)),
        Ok(None) => ResolvedAddress::valid(String::new()),
        Err(err) => {
            tracing::debug!(input, chain = %chain.name, error = %err, "name resolution failed");
            ResolvedAddress::invalid()
        }
    }
}

/// Cloneable handle that replaces the resolver's raw input.
///
/// Values are queued and picked up by the next [`AddressResolver::poll`];
/// when several arrive in between, the last one wins.
#[derive(Debug, Clone)]
pub struct InputSetter {
    sender: UnboundedSender<String>,
}

impl InputSetter {
    pub fn set(&self, value: impl Into<String>) {
        let _ = self.sender.send(value.into());
    }
}

#[derive(Debug)]
struct Completed {
    seq: u64,
    result: ResolvedAddress,
}

pub struct AddressResolver<S> {
    input: String,
    chain: Chain,
    result: ResolvedAddress,
    status: AddressStatus,
    revision: u64,
    issued: u64,
    applied: u64,
    service: Arc<S>,
    handle: Handle,
    completed_tx: UnboundedSender<Completed>,
    completed_rx: UnboundedReceiver<Completed>,
    setter: InputSetter,
    setter_rx: UnboundedReceiver<String>,
}

impl<S: NameService> AddressResolver<S> {
    /// Creates the resolver and starts resolving `initial` right away.
    pub fn new(initial: impl Into<String>, chain: Chain, service: S, handle: Handle) -> Self {
        let input = initial.into();
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        let (setter_tx, setter_rx) = mpsc::unbounded_channel();
        let mut resolver = Self {
            status: AddressStatus {
                is_valid: false,
                input: input.clone(),
            },
            input,
            chain,
            result: ResolvedAddress::invalid(),
            revision: 0,
            issued: 0,
            applied: 0,
            service: Arc::new(service),
            handle,
            completed_tx,
            completed_rx,
            setter: InputSetter { sender: setter_tx },
            setter_rx,
        };
        resolver.spawn_resolution();
        resolver
    }

    #[cfg(test)]
    pub fn with_default_chain(initial: impl Into<String>, service: S, handle: Handle) -> Self {
        Self::new(initial, Chain::default(), service, handle)
    }

    /// `(address, status, setter)`, in the shape an input widget consumes.
    pub fn parts(&self) -> (&str, &AddressStatus, InputSetter) {
        (&self.result.address, &self.status, self.setter.clone())
    }

    #[cfg(test)]
    pub fn address(&self) -> &str {
        &self.result.address
    }

    #[cfg(test)]
    pub fn status(&self) -> &AddressStatus {
        &self.status
    }

    pub fn resolved(&self) -> &ResolvedAddress {
        &self.result
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    #[cfg(test)]
    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn setter(&self) -> InputSetter {
        self.setter.clone()
    }

    /// Advances only when the input, validity or address changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the latest issued resolution has not been applied yet.
    pub fn is_pending(&self) -> bool {
        self.applied != self.issued
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value == self.input {
            return;
        }
        self.input = value;
        self.refresh_status();
        self.spawn_resolution();
    }

    pub fn set_chain(&mut self, chain: Chain) {
        if chain == self.chain {
            return;
        }
        tracing::info!(chain = %chain.name, chain_id = chain.chain_id, "address chain changed");
        self.chain = chain;
        self.spawn_resolution();
    }

    /// Applies queued setter values and finished lookups.
    ///
    /// Returns `true` when the visible output changed.
    pub fn poll(&mut self) -> bool {
        let before = self.revision;
        self.drain_setter();
        while let Ok(completed) = self.completed_rx.try_recv() {
            self.apply(completed);
        }
        self.revision != before
    }

    /// Waits until the latest issued resolution has been applied.
    #[cfg(test)]
    pub async fn settle(&mut self) {
        self.drain_setter();
        while self.is_pending() {
            match self.completed_rx.recv().await {
                Some(completed) => self.apply(completed),
                None => break,
            }
        }
    }

    fn drain_setter(&mut self) {
        let mut latest = None;
        while let Ok(value) = self.setter_rx.try_recv() {
            latest = Some(value);
        }
        if let Some(value) = latest {
            self.set_input(value);
        }
    }

    fn spawn_resolution(&mut self) {
        self.issued += 1;
        let seq = self.issued;
        let input = self.input.clone();
        let chain = self.chain.clone();
        let service = Arc::clone(&self.service);
        let sender = self.completed_tx.clone();
        tracing::debug!(seq, input = %input, chain = %chain.name, "resolving address input");
        self.handle.spawn(async move {
            let result = resolve_input(&input, &chain, service.as_ref()).await;
            let _ = sender.send(Completed { seq, result });
        });
    }

    fn apply(&mut self, completed: Completed) {
        if completed.seq != self.issued {
            tracing::trace!(
                seq = completed.seq,
                latest = self.issued,
                "discarding stale resolution"
            );
            return;
        }
        self.applied = completed.seq;
        if completed.result != self.result {
            self.result = completed.result;
            self.refresh_status();
        }
    }

    fn refresh_status(&mut self) {
        self.status = AddressStatus {
            is_valid: self.result.is_valid,
            input: self.input.clone(),
        };
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use tokio::time::sleep;

    const ALICE: Address = address!("1111111111111111111111111111111111111111");
    const BOB: Address = address!("2222222222222222222222222222222222222222");

    #[derive(Debug, Clone, Copy)]
    enum Entry {
        Mapped(Address),
        Unmapped,
    }

    /// In-memory name table; unknown names fail like an unreachable node.
    #[derive(Default)]
    struct StaticNames {
        entries: HashMap<String, Entry>,
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl StaticNames {
        fn with(mut self, name: &str, entry: Entry) -> Self {
            self.entries.insert(name.to_string(), entry);
            self
        }

        fn delayed(mut self, name: &str, delay: Duration) -> Self {
            self.delays.insert(name.to_string(), delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn seen(&self) -> Vec<(String, String)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl NameService for StaticNames {
        async fn resolve_name(
            &self,
            chain: &Chain,
            name: &str,
        ) -> Result<Option<Address>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((chain.name.clone(), name.to_string()));
            if let Some(delay) = self.delays.get(name) {
                sleep(*delay).await;
            }
            match self.entries.get(name) {
                Some(Entry::Mapped(address)) => Ok(Some(*address)),
                Some(Entry::Unmapped) => Ok(None),
                None => Err(ResolveError::InvalidName(name.to_string())),
            }
        }
    }

    async fn settled(initial: &str, names: StaticNames) -> AddressResolver<StaticNames> {
        let mut resolver = AddressResolver::with_default_chain(initial, names, Handle::current());
        resolver.settle().await;
        resolver
    }

    #[tokio::test]
    async fn literal_address_resolves_to_itself() {
        let input = "0xABCDEF0123456789ABCDEF0123456789ABCDEF01";
        let resolver = settled(input, StaticNames::default()).await;

        assert_eq!(resolver.resolved(), &ResolvedAddress::valid(input));
        assert_eq!(
            resolver.status(),
            &AddressStatus {
                is_valid: true,
                input: input.to_string()
            }
        );
        assert_eq!(resolver.service().calls(), 0);
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_trimmed_for_literals() {
        let input = "  0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\n";
        let resolver = settled(input, StaticNames::default()).await;

        assert_eq!(resolver.address(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert_eq!(resolver.status().input, input);
        assert!(resolver.status().is_valid);
    }

    #[tokio::test]
    async fn mapped_name_is_looked_up_untrimmed() {
        let names = StaticNames::default().with("  alice.eth  ", Entry::Mapped(ALICE));
        let resolver = settled("  alice.eth  ", names).await;

        assert_eq!(
            resolver.resolved(),
            &ResolvedAddress::valid("0x1111111111111111111111111111111111111111")
        );
        assert_eq!(
            resolver.service().seen(),
            vec![("Fantom".to_string(), "  alice.eth  ".to_string())]
        );
    }

    #[tokio::test]
    async fn resolved_names_are_checksummed() {
        let target = address!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        let names = StaticNames::default().with("vitalik.eth", Entry::Mapped(target));
        let resolver = settled("vitalik.eth", names).await;

        assert_eq!(resolver.address(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[tokio::test]
    async fn unmapped_name_is_valid_but_empty() {
        let names = StaticNames::default().with("nonexistent.eth", Entry::Unmapped);
        let resolver = settled("nonexistent.eth", names).await;

        assert_eq!(resolver.resolved(), &ResolvedAddress::valid(""));
        assert!(resolver.status().is_valid);
    }

    #[tokio::test]
    async fn failing_lookup_is_invalid() {
        let resolver = settled("broken.eth", StaticNames::default()).await;

        assert_eq!(resolver.resolved(), &ResolvedAddress::invalid());
        assert!(!resolver.status().is_valid);
    }

    #[tokio::test]
    async fn empty_input_is_invalid() {
        let resolver = settled("", StaticNames::default()).await;

        assert_eq!(resolver.resolved(), &ResolvedAddress::invalid());
        assert_eq!(resolver.status(), &AddressStatus::default());
    }

    #[tokio::test]
    async fn repeated_input_does_not_refetch() {
        let names = StaticNames::default().with("alice.eth", Entry::Mapped(ALICE));
        let mut resolver = settled("alice.eth", names).await;
        let revision = resolver.revision();

        resolver.set_input("alice.eth");
        resolver.set_chain(Chain::default());
        resolver.settle().await;

        assert!(!resolver.is_pending());
        assert!(!resolver.poll());
        assert_eq!(resolver.service().calls(), 1);
        assert_eq!(resolver.revision(), revision);
    }

    #[tokio::test]
    async fn chain_change_resolves_again() {
        let names = StaticNames::default().with("alice.eth", Entry::Mapped(ALICE));
        let mut resolver = settled("alice.eth", names).await;

        resolver.set_chain(Chain::mainnet());
        assert!(resolver.is_pending());
        resolver.settle().await;

        assert_eq!(resolver.chain().chain_id, 1);
        assert_eq!(
            resolver.service().seen(),
            vec![
                ("Fantom".to_string(), "alice.eth".to_string()),
                ("Ethereum".to_string(), "alice.eth".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn stale_lookup_never_overwrites_newer_input() {
        let names = StaticNames::default()
            .with("slow.eth", Entry::Mapped(ALICE))
            .with("fast.eth", Entry::Mapped(BOB))
            .delayed("slow.eth", Duration::from_millis(150));
        let mut resolver = AddressResolver::with_default_chain("slow.eth", names, Handle::current());

        resolver.set_input("fast.eth");
        resolver.settle().await;
        assert_eq!(resolver.address(), "0x2222222222222222222222222222222222222222");

        sleep(Duration::from_millis(300)).await;
        assert!(!resolver.poll());
        assert_eq!(resolver.address(), "0x2222222222222222222222222222222222222222");
        assert_eq!(resolver.service().calls(), 2);
    }

    #[tokio::test]
    async fn setter_updates_input_on_poll() {
        let names = StaticNames::default().with("bob.eth", Entry::Mapped(BOB));
        let mut resolver = settled("", names).await;
        let (_, _, setter) = resolver.parts();

        setter.set("ignored.eth");
        setter.set("bob.eth");
        assert_eq!(resolver.input(), "");
        resolver.settle().await;

        let (address, status, _) = resolver.parts();
        assert_eq!(address, "0x2222222222222222222222222222222222222222");
        assert_eq!(status.input, "bob.eth");
        assert!(status.is_valid);
        assert_eq!(resolver.service().calls(), 2);
    }

    #[tokio::test]
    async fn status_input_updates_before_resolution_lands() {
        let names = StaticNames::default()
            .with("alice.eth", Entry::Mapped(ALICE))
            .delayed("alice.eth", Duration::from_millis(50));
        let mut resolver = settled("", names).await;

        resolver.set_input("alice.eth");
        assert_eq!(resolver.status().input, "alice.eth");
        assert!(!resolver.status().is_valid);
        assert_eq!(resolver.address(), "");

        resolver.settle().await;
        assert!(resolver.status().is_valid);
        assert_eq!(resolver.address(), "0x1111111111111111111111111111111111111111");
    }
}
