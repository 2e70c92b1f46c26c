//! The wallet bridge: mount, observe, relay.
//!
//! `WalletBridge` ties one provider to one mount target. While mounted it
//! holds a single provider subscription; every key notification goes through
//! the `Dispatcher` and re-renders the connect control.

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::event::{BridgeEvent, EventSink};
use crate::mount::{ConnectControl, MountHost, MountState};
use crate::observer::{Dispatcher, HandlerId};
use crate::provider::{KeyListener, SubscriptionId, WalletProvider, WalletState};
use crate::pubkey::Pubkey;
use crate::relay::{self, SignRequest, SignResponse};
use futures::channel::mpsc;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{info, warn};

struct Inner<P, H> {
    config: BridgeConfig,
    provider: P,
    host: H,
    dispatcher: Dispatcher,
    mount: Cell<MountState>,
    subscription: RefCell<Option<SubscriptionId>>,
}

impl<P: WalletProvider, H: MountHost> Inner<P, H> {
    fn render(&self, state: &WalletState) -> Result<(), BridgeError> {
        let control = ConnectControl::for_state(state, &self.config.endpoint);
        self.host.render(&self.config.mount_target_id, &control)
    }

    fn on_key_change(&self, pubkey: Option<Pubkey>) {
        if !self.mount.get().is_mounted() {
            return;
        }
        let state = WalletState::from(pubkey);
        self.mount.set(MountState::Mounted(state));
        if let Err(e) = self.render(&state) {
            warn!(error = %e, "failed to re-render connect control");
        }
        self.dispatcher.observe(state);
    }
}

/// One bridge instance. Cloning shares the instance.
pub struct WalletBridge<P, H> {
    inner: Rc<Inner<P, H>>,
}

impl<P, H> Clone for WalletBridge<P, H> {
    fn clone(&self) -> Self {
        WalletBridge {
            inner: self.inner.clone(),
        }
    }
}

impl<P, H> WalletBridge<P, H>
where
    P: WalletProvider + 'static,
    H: MountHost + 'static,
{
    pub fn new(config: BridgeConfig, provider: P, host: H) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(WalletBridge {
            inner: Rc::new(Inner {
                config,
                provider,
                host,
                dispatcher: Dispatcher::new(),
                mount: Cell::new(MountState::Unmounted),
                subscription: RefCell::new(None),
            }),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn state(&self) -> MountState {
        self.inner.mount.get()
    }

    /// Number of key-change events published so far.
    pub fn published_events(&self) -> usize {
        self.inner.dispatcher.published()
    }

    /// Render the connect control and start observing the wallet.
    ///
    /// Mounting an already mounted bridge replaces the rendered control.
    /// The current wallet state is published if it differs from the last
    /// state handlers were told about, which survives an unmount.
    pub fn mount(&self) -> Result<(), BridgeError> {
        let inner = &self.inner;
        let target = &inner.config.mount_target_id;
        let state = inner.provider.state();

        if let Err(e) = inner.render(&state) {
            warn!(error = %e, mount_target = %target, "mount failed");
            return Err(e);
        }

        if inner.mount.get().is_mounted() {
            info!(mount_target = %target, "connect control re-rendered");
            return Ok(());
        }

        let weak: Weak<Inner<P, H>> = Rc::downgrade(inner);
        let listener: KeyListener = Rc::new(move |pubkey: Option<Pubkey>| {
            if let Some(inner) = weak.upgrade() {
                inner.on_key_change(pubkey);
            }
        });
        let id = inner.provider.subscribe(listener);
        *inner.subscription.borrow_mut() = Some(id);

        inner.mount.set(MountState::Mounted(state));
        inner.dispatcher.observe(state);

        info!(
            mount_target = %target,
            endpoint = %inner.config.endpoint,
            %state,
            "wallet bridge mounted"
        );
        Ok(())
    }

    /// Stop observing and remove the connect control.
    pub fn unmount(&self) {
        let inner = &self.inner;
        if !inner.mount.get().is_mounted() {
            return;
        }
        if let Some(id) = inner.subscription.borrow_mut().take() {
            inner.provider.unsubscribe(id);
        }
        if let Err(e) = inner.host.clear(&inner.config.mount_target_id) {
            warn!(error = %e, "failed to clear connect control");
        }
        inner.mount.set(MountState::Unmounted);
        info!(mount_target = %inner.config.mount_target_id, "wallet bridge unmounted");
    }

    pub fn on_public_key_change(&self, handler: impl Fn(&BridgeEvent) + 'static) -> HandlerId {
        self.inner.dispatcher.on_public_key_change(handler)
    }

    pub fn off_public_key_change(&self, id: HandlerId) -> bool {
        self.inner.dispatcher.remove(id)
    }

    pub fn add_sink(&self, sink: Rc<dyn EventSink>) -> HandlerId {
        self.inner.dispatcher.add_sink(sink)
    }

    pub fn subscribe_channel(&self) -> (HandlerId, mpsc::UnboundedReceiver<BridgeEvent>) {
        self.inner.dispatcher.subscribe_channel()
    }

    /// Relay one sign request to the connected wallet.
    pub async fn sign_transaction(&self, request: &SignRequest) -> Result<SignResponse, BridgeError> {
        let result = relay::sign_transaction(&self.inner.provider, request).await;
        if let Err(e) = &result {
            warn!(error = %e, "sign request failed");
        }
        result
    }

    /// `sign_transaction` with the configured error policy applied.
    pub async fn sign_transaction_with_policy(
        &self,
        request: &SignRequest,
    ) -> Result<Option<SignResponse>, BridgeError> {
        let result = self.sign_transaction(request).await;
        self.inner.config.error_policy.apply(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorPolicy;
    use crate::error::SigningError;
    use crate::host::{HostWallet, SignatureInvocation, SignatureStatus};
    use crate::memo::build_memo_transaction;
    use crate::mount::testing::FakeDocument;
    use crate::mount::SELECT_WALLET_LABEL;
    use crate::provider::KeypairWallet;
    use crate::pubkey::PubkeyExt;
    use futures::executor::block_on;
    use solana_sdk::hash::Hash;

    type TestBridge = WalletBridge<Rc<KeypairWallet>, FakeDocument>;

    fn seed() -> [u8; 32] {
        let mut seed = [0u8; 32];
        for (i, b) in seed.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        seed
    }

    fn bridge_in(target: &str) -> (TestBridge, Rc<KeypairWallet>) {
        let wallet = Rc::new(KeypairWallet::from_seed(seed()));
        let config = BridgeConfig::local().unwrap().with_mount_target_id("root");
        let bridge = WalletBridge::new(config, wallet.clone(), FakeDocument::with_element(target))
            .unwrap();
        (bridge, wallet)
    }

    fn record(bridge: &TestBridge) -> Rc<RefCell<Vec<BridgeEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        bridge.on_public_key_change(move |event| sink.borrow_mut().push(event.clone()));
        seen
    }

    #[test]
    fn test_mount_connect_disconnect_scenario() {
        let (bridge, wallet) = bridge_in("root");
        let seen = record(&bridge);

        bridge.mount().unwrap();
        assert_eq!(
            bridge.host().control("root").unwrap().label,
            SELECT_WALLET_LABEL
        );
        assert!(seen.borrow().is_empty());

        wallet.connect();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].pubkey, Some(wallet.pubkey().to_byte_list()));
        assert_eq!(bridge.state(), MountState::Mounted(WalletState::Connected(wallet.pubkey())));
        assert!(bridge.host().control("root").unwrap().connected);

        wallet.disconnect();
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1].pubkey, None);
        assert_eq!(bridge.state(), MountState::Mounted(WalletState::Disconnected));
    }

    #[test]
    fn test_mount_missing_target() {
        let (bridge, wallet) = bridge_in("elsewhere");
        let result = bridge.mount();
        assert_eq!(result, Err(BridgeError::NotFound("root".to_string())));
        assert_eq!(bridge.state(), MountState::Unmounted);
        assert_eq!(wallet.listener_count(), 0);
    }

    #[test]
    fn test_mount_twice_replaces_control() {
        let (bridge, wallet) = bridge_in("root");
        bridge.mount().unwrap();
        bridge.mount().unwrap();

        assert_eq!(*bridge.host().renders.borrow(), 2);
        assert_eq!(wallet.listener_count(), 1);
    }

    #[test]
    fn test_mount_with_connected_wallet_publishes_once() {
        let (bridge, wallet) = bridge_in("root");
        wallet.connect();
        let seen = record(&bridge);

        bridge.mount().unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_connected());
    }

    #[test]
    fn test_repeated_notifications_are_not_republished() {
        let (bridge, wallet) = bridge_in("root");
        let seen = record(&bridge);
        bridge.mount().unwrap();

        wallet.connect();
        wallet.renotify();
        wallet.renotify();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(bridge.published_events(), 1);
    }

    #[test]
    fn test_unmount_stops_observing() {
        let (bridge, wallet) = bridge_in("root");
        let seen = record(&bridge);
        bridge.mount().unwrap();
        bridge.unmount();

        wallet.connect();
        assert!(seen.borrow().is_empty());
        assert_eq!(wallet.listener_count(), 0);
        assert_eq!(bridge.state(), MountState::Unmounted);
        assert!(bridge.host().control("root").is_none());
    }

    #[test]
    fn test_remount_with_unchanged_key_is_silent() {
        let (bridge, wallet) = bridge_in("root");
        let seen = record(&bridge);
        bridge.mount().unwrap();
        wallet.connect();
        bridge.unmount();
        bridge.mount().unwrap();

        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_connected());
    }

    #[test]
    fn test_disconnect_while_unmounted_is_published_on_remount() {
        let (bridge, wallet) = bridge_in("root");
        let seen = record(&bridge);
        bridge.mount().unwrap();
        wallet.connect();
        bridge.unmount();
        wallet.disconnect();
        assert_eq!(seen.borrow().len(), 1);

        bridge.mount().unwrap();
        let events: Vec<bool> = seen.borrow().iter().map(BridgeEvent::is_connected).collect();
        assert_eq!(events, vec![true, false]);
        assert_eq!(seen.borrow().last().unwrap().pubkey, None);
    }

    #[test]
    fn test_handler_disconnecting_wallet_keeps_order() {
        let (bridge, wallet) = bridge_in("root");
        let w = wallet.clone();
        bridge.on_public_key_change(move |event| {
            if event.is_connected() {
                w.disconnect();
            }
        });
        let seen = record(&bridge);
        bridge.mount().unwrap();

        wallet.connect();

        let events: Vec<bool> = seen.borrow().iter().map(BridgeEvent::is_connected).collect();
        assert_eq!(events, vec![true, false]);
        assert!(!wallet.is_connected());
        assert_eq!(bridge.state(), MountState::Mounted(WalletState::Disconnected));
        assert!(!bridge.host().control("root").unwrap().connected);
    }

    #[test]
    fn test_host_round_trip_through_events_and_relay() {
        let (bridge, wallet) = bridge_in("root");
        let (_, mut events) = bridge.subscribe_channel();
        bridge.mount().unwrap();
        wallet.connect();

        let event = events.try_next().unwrap().unwrap();
        let host_wallet = HostWallet::from_event_detail(&event.to_json().unwrap());
        let payer = *host_wallet.pubkey().unwrap();
        assert_eq!(payer, wallet.pubkey());

        let tx = build_memo_transaction(&payer, "Hello, world", Hash::new_from_array([3; 32]))
            .unwrap();
        let mut invocation = SignatureInvocation::new();
        let request = invocation.prepare(&tx).unwrap();
        assert_eq!(invocation.status(), &SignatureStatus::Waiting);

        let response = block_on(bridge.sign_transaction(&request)).unwrap();
        let status = invocation.complete(Some(&response.b64)).clone();

        assert!(matches!(status, SignatureStatus::Done(_)));
        let signed = invocation.signed_transaction().unwrap();
        assert_eq!(signed.message, tx.message);
    }

    #[test]
    fn test_sign_policy_suppress_hides_error() {
        let (bridge, _wallet) = bridge_in("root");
        let request = SignRequest::new("not-base64!!");
        let result = block_on(bridge.sign_transaction_with_policy(&request));
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_sign_policy_propagate_returns_error() {
        let wallet = Rc::new(KeypairWallet::from_seed(seed()));
        let config = BridgeConfig::local()
            .unwrap()
            .with_mount_target_id("root")
            .with_error_policy(ErrorPolicy::Propagate);
        let bridge =
            WalletBridge::new(config, wallet.clone(), FakeDocument::with_element("root")).unwrap();
        let tx = build_memo_transaction(&wallet.pubkey(), "gm", Hash::default()).unwrap();
        let request = SignatureInvocation::new().prepare(&tx).unwrap();

        let result = block_on(bridge.sign_transaction_with_policy(&request));
        assert_eq!(result, Err(BridgeError::Signing(SigningError::NotConnected)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let wallet = Rc::new(KeypairWallet::from_seed(seed()));
        let config = BridgeConfig::local().unwrap().with_event_name("");
        let result = WalletBridge::new(config, wallet, FakeDocument::default());
        assert!(result.is_err());
    }
}
