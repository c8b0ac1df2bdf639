use crate::{
    detect::detect_provider,
    error::ProviderRpcError,
    options::DetectOptions,
    provider::{Brand, ConnectInfo, Environment, EthereumProvider, EventKind, ProviderEvent},
    state::{Actions, ChainId, StateUpdate},
};
use futures::{
    FutureExt as _,
    future::{LocalBoxFuture, Shared},
};
use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

/// The memoized outcome of [`Connector::activate`]: the bound provider, if
/// one was detected.
pub type Activation<P> = Shared<LocalBoxFuture<'static, Option<P>>>;

/// Callback receiving the errors of the provider `disconnect` events.
pub type ErrorCallback = Rc<dyn Fn(&ProviderRpcError)>;

/// What the surrounding connector framework expects from a connector.
pub trait Connector {
    type Provider: Clone;

    /// detect and bind the provider
    ///
    /// Every call returns the same [`Activation`]: the detection and the
    /// event subscriptions happen once per connector. An activation that
    /// settles after the connector was dropped binds nothing and resolves
    /// to `None`.
    fn activate(&self) -> Activation<Self::Provider>;

    /// the bound provider, once [`Connector::activate`] resolved with one
    fn provider(&self) -> Option<Self::Provider>;

    /// translate a provider event into calls to the state [`Actions`]
    fn handle_event(&self, event: ProviderEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConnectorOptions {
    pub brand: Brand,
    pub detect: DetectOptions,
}

/// Connector for the BitKeep injected provider (or any other [`Brand`] set
/// in the [`ConnectorOptions`]).
///
/// Once activated, the provider's `connect`, `disconnect`, `chainChanged`
/// and `accountsChanged` events are forwarded to the [`Actions`]. There is
/// no way to unsubscribe: the listeners stay registered on the provider for
/// as long as the page lives, they only stop forwarding once every handle
/// on the connector has been dropped.
pub struct BitKeep<E: Environment, A: Actions> {
    inner: Rc<Inner<E, A>>,
}

struct Inner<E: Environment, A: Actions> {
    env: E,
    actions: A,
    options: ConnectorOptions,
    on_error: RefCell<Option<ErrorCallback>>,
    provider: RefCell<Option<E::Provider>>,
    eager_connection: RefCell<Option<Activation<E::Provider>>>,
}

impl<E: Environment, A: Actions> Clone for BitKeep<E, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: Environment, A: Actions> BitKeep<E, A> {
    pub fn new(env: E, actions: A) -> Self {
        Self::with_options(env, actions, ConnectorOptions::default())
    }

    pub fn with_options(env: E, actions: A, options: ConnectorOptions) -> Self {
        Self {
            inner: Rc::new(Inner {
                env,
                actions,
                options,
                on_error: RefCell::new(None),
                provider: RefCell::new(None),
                eager_connection: RefCell::new(None),
            }),
        }
    }

    /// set the callback receiving the provider's disconnect errors
    pub fn on_error(&self, callback: impl Fn(&ProviderRpcError) + 'static) {
        *self.inner.on_error.borrow_mut() = Some(Rc::new(callback));
    }

    pub fn options(&self) -> &ConnectorOptions {
        &self.inner.options
    }

    pub fn actions(&self) -> &A {
        &self.inner.actions
    }
}

impl<E: Environment, A: Actions> Connector for BitKeep<E, A> {
    type Provider = E::Provider;

    fn activate(&self) -> Activation<E::Provider> {
        let existing = self.inner.eager_connection.borrow().clone();
        if let Some(activation) = existing {
            return activation;
        }

        let ConnectorOptions { brand, detect } = self.inner.options;
        tracing::debug!(%brand, "activating connector");

        // started now so the slot is read in the caller's turn
        let detection = detect_provider(&self.inner.env, brand, detect);
        // the connector owns the activation, the activation must not own it
        let inner = Rc::downgrade(&self.inner);
        let activation = async move {
            detection
                .await
                .and_then(|provider| Some(inner.upgrade()?.bind(provider)))
        }
        .boxed_local()
        .shared();

        *self.inner.eager_connection.borrow_mut() = Some(activation.clone());
        activation
    }

    fn provider(&self) -> Option<E::Provider> {
        self.inner.provider.borrow().clone()
    }

    fn handle_event(&self, event: ProviderEvent) {
        self.inner.handle_event(event)
    }
}

impl<E: Environment, A: Actions> Inner<E, A> {
    fn bind(self: &Rc<Self>, provider: E::Provider) -> E::Provider {
        let brand = self.options.brand;

        // some browsers aggregate every installed extension in one object
        let mut nested = provider.providers();
        let is_nested = !nested.is_empty();
        let provider = match nested.iter().position(|p| p.is_brand(&brand)) {
            Some(index) => nested.swap_remove(index),
            None if is_nested => nested.swap_remove(0),
            None => provider,
        };

        for kind in EventKind::ALL {
            let connector: Weak<Self> = Rc::downgrade(self);
            provider.on(
                kind,
                Rc::new(move |event| {
                    if let Some(connector) = connector.upgrade() {
                        connector.handle_event(event);
                    }
                }),
            );
        }

        tracing::debug!(%brand, nested = is_nested, "provider bound");
        *self.provider.borrow_mut() = Some(provider.clone());
        provider
    }

    fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::Connect(ConnectInfo { chain_id })
            | ProviderEvent::ChainChanged(chain_id) => {
                let chain_id = ChainId::parse_hex(&chain_id);
                self.actions.update(StateUpdate::chain_id(chain_id));
            }
            ProviderEvent::Disconnect(error) if error.code.is_transient() => {
                // the provider is re-establishing the connection on its own
                tracing::debug!(
                    brand = %self.options.brand,
                    "provider logged connection error {}: \"Try again later\"",
                    error.code.code().unwrap_or_default()
                );
            }
            ProviderEvent::Disconnect(error) => {
                self.actions.reset_state();
                let on_error = self.on_error.borrow().clone();
                if let Some(on_error) = on_error {
                    on_error(&error);
                }
            }
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                self.actions.reset_state();
            }
            ProviderEvent::AccountsChanged(accounts) => {
                self.actions.update(StateUpdate::accounts(accounts));
            }
        }
    }
}
