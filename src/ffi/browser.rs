use super::{Ethereum, INITIALIZED_EVENT};
use crate::{
    connector::{BitKeep, Connector as _},
    provider::{Brand, Environment, EthereumProvider, EventKind, EventListener, ProviderEvent},
    state::Actions,
};
use js_sys::{Array, Function, Reflect};
use std::{rc::Rc, time::Duration};
use wasm_bindgen::{JsCast as _, prelude::*};

/// [`Environment`] backed by the browser's `window`.
#[derive(Clone)]
pub struct BrowserEnvironment {
    window: web_sys::Window,
}

/// [`EthereumProvider`] backed by an injected [`Ethereum`] object.
#[derive(Clone, PartialEq)]
pub struct BrowserProvider {
    ethereum: Ethereum,
}

/// Browser backed connector for the BitKeep provider.
///
/// Returns `None` when there is no `window`, e.g. in a web worker.
pub fn bitkeep<A: Actions>(actions: A) -> Option<BitKeep<BrowserEnvironment, A>> {
    BrowserEnvironment::new().map(|env| BitKeep::new(env, actions))
}

impl BrowserEnvironment {
    pub fn new() -> Option<Self> {
        web_sys::window().map(|window| Self { window })
    }
}

impl Environment for BrowserEnvironment {
    type Provider = BrowserProvider;
    type Listener = Function;

    fn injected_provider(&self, brand: &Brand) -> Option<BrowserProvider> {
        // always read afresh: the extension may have injected it since last time
        let namespace = Reflect::get(&self.window, &JsValue::from_str(brand.namespace()))
            .ok()
            .filter(JsValue::is_object)?;
        let ethereum = Reflect::get(&namespace, &JsValue::from_str("ethereum"))
            .ok()
            .filter(JsValue::is_truthy)?;

        Some(BrowserProvider {
            ethereum: ethereum.unchecked_into(),
        })
    }

    fn on_initialized(&self, listener: Rc<dyn Fn()>) -> Function {
        // never invoked closures are only released with the page
        let callback: Function = Closure::once_into_js(move || listener()).unchecked_into();

        let options = web_sys::AddEventListenerOptions::new();
        options.set_once(true);
        if let Err(error) = self
            .window
            .add_event_listener_with_callback_and_add_event_listener_options(
                INITIALIZED_EVENT,
                &callback,
                &options,
            )
        {
            tracing::warn!(?error, "cannot listen to {INITIALIZED_EVENT}");
        }

        callback
    }

    fn remove_initialized(&self, listener: Function) {
        if let Err(error) = self
            .window
            .remove_event_listener_with_callback(INITIALIZED_EVENT, &listener)
        {
            tracing::warn!(?error, "cannot remove the {INITIALIZED_EVENT} listener");
        }
    }

    fn set_timeout(&self, timeout: Duration, callback: Box<dyn FnOnce()>) {
        let callback: Function = Closure::once_into_js(move || callback()).unchecked_into();
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);

        if let Err(error) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(&callback, millis)
        {
            tracing::warn!(?error, "cannot arm the provider detection timeout");
        }
    }
}

impl BrowserProvider {
    /// the raw injected object, to send requests through it
    pub fn ethereum(&self) -> &Ethereum {
        &self.ethereum
    }
}

impl EthereumProvider for BrowserProvider {
    fn is_brand(&self, brand: &Brand) -> bool {
        Reflect::get(&self.ethereum, &JsValue::from_str(brand.flag()))
            .ok()
            .and_then(|flag| flag.as_bool())
            .unwrap_or(false)
    }

    fn providers(&self) -> Vec<Self> {
        let Ok(providers) = Reflect::get(&self.ethereum, &JsValue::from_str("providers")) else {
            return Vec::new();
        };
        if !Array::is_array(&providers) {
            return Vec::new();
        }

        Array::from(&providers)
            .iter()
            .filter(JsValue::is_object)
            .map(|ethereum| BrowserProvider {
                ethereum: ethereum.unchecked_into(),
            })
            .collect()
    }

    fn on(&self, kind: EventKind, listener: EventListener) {
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
            let payload = serde_wasm_bindgen::Deserializer::from(payload);
            match ProviderEvent::decode_lenient(kind, payload) {
                Ok(event) => listener(event),
                Err(error) => tracing::warn!(%kind, %error, "dropping undecodable provider event"),
            }
        });
        self.ethereum.on(kind.as_str(), callback.as_ref().unchecked_ref());

        // subscribed for the lifetime of the page
        callback.forget();
    }
}

impl<A: Actions> BitKeep<BrowserEnvironment, A> {
    /// start the activation without waiting for it
    pub fn activate_in_background(&self) {
        let activation = self.activate();
        wasm_bindgen_futures::spawn_local(async move {
            let _provider = activation.await;
        });
    }
}
