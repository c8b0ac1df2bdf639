/*!
Capabilities the connector needs from the outside world.

The detector and the adapter never touch the browser directly: they go
through an [`Environment`] (the global object, its `ethereum#initialized`
event and its timers) and an [`EthereumProvider`] (the injected wallet
object). The browser backed implementations live in [`crate::ffi`].
*/

use crate::error::ProviderRpcError;
use std::{fmt, rc::Rc, time::Duration};

/// Identifies a wallet vendor: where it injects its provider and which
/// boolean property marks its provider objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Brand {
    name: &'static str,
    namespace: &'static str,
    flag: &'static str,
}

impl Brand {
    /// `window.bitkeep.ethereum`, flagged with `isBitKeep`.
    pub const BITKEEP: Self = Self::new("BitKeep", "bitkeep", "isBitKeep");

    pub const fn new(name: &'static str, namespace: &'static str, flag: &'static str) -> Self {
        Self {
            name,
            namespace,
            flag,
        }
    }

    /// human readable vendor name, e.g. `"BitKeep"`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// the property of `window` the vendor injects into, e.g. `"bitkeep"`
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// the boolean property set on the vendor's providers, e.g. `"isBitKeep"`
    pub fn flag(&self) -> &'static str {
        self.flag
    }
}

impl Default for Brand {
    fn default() -> Self {
        Self::BITKEEP
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The provider events the connector subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Connect,
    Disconnect,
    ChainChanged,
    AccountsChanged,
}

impl EventKind {
    pub const ALL: [Self; 4] = [
        Self::Connect,
        Self::Disconnect,
        Self::ChainChanged,
        Self::AccountsChanged,
    ];

    /// the event name as dispatched by the provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::ChainChanged => "chainChanged",
            Self::AccountsChanged => "accountsChanged",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of the `connect` event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInfo {
    /// hexadecimal chain id, e.g. `"0x38"`
    pub chain_id: String,
}

/// A decoded provider event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Connect(ConnectInfo),
    Disconnect(ProviderRpcError),
    ChainChanged(String),
    AccountsChanged(Vec<String>),
}

impl ProviderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connect(_) => EventKind::Connect,
            Self::Disconnect(_) => EventKind::Disconnect,
            Self::ChainChanged(_) => EventKind::ChainChanged,
            Self::AccountsChanged(_) => EventKind::AccountsChanged,
        }
    }

    /// decode the payload of an event of the given kind
    ///
    /// Works with any self describing deserializer: a `serde_json::Value`
    /// or a `serde_wasm_bindgen::Deserializer` wrapping a `JsValue`.
    pub fn decode<'de, D>(kind: EventKind, payload: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::Deserialize as _;

        Ok(match kind {
            EventKind::Connect => Self::Connect(ConnectInfo::deserialize(payload)?),
            EventKind::Disconnect => Self::Disconnect(ProviderRpcError::deserialize(payload)?),
            EventKind::ChainChanged => Self::ChainChanged(String::deserialize(payload)?),
            EventKind::AccountsChanged => {
                Self::AccountsChanged(Vec::<String>::deserialize(payload)?)
            }
        })
    }

    /// same as [`ProviderEvent::decode`] except that a `disconnect` is never
    /// dropped: a payload that is not even an object still yields a
    /// [`ProviderEvent::Disconnect`] with an unspecified code.
    pub fn decode_lenient<'de, D>(kind: EventKind, payload: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Self::decode(kind, payload) {
            Err(error) if kind == EventKind::Disconnect => Ok(Self::Disconnect(
                ProviderRpcError::unspecified(error.to_string()),
            )),
            decoded => decoded,
        }
    }
}

/// Listener registered on a provider event.
pub type EventListener = Rc<dyn Fn(ProviderEvent)>;

/// An injected wallet provider.
///
/// Implementations are cheap handles (`Clone`) onto the same underlying
/// object.
pub trait EthereumProvider: Clone + 'static {
    /// whether the provider carries the `brand`'s flag set to `true`
    fn is_brand(&self, brand: &Brand) -> bool;

    /// the nested providers, when several wallet extensions were
    /// aggregated into one injected object. Empty otherwise.
    fn providers(&self) -> Vec<Self>;

    /// subscribe `listener` to `event` for the lifetime of the provider
    fn on(&self, event: EventKind, listener: EventListener);
}

/// The shared global object the wallet extensions inject into.
pub trait Environment: Clone + 'static {
    type Provider: EthereumProvider;
    /// token returned by [`Environment::on_initialized`] to remove the
    /// listener again
    type Listener: 'static;

    /// read `window[brand.namespace].ethereum`, if any
    fn injected_provider(&self, brand: &Brand) -> Option<Self::Provider>;

    /// register a one-shot listener on the global `ethereum#initialized`
    /// event
    fn on_initialized(&self, listener: Rc<dyn Fn()>) -> Self::Listener;

    fn remove_initialized(&self, listener: Self::Listener);

    /// run `callback` once after `timeout`
    fn set_timeout(&self, timeout: Duration, callback: Box<dyn FnOnce()>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use serde_json::json;

    #[test]
    fn decode_connect() {
        let event =
            ProviderEvent::decode(EventKind::Connect, json!({ "chainId": "0x1" })).unwrap();
        assert_eq!(
            event,
            ProviderEvent::Connect(ConnectInfo {
                chain_id: "0x1".to_owned()
            })
        );
        assert_eq!(event.kind(), EventKind::Connect);
    }

    #[test]
    fn decode_disconnect() {
        let event = ProviderEvent::decode(
            EventKind::Disconnect,
            json!({ "code": 4900, "message": "Disconnected" }),
        )
        .unwrap();
        let ProviderEvent::Disconnect(error) = event else {
            panic!("expected a disconnect event");
        };
        assert_eq!(error.code, ProviderErrorCode::Disconnected);
    }

    #[test]
    fn decode_chain_and_accounts() {
        assert_eq!(
            ProviderEvent::decode(EventKind::ChainChanged, json!("0x38")).unwrap(),
            ProviderEvent::ChainChanged("0x38".to_owned())
        );
        assert_eq!(
            ProviderEvent::decode(EventKind::AccountsChanged, json!([])).unwrap(),
            ProviderEvent::AccountsChanged(Vec::new())
        );
        assert_eq!(
            ProviderEvent::decode(EventKind::AccountsChanged, json!(["0xabc", "0xdef"])).unwrap(),
            ProviderEvent::AccountsChanged(vec!["0xabc".to_owned(), "0xdef".to_owned()])
        );
    }

    #[test]
    fn decode_mismatched_payload() {
        assert!(ProviderEvent::decode(EventKind::ChainChanged, json!(56)).is_err());
        assert!(ProviderEvent::decode(EventKind::Connect, json!({})).is_err());
        assert!(ProviderEvent::decode(EventKind::AccountsChanged, json!("0xabc")).is_err());
    }

    #[test]
    fn disconnect_is_never_dropped() {
        let payload = json!({ "message": "socket closed" });
        let event = ProviderEvent::decode_lenient(EventKind::Disconnect, payload).unwrap();
        assert_eq!(
            event,
            ProviderEvent::Disconnect(ProviderRpcError::unspecified("socket closed"))
        );

        for payload in [json!(null), json!("closed"), json!(4900)] {
            let event = ProviderEvent::decode_lenient(EventKind::Disconnect, payload).unwrap();
            let ProviderEvent::Disconnect(error) = event else {
                panic!("expected a disconnect event");
            };
            assert_eq!(error.code, ProviderErrorCode::Unspecified);
            assert!(!error.message.is_empty());
        }

        // other events are as strict as before
        assert!(ProviderEvent::decode_lenient(EventKind::ChainChanged, json!(56)).is_err());
    }

    #[test]
    fn event_names() {
        let names: Vec<_> = EventKind::ALL.iter().map(EventKind::as_str).collect();
        assert_eq!(
            names,
            ["connect", "disconnect", "chainChanged", "accountsChanged"]
        );
    }
}
