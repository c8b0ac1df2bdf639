/*!

# BitKeep connector for injected Ethereum providers

This library is meant to be used for web applications that need to talk to the
BitKeep browser extension. It finds the provider the extension injects in
`window.bitkeep.ethereum` and keeps the application's connection state in sync
with it.

## Features

- Detect the injected provider, waiting for the extension if needed
- Pick the right provider when several extensions are aggregated
- Forward chain and account changes to the application state
- Report disconnections

## Usage

The application state is yours: implement [`Actions`] for it.

```no_run
use bitkeep_connector::{Actions, StateUpdate};

struct Store;

impl Actions for Store {
    fn update(&self, update: StateUpdate) {
        println!("chain: {:?}, accounts: {:?}", update.chain_id, update.accounts);
    }

    fn reset_state(&self) {
        println!("disconnected");
    }
}
```

Then create the connector and activate it. Activating detects the provider
(it waits up to 3 seconds by default for the extension) and subscribes to its
events. Activating more than once is fine, the first activation is shared by
every subsequent call.

```no_run
# use bitkeep_connector::{Actions, StateUpdate};
# struct Store;
# impl Actions for Store {
#     fn update(&self, _: StateUpdate) {}
#     fn reset_state(&self) {}
# }
use bitkeep_connector::{Connector as _, ffi};

# async fn test() -> anyhow::Result<()> {
let connector = ffi::bitkeep(Store).expect("a browser window");
connector.on_error(|error| eprintln!("disconnected: {error}"));

if let Some(_provider) = connector.activate().await {
    // the provider's events now flow into `Store`
}
# Ok(()) }
```

If no provider shows up in time the activation resolves to `None` and the
state is left untouched.

The detection alone is available with [`detect_provider`]. Everything that
touches the browser goes through the [`Environment`] and [`EthereumProvider`]
traits, the browser implementations are in [`ffi`].

*/

mod connector;
mod detect;
pub mod error;
pub mod ffi;
#[cfg(test)]
mod mock;
mod options;
pub mod provider;
mod state;

pub use self::{
    connector::{Activation, BitKeep, Connector, ConnectorOptions, ErrorCallback},
    detect::{Detection, detect_provider, try_detect_provider},
    error::{DetectionFailure, Error, ProviderErrorCode, ProviderRpcError},
    options::{DEFAULT_TIMEOUT, DetectOptions},
    provider::{Brand, Environment, EthereumProvider, EventKind, ProviderEvent},
    state::{Actions, ChainId, StateUpdate},
};
