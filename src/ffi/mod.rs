mod browser;
pub mod ethereum;

pub use self::{
    browser::{BrowserEnvironment, BrowserProvider, bitkeep},
    ethereum::Ethereum,
};

/// dispatched on `window` by the extensions once their provider is injected
pub const INITIALIZED_EVENT: &str = "ethereum#initialized";
