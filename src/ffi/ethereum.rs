use js_sys::Function;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// An [EIP-1193] provider object as injected by a wallet extension,
    /// e.g. `window.bitkeep.ethereum`.
    ///
    /// Every listener receives the event payload as its arguments.
    ///
    /// [EIP-1193]: https://eips.ethereum.org/EIPS/eip-1193
    #[derive(Clone, PartialEq)]
    pub type Ethereum;

    #[wasm_bindgen(method)]
    pub fn on(this: &Ethereum, event: &str, listener: &Function);

    #[wasm_bindgen(method)]
    pub fn once(this: &Ethereum, event: &str, listener: &Function);

    #[wasm_bindgen(method)]
    pub fn off(this: &Ethereum, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_name = "addListener")]
    pub fn add_listener(this: &Ethereum, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_name = "removeListener")]
    pub fn remove_listener(this: &Ethereum, event: &str, listener: &Function);

    /// remove every listener of `event`, or of every event if `None`
    #[wasm_bindgen(method, js_name = "removeAllListeners")]
    pub fn remove_all_listeners(this: &Ethereum, event: Option<String>);
}
