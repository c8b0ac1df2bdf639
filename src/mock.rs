//! In-memory [`Environment`] and [`EthereumProvider`] for the unit tests.

use crate::provider::{
    Brand, Environment, EthereumProvider, EventKind, EventListener, ProviderEvent,
};
use std::{
    cell::{Cell, RefCell},
    io,
    rc::Rc,
    sync::{Arc, Mutex},
    time::Duration,
};

type Timer = (Duration, Box<dyn FnOnce()>);

#[derive(Clone, Default)]
pub(crate) struct MockEnvironment {
    inner: Rc<EnvironmentInner>,
}

#[derive(Default)]
struct EnvironmentInner {
    slot: RefCell<Option<MockProvider>>,
    listeners: RefCell<Vec<(usize, Rc<dyn Fn()>)>>,
    next_listener: Cell<usize>,
    registrations: Cell<usize>,
    timers: RefCell<Vec<Timer>>,
    armed: RefCell<Vec<Duration>>,
}

impl MockEnvironment {
    pub fn with_provider(provider: MockProvider) -> Self {
        let env = Self::default();
        env.inject(provider);
        env
    }

    pub fn inject(&self, provider: MockProvider) {
        *self.inner.slot.borrow_mut() = Some(provider);
    }

    /// dispatch `ethereum#initialized`, listeners are registered `once`
    pub fn dispatch_initialized(&self) {
        let listeners = std::mem::take(&mut *self.inner.listeners.borrow_mut());
        for (_, listener) in listeners {
            listener();
        }
    }

    /// run every pending timer, regardless of its delay
    pub fn fire_timers(&self) {
        let timers = std::mem::take(&mut *self.inner.timers.borrow_mut());
        for (_, timer) in timers {
            timer();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// number of `ethereum#initialized` listeners ever registered
    pub fn registrations(&self) -> usize {
        self.inner.registrations.get()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// delays of every timer ever armed
    pub fn armed_timeouts(&self) -> Vec<Duration> {
        self.inner.armed.borrow().clone()
    }
}

impl Environment for MockEnvironment {
    type Provider = MockProvider;
    type Listener = usize;

    fn injected_provider(&self, _brand: &Brand) -> Option<MockProvider> {
        self.inner.slot.borrow().clone()
    }

    fn on_initialized(&self, listener: Rc<dyn Fn()>) -> usize {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner
            .registrations
            .set(self.inner.registrations.get() + 1);
        self.inner.listeners.borrow_mut().push((id, listener));
        id
    }

    fn remove_initialized(&self, listener: usize) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(id, _)| *id != listener);
    }

    fn set_timeout(&self, timeout: Duration, callback: Box<dyn FnOnce()>) {
        self.inner.armed.borrow_mut().push(timeout);
        self.inner.timers.borrow_mut().push((timeout, callback));
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockProvider {
    inner: Rc<ProviderInner>,
}

#[derive(Default)]
struct ProviderInner {
    flags: Vec<&'static str>,
    providers: Vec<MockProvider>,
    listeners: RefCell<Vec<(EventKind, EventListener)>>,
}

impl MockProvider {
    pub fn new(flags: &[&'static str], providers: Vec<MockProvider>) -> Self {
        Self {
            inner: Rc::new(ProviderInner {
                flags: flags.to_vec(),
                providers,
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn bitkeep() -> Self {
        Self::new(&[Brand::BITKEEP.flag()], Vec::new())
    }

    /// a provider without any brand flag
    pub fn plain() -> Self {
        Self::new(&[], Vec::new())
    }

    /// the composite object some browsers inject when several wallet
    /// extensions are installed
    pub fn aggregate(providers: Vec<MockProvider>) -> Self {
        Self::new(&[], providers)
    }

    pub fn emit(&self, event: ProviderEvent) {
        let kind = event.kind();
        let listeners: Vec<_> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn subscribed(&self) -> Vec<EventKind> {
        self.inner.listeners.borrow().iter().map(|(k, _)| *k).collect()
    }
}

impl PartialEq for MockProvider {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("flags", &self.inner.flags)
            .field("providers", &self.inner.providers.len())
            .finish()
    }
}

impl EthereumProvider for MockProvider {
    fn is_brand(&self, brand: &Brand) -> bool {
        self.inner.flags.contains(&brand.flag())
    }

    fn providers(&self) -> Vec<Self> {
        self.inner.providers.clone()
    }

    fn on(&self, event: EventKind, listener: EventListener) {
        self.inner.listeners.borrow_mut().push((event, listener));
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// run `f` with a subscriber recording every event, one line per event
pub(crate) fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().unwrap().clone();
    let lines = String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_owned)
        .collect();
    (result, lines)
}
