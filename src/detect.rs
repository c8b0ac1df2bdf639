use crate::{
    error::{DetectionFailure, Error},
    options::DetectOptions,
    provider::{Brand, Environment, EthereumProvider},
};
use futures::{FutureExt as _, channel::oneshot};
use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

/// The pending outcome of [`detect_provider`].
///
/// Resolves to the provider, or `None` when nothing (or a provider of
/// another brand) was found before the timeout.
#[must_use = "detection only reports its outcome through this future"]
pub struct Detection<P> {
    receiver: oneshot::Receiver<Option<P>>,
}

impl<P> Future for Detection<P> {
    type Output = Option<P>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // a dropped sender means the environment discarded our callbacks
        self.receiver
            .poll_unpin(cx)
            .map(|outcome| outcome.ok().flatten())
    }
}

/// Wait for the `brand`'s provider to be injected in the environment.
///
/// If `window.<namespace>.ethereum` is already set the detection resolves
/// right away. Otherwise it resolves on the first of the
/// `ethereum#initialized` event or the timeout, whichever comes first. The
/// slot is read again at that point and the late trigger is ignored.
///
/// Detection never fails: a missing provider, or one without the brand flag
/// when [`DetectOptions::must_be_brand_specific`] is set, resolves to
/// `None`. Unless the options are `silent` one `error` is logged with the
/// `detect-provider` target.
pub fn detect_provider<E>(env: &E, brand: Brand, options: DetectOptions) -> Detection<E::Provider>
where
    E: Environment,
{
    let (sender, receiver) = oneshot::channel();
    let resolver = Rc::new(Resolver {
        env: env.clone(),
        brand,
        options,
        handled: Cell::new(false),
        listener: RefCell::new(None),
        sender: RefCell::new(Some(sender)),
    });

    if env.injected_provider(&brand).is_some() {
        resolver.handle();
    } else {
        tracing::debug!(%brand, timeout = ?options.timeout, "waiting for the provider injection");

        let on_initialized: Rc<dyn Fn()> = {
            let resolver = Rc::clone(&resolver);
            Rc::new(move || resolver.handle())
        };
        let listener = env.on_initialized(on_initialized);
        *resolver.listener.borrow_mut() = Some(listener);

        let on_timeout = Rc::clone(&resolver);
        env.set_timeout(options.timeout, Box::new(move || on_timeout.handle()));
    }

    Detection { receiver }
}

/// Same as [`detect_provider`] with options from a JSON document.
///
/// The options are validated before anything else happens: an option of the
/// wrong type returns [`Error::InvalidArgument`] and no detection starts.
pub fn try_detect_provider<E>(
    env: &E,
    brand: Brand,
    options: &serde_json::Value,
) -> Result<Detection<E::Provider>, Error>
where
    E: Environment,
{
    let options = DetectOptions::from_json(options)?;
    Ok(detect_provider(env, brand, options))
}

struct Resolver<E: Environment> {
    env: E,
    brand: Brand,
    options: DetectOptions,
    handled: Cell<bool>,
    listener: RefCell<Option<E::Listener>>,
    sender: RefCell<Option<oneshot::Sender<Option<E::Provider>>>>,
}

impl<E: Environment> Resolver<E> {
    fn handle(&self) {
        if self.handled.replace(true) {
            return;
        }

        let listener = self.listener.borrow_mut().take();
        if let Some(listener) = listener {
            self.env.remove_initialized(listener);
        }

        let provider = match self.lookup() {
            Ok(provider) => Some(provider),
            Err(failure) => {
                if !self.options.silent {
                    tracing::error!(target: "detect-provider", "{failure}");
                }
                None
            }
        };

        let sender = self.sender.borrow_mut().take();
        if let Some(sender) = sender {
            // the caller may have dropped the detection already
            let _ = sender.send(provider);
        }
    }

    fn lookup(&self) -> Result<E::Provider, DetectionFailure> {
        match self.env.injected_provider(&self.brand) {
            Some(provider)
                if !self.options.must_be_brand_specific || provider.is_brand(&self.brand) =>
            {
                Ok(provider)
            }
            Some(_) => Err(DetectionFailure::WrongBrand(self.brand)),
            None => Err(DetectionFailure::NotDetected(self.brand)),
        }
    }
}
