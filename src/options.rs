use crate::error::Error;
use std::time::Duration;
use wasm_bindgen::JsValue;

/// default time to wait for the provider to be injected
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Options of [`detect_provider`](crate::detect_provider).
///
/// When the options come from an untyped source (a JavaScript object or a
/// JSON document) use [`DetectOptions::from_json`] or the `TryFrom<&JsValue>`
/// implementation: every recognized key is type checked and a mismatch is
/// reported as [`Error::InvalidArgument`].
///
/// | key                                    | type    | default |
/// |----------------------------------------|---------|---------|
/// | `mustBeBrandSpecific` (`mustBeBitKeep`) | boolean | `false` |
/// | `silent`                               | boolean | `false` |
/// | `timeoutMs` (`timeout`)                | number  | `3000`  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DetectOptions {
    /// only accept a provider carrying the brand flag
    pub must_be_brand_specific: bool,
    /// do not log a diagnostic when detection fails
    pub silent: bool,
    pub timeout: Duration,
}

const MUST_BE_BRAND_SPECIFIC: &[&str] = &["mustBeBrandSpecific", "mustBeBitKeep"];
const SILENT: &[&str] = &["silent"];
const TIMEOUT: &[&str] = &["timeoutMs", "timeout"];

/// an option value as found in an untyped configuration
enum RawOption {
    Missing,
    Bool(bool),
    Number(f64),
    Other,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            must_be_brand_specific: false,
            silent: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl DetectOptions {
    pub fn with_must_be_brand_specific(self, must_be_brand_specific: bool) -> Self {
        Self {
            must_be_brand_specific,
            ..self
        }
    }

    pub fn with_silent(self, silent: bool) -> Self {
        Self { silent, ..self }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// read and validate the options from a JSON document
    ///
    /// `null` yields the default options.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, Error> {
        use serde_json::Value;

        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            _ => {
                return Err(Error::InvalidArgument {
                    option: "options",
                    expected: "object",
                });
            }
        };

        Self::from_raw(|key| match object.get(key) {
            None | Some(Value::Null) => RawOption::Missing,
            Some(Value::Bool(b)) => RawOption::Bool(*b),
            Some(Value::Number(n)) => n.as_f64().map_or(RawOption::Other, RawOption::Number),
            Some(_) => RawOption::Other,
        })
    }

    fn from_raw(lookup: impl Fn(&'static str) -> RawOption) -> Result<Self, Error> {
        // the first key set wins over its aliases
        let find = |keys: &'static [&'static str]| {
            keys.iter()
                .map(|key| (*key, lookup(*key)))
                .find(|(_, raw)| !matches!(raw, RawOption::Missing))
        };

        let mut options = Self::default();

        match find(MUST_BE_BRAND_SPECIFIC) {
            None => (),
            Some((_, RawOption::Bool(b))) => options.must_be_brand_specific = b,
            Some((option, _)) => {
                return Err(Error::InvalidArgument {
                    option,
                    expected: "boolean",
                });
            }
        }

        match find(SILENT) {
            None => (),
            Some((_, RawOption::Bool(b))) => options.silent = b,
            Some((option, _)) => {
                return Err(Error::InvalidArgument {
                    option,
                    expected: "boolean",
                });
            }
        }

        match find(TIMEOUT) {
            None => (),
            Some((_, RawOption::Number(ms))) => options.timeout = timeout_from_millis(ms),
            Some((option, _)) => {
                return Err(Error::InvalidArgument {
                    option,
                    expected: "number",
                });
            }
        }

        Ok(options)
    }
}

impl TryFrom<&JsValue> for DetectOptions {
    type Error = Error;

    fn try_from(value: &JsValue) -> Result<Self, Self::Error> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        if !value.is_object() {
            return Err(Error::InvalidArgument {
                option: "options",
                expected: "object",
            });
        }

        Self::from_raw(|key| {
            let Ok(v) = js_sys::Reflect::get(value, &JsValue::from_str(key)) else {
                return RawOption::Other;
            };
            if v.is_undefined() || v.is_null() {
                RawOption::Missing
            } else if let Some(b) = v.as_bool() {
                RawOption::Bool(b)
            } else if let Some(n) = v.as_f64() {
                RawOption::Number(n)
            } else {
                RawOption::Other
            }
        })
    }
}

/// `setTimeout` semantic: negative and NaN delays are 0, the delay is capped
/// to what a 32 bits signed integer holds.
fn timeout_from_millis(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        Duration::ZERO
    } else {
        let ms = ms.min(i32::MAX as f64);
        Duration::from_micros((ms * 1000.0) as u64)
    }
}
