use crate::provider::Brand;

/// Errors raised synchronously, before any detection work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum Error {
    #[error("detect-provider: Expected option '{option}' to be a {expected}.")]
    InvalidArgument {
        option: &'static str,
        expected: &'static str,
    },
}

/// Why a detection resolved without a provider.
///
/// This is never returned as an error: the detector resolves to `None` and
/// only uses this value for its diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum DetectionFailure {
    #[error("Unable to detect window.{}.ethereum.", .0.namespace())]
    NotDetected(Brand),
    #[error("Non-{} window.{}.ethereum detected.", .0.name(), .0.namespace())]
    WrongBrand(Brand),
}

/// [EIP-1193] provider error codes.
///
/// [EIP-1193]: https://eips.ethereum.org/EIPS/eip-1193#provider-errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum ProviderErrorCode {
    #[error("The user rejected the request.")]
    UserRejectedRequest,
    #[error("The requested method and/or account has not been authorized by the user.")]
    Unauthorized,
    #[error("The provider does not support the requested method.")]
    UnsupportedMethod,
    #[error("The provider is disconnected from all chains.")]
    Disconnected,
    #[error("The provider is not connected to the requested chain.")]
    ChainDisconnected,
    /// The provider is re-establishing its connection. Not a real disconnect.
    #[error("Try again later.")]
    TryAgainLater,
    #[error("Unknown error code `{0}'")]
    Unknown(i64),
    /// The payload carried no usable code.
    #[error("No error code")]
    Unspecified,
}

impl ProviderErrorCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            4001 => Self::UserRejectedRequest,
            4100 => Self::Unauthorized,
            4200 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            1013 => Self::TryAgainLater,
            unknown => Self::Unknown(unknown),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Self::UserRejectedRequest => Some(4001),
            Self::Unauthorized => Some(4100),
            Self::UnsupportedMethod => Some(4200),
            Self::Disconnected => Some(4900),
            Self::ChainDisconnected => Some(4901),
            Self::TryAgainLater => Some(1013),
            Self::Unknown(code) => Some(*code),
            Self::Unspecified => None,
        }
    }

    /// whatever a provider put in the `code` property: a number, a numeric
    /// string, or anything else which yields [`ProviderErrorCode::Unspecified`]
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        let code = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        code.map_or(Self::Unspecified, Self::from_code)
    }

    /// `true` for the code the provider emits while it reconnects on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TryAgainLater)
    }
}

/// The error object carried by a provider `disconnect` event.
///
/// Decoding never rejects an object: a missing or malformed `code` becomes
/// [`ProviderErrorCode::Unspecified`] and a non string `message` is kept
/// as its JSON text. A disconnect always has to reach the state layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Deserialize)]
#[serde(from = "RawProviderRpcError")]
#[error("{message} ({code})")]
pub struct ProviderRpcError {
    pub code: ProviderErrorCode,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

#[derive(serde::Deserialize)]
struct RawProviderRpcError {
    #[serde(default)]
    code: serde_json::Value,
    #[serde(default)]
    message: serde_json::Value,
    #[serde(default)]
    data: serde_json::Value,
}

impl From<RawProviderRpcError> for ProviderRpcError {
    fn from(raw: RawProviderRpcError) -> Self {
        use serde_json::Value;

        let message = match raw.message {
            Value::Null => String::new(),
            Value::String(message) => message,
            other => other.to_string(),
        };
        let data = match raw.data {
            Value::Null => None,
            data => Some(data),
        };

        Self {
            code: ProviderErrorCode::from_json(&raw.code),
            message,
            data,
        }
    }
}

impl ProviderRpcError {
    /// a disconnect whose payload could not be read at all
    pub fn unspecified(message: impl Into<String>) -> Self {
        Self {
            code: ProviderErrorCode::Unspecified,
            message: message.into(),
            data: None,
        }
    }
}

impl<'de> serde::Deserialize<'de> for ProviderErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = ProviderErrorCode;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "Expecting an integer ProviderErrorCode")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ProviderErrorCode::from_code(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(v)
                    .map(ProviderErrorCode::from_code)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Unsigned(v), &self))
            }

            // javascript numbers may reach us as floats
            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                    Ok(ProviderErrorCode::from_code(v as i64))
                } else {
                    Err(E::invalid_value(serde::de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_i64(Visitor)
    }
}
