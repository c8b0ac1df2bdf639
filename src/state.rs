use std::{fmt, rc::Rc};

/// Numeric identifier of the chain the provider is connected to.
///
/// Providers report chain ids as hexadecimal strings, see
/// [`ChainId::parse_hex`]. A string that does not start with hexadecimal
/// digits does not fail: it becomes [`ChainId::NotANumber`], and it is up to
/// the [`Actions`] implementation to accept or reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainId {
    Id(u64),
    NotANumber,
}

impl ChainId {
    /// base 16 parsing of the chain id as reported by the provider
    ///
    /// Follows the javascript `parseInt(chainId, 16)` rules: leading white
    /// spaces and an optional `0x` prefix are skipped, then the longest run
    /// of hexadecimal digits is read and anything after it is ignored.
    /// No digits, a negative sign or an overflow gives
    /// [`ChainId::NotANumber`].
    ///
    /// ```
    /// use bitkeep_connector::ChainId;
    ///
    /// assert_eq!(ChainId::parse_hex("0x1"), ChainId::Id(1));
    /// assert_eq!(ChainId::parse_hex("0x38"), ChainId::Id(56));
    /// assert_eq!(ChainId::parse_hex("zz"), ChainId::NotANumber);
    /// ```
    pub fn parse_hex(chain_id: &str) -> Self {
        let s = chain_id.trim_start();
        let s = match s.strip_prefix('+') {
            Some(rest) => rest,
            None if s.starts_with('-') => return Self::NotANumber,
            None => s,
        };
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        let digits = s
            .find(|c: char| !c.is_ascii_hexdigit())
            .map_or(s, |end| &s[..end]);
        if digits.is_empty() {
            return Self::NotANumber;
        }

        u64::from_str_radix(digits, 16).map_or(Self::NotANumber, Self::Id)
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::NotANumber => None,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Self::NotANumber)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<ChainId> for f64 {
    fn from(chain_id: ChainId) -> Self {
        match chain_id {
            ChainId::Id(id) => id as f64,
            ChainId::NotANumber => f64::NAN,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::NotANumber => f.write_str("NaN"),
        }
    }
}

/// Partial update of the connector state. `None` fields are left as they
/// are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub chain_id: Option<ChainId>,
    pub accounts: Option<Vec<String>>,
}

impl StateUpdate {
    pub fn chain_id(chain_id: ChainId) -> Self {
        Self {
            chain_id: Some(chain_id),
            ..Self::default()
        }
    }

    pub fn accounts(accounts: Vec<String>) -> Self {
        Self {
            accounts: Some(accounts),
            ..Self::default()
        }
    }
}

/// The state layer a connector reports to.
///
/// This is owned by the surrounding application (store, hooks, signals…),
/// the connector only ever calls into it.
pub trait Actions: 'static {
    fn update(&self, update: StateUpdate);

    /// back to the disconnected state
    fn reset_state(&self);
}

impl<A: Actions + ?Sized> Actions for Rc<A> {
    fn update(&self, update: StateUpdate) {
        (**self).update(update)
    }

    fn reset_state(&self) {
        (**self).reset_state()
    }
}
