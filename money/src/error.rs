/// Errors raised by monetary arithmetic and ingestion.
///
/// `CurrencyMismatch` is a programmer error: two amounts with different
/// explicit currencies should never meet in the same sum.
#[derive(Debug, thiserror::Error)]
pub enum MoneyError {
    #[error("currency mismatch in {op}: {left} vs {right}")]
    CurrencyMismatch {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("not a monetary value: {0}")]
    NotMonetary(String),
    #[error("amount is not a finite number: {0}")]
    NonFinite(f64),
    #[error("amount overflows the subunit range")]
    Overflow,
    #[error("cannot divide by a zero amount")]
    ZeroDivisor,
    #[error("unsupported locale: {0}")]
    UnknownLocale(String),
    #[error("malformed monetary payload: {0}")]
    InvalidWire(#[from] serde_json::Error),
}

impl MoneyError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CurrencyMismatch { .. } => "E_CURRENCY_MISMATCH",
            Self::NotMonetary(_) => "E_NOT_MONETARY",
            Self::NonFinite(_) => "E_NON_FINITE",
            Self::Overflow => "E_OVERFLOW",
            Self::ZeroDivisor => "E_ZERO_DIVISOR",
            Self::UnknownLocale(_) => "E_UNKNOWN_LOCALE",
            Self::InvalidWire(_) => "E_INVALID_WIRE",
        }
    }
}
