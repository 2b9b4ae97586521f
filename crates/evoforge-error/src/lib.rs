//! Error taxonomy for the evoforge genetic programming engine.
//!
//! The kinds here mirror the abstract error taxonomy of the system: a
//! malformed [`Language`](https://docs.rs/evoforge-lang) is fatal at
//! construction, a variation operator that cannot find a type-compatible
//! link recovers locally by leaving the genome untouched, and a broken
//! invariant inside the compiler is treated as a defensive assertion.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

pub type Result<T> = std::result::Result<T, EvoError>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidLanguage,
    NoTypedNode,
    NoCompatibleOutput,
    Compile,
    Fitness,
    Io,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Cow<'static, str>>> From<T> for ErrString {
    fn from(v: T) -> Self {
        Self(v.into())
    }
}

/// Abstract error kinds, per the system's error handling design:
/// [`EvoError::InvalidLanguage`] and [`EvoError::NoCompatibleOutput`] (at
/// construction) and [`EvoError::Compile`] are fatal; [`EvoError::NoTypedNode`]
/// and [`EvoError::NoCompatibleOutput`] (during mutation) are recovered
/// locally by the caller, which leaves the genome unchanged; [`EvoError::Fitness`]
/// is surfaced, never masked, by the population driver; [`EvoError::Io`] is
/// logged and swallowed by the snapshot writer.
#[derive(Debug)]
pub enum EvoError {
    InvalidLanguage { message: ErrString },
    NoTypedNode { message: ErrString },
    NoCompatibleOutput { message: ErrString },
    Compile { message: ErrString },
    Fitness { message: ErrString },
    Io { message: ErrString },
    Context {
        context: ErrorContext,
        source: Box<EvoError>,
        #[cfg(feature = "backtrace")]
        backtrace: Backtrace,
    },
}

impl EvoError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidLanguage { .. } => ErrorCode::InvalidLanguage,
            Self::NoTypedNode { .. } => ErrorCode::NoTypedNode,
            Self::NoCompatibleOutput { .. } => ErrorCode::NoCompatibleOutput,
            Self::Compile { .. } => ErrorCode::Compile,
            Self::Fitness { .. } => ErrorCode::Fitness,
            Self::Io { .. } => ErrorCode::Io,
            Self::Context { .. } => ErrorCode::Context,
        }
    }

    pub fn with_context(self, msg: impl Into<String>) -> Self {
        EvoError::Context {
            context: ErrorContext::new(msg),
            source: Box::new(self),
            #[cfg(feature = "backtrace")]
            backtrace: Backtrace::capture(),
        }
    }

    /// True for the kinds a variation operator recovers from by returning
    /// the genome unchanged, rather than propagating.
    pub fn is_recoverable_in_variation(&self) -> bool {
        matches!(
            self,
            Self::NoTypedNode { .. } | Self::NoCompatibleOutput { .. }
        )
    }
}

impl Display for EvoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLanguage { message } => write!(f, "invalid language: {}", message),
            Self::NoTypedNode { message } => write!(f, "no typed node: {}", message),
            Self::NoCompatibleOutput { message } => write!(f, "no compatible output: {}", message),
            Self::Compile { message } => write!(f, "compile error: {}", message),
            Self::Fitness { message } => write!(f, "fitness error: {}", message),
            Self::Io { message } => write!(f, "io error: {}", message),
            Self::Context { context, source, .. } => write!(f, "{}\ncaused by: {}", context, source),
        }
    }
}

impl std::error::Error for EvoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Context { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ErrorContext {
    message: String,
}

impl ErrorContext {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { message: msg.into() }
    }
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorContext {}

pub trait ResultExt<T> {
    fn context(self, msg: impl Into<String>) -> Result<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<EvoError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[doc(hidden)]
pub mod __private {
    #[inline]
    #[cold]
    #[must_use]
    pub fn must_use<E>(e: E) -> E {
        e
    }
}

#[macro_export]
macro_rules! evo_err {
    (InvalidLanguage: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::EvoError::InvalidLanguage { message: format!($fmt, $($arg),*).into() })
    };
    (NoTypedNode: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::EvoError::NoTypedNode { message: format!($fmt, $($arg),*).into() })
    };
    (NoCompatibleOutput: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::EvoError::NoCompatibleOutput { message: format!($fmt, $($arg),*).into() })
    };
    (Compile: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::EvoError::Compile { message: format!($fmt, $($arg),*).into() })
    };
    (Fitness: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::EvoError::Fitness { message: format!($fmt, $($arg),*).into() })
    };
    (Io: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::EvoError::Io { message: format!($fmt, $($arg),*).into() })
    };
}

#[macro_export]
macro_rules! evo_bail {
    ($($tt:tt)+) => { return Err($crate::evo_err!($($tt)+)) };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($tt:tt)+) => {
        if !$cond { $crate::evo_bail!($($tt)+); }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_matches_variant() {
        let e = evo_err!(NoTypedNode: "no candidate for {}", "float");
        assert_eq!(e.code(), ErrorCode::NoTypedNode);
        assert!(e.is_recoverable_in_variation());
    }

    #[test]
    fn context_chains_display() {
        let e = evo_err!(Compile: "bad arity").with_context("while compiling genome 3");
        let msg = e.to_string();
        assert!(msg.contains("while compiling genome 3"));
        assert!(msg.contains("bad arity"));
    }

    #[test]
    fn compile_errors_are_not_recoverable() {
        let e = evo_err!(Compile: "broken invariant");
        assert!(!e.is_recoverable_in_variation());
    }
}
