//! Process-wide selection of the optional detector implementations.
//!
//! Each capability (dialect sniffing, binary classification, statistical
//! encoding guessing) has a built-in baseline and an optional upgrade enabled by
//! a cargo feature. The choice is probed once, on first use, and stays fixed for
//! the life of the process.

use std::fmt;
use std::sync::LazyLock;

use crate::binary::{AllowSetClassifier, BinaryClassifier};
use crate::dialect::StrategyKind;
use crate::encoding::EncodingGuesser;
use crate::simple::SimpleStrategy;
use crate::sniffer::DialectStrategy;

static RESOLVED: LazyLock<Capabilities> = LazyLock::new(Capabilities::probe);

/// The implementations backing each optional capability.
#[derive(Clone, Copy)]
pub struct Capabilities {
    /// Strategy used to infer delimiter, quote and header presence.
    pub dialect_strategy: &'static dyn DialectStrategy,
    /// Classifier deciding whether a buffer is binary.
    pub binary_classifier: &'static dyn BinaryClassifier,
    /// Statistical encoding guesser, if one is available.
    pub encoding_guesser: Option<&'static dyn EncodingGuesser>,
}

impl Capabilities {
    /// The capabilities resolved for this process.
    pub fn resolved() -> &'static Capabilities {
        &RESOLVED
    }

    /// Built-in implementations only, regardless of enabled features.
    pub fn baseline() -> Capabilities {
        Capabilities {
            dialect_strategy: &SimpleStrategy,
            binary_classifier: &AllowSetClassifier,
            encoding_guesser: None,
        }
    }

    /// Pick the best implementation compiled into this build.
    #[allow(unused_mut)]
    fn probe() -> Capabilities {
        let mut caps = Capabilities::baseline();

        #[cfg(feature = "tum")]
        {
            caps.dialect_strategy = &crate::tum::TumStrategy;
        }
        #[cfg(feature = "heuristic-binary")]
        {
            caps.binary_classifier = &crate::binary::HeuristicClassifier;
        }
        #[cfg(feature = "chardet")]
        {
            caps.encoding_guesser = Some(&crate::encoding::ChardetGuesser);
        }

        tracing::debug!(capabilities = ?caps, "resolved detector capabilities");
        caps
    }

    /// Which dialect strategy these capabilities use.
    pub fn strategy_kind(&self) -> StrategyKind {
        self.dialect_strategy.kind()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        *Capabilities::resolved()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("dialect_strategy", &self.dialect_strategy.kind())
            .field("binary_classifier", &self.binary_classifier.name())
            .field(
                "encoding_guesser",
                &self.encoding_guesser.map(|g| g.name()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline() {
        let caps = Capabilities::baseline();
        assert_eq!(caps.strategy_kind(), StrategyKind::Simple);
        assert_eq!(caps.binary_classifier.name(), "allow-set");
        assert!(caps.encoding_guesser.is_none());
    }

    #[test]
    fn test_resolved_is_stable() {
        let first = Capabilities::resolved();
        let second = Capabilities::resolved();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.strategy_kind(), second.strategy_kind());
    }

    #[cfg(all(feature = "tum", feature = "chardet", feature = "heuristic-binary"))]
    #[test]
    fn test_resolved_prefers_upgrades() {
        let caps = Capabilities::resolved();
        assert_eq!(caps.strategy_kind(), StrategyKind::Advanced);
        assert_eq!(caps.binary_classifier.name(), "heuristic");
        assert_eq!(caps.encoding_guesser.map(|g| g.name()), Some("chardetng"));
    }
}
