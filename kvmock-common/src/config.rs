//! Mock configuration shared by the engine and the client handles.

/// Expectation consumption policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Only the earliest pending expectation may match the next command.
    #[default]
    Ordered,
    /// Any pending expectation with the same command name may match, earliest first.
    Unordered,
}

impl MatchMode {
    /// Maps the `in_order` flag used by the control surface to a mode.
    #[must_use]
    pub const fn from_in_order(in_order: bool) -> Self {
        if in_order { Self::Ordered } else { Self::Unordered }
    }
}

/// Construction-time settings for one mock instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConfig {
    /// Mode used right after construction and restored by every queue clear.
    pub default_mode: MatchMode,
    /// Whether commands that match nothing are appended to the unexpected-call log.
    pub record_unexpected_calls: bool,
    /// Command name of the sentinel that opens a transactional batch.
    pub tx_begin_command: String,
    /// Command name of the sentinel that closes a transactional batch.
    pub tx_end_command: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            default_mode: MatchMode::Ordered,
            record_unexpected_calls: true,
            tx_begin_command: "multi".to_owned(),
            tx_end_command: "exec".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchMode, MockConfig};
    use googletest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, MatchMode::Ordered)]
    #[case(false, MatchMode::Unordered)]
    fn in_order_flag_maps_to_mode(#[case] in_order: bool, #[case] expected: MatchMode) {
        assert_that!(MatchMode::from_in_order(in_order), eq(expected));
    }

    #[rstest]
    fn default_config_is_ordered_with_multi_exec_sentinels() {
        let config = MockConfig::default();
        assert_that!(config.default_mode, eq(MatchMode::Ordered));
        assert_that!(config.record_unexpected_calls, eq(true));
        assert_that!(config.tx_begin_command.as_str(), eq("multi"));
        assert_that!(config.tx_end_command.as_str(), eq("exec"));
    }
}
