/// Validator configuration.
#[derive(Clone, Debug, PartialEq, Eq, derivative::Derivative)]
#[derivative(Default)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Number of shards of the per-resource lock table.
    #[derivative(Default(value = "16"))]
    pub shard_count: usize,

    /// Log every finding before returning it.
    #[derivative(Default(value = "true"))]
    pub log_hazards: bool,

    /// Report conflicts between queues with the racing rule identifiers.
    pub racing_rule_ids: bool,

    /// Maximum number of findings returned by one call.
    /// Findings past the limit are logged and counted.
    pub max_hazards_per_call: Option<usize>,
}

impl Config {
    /// Config with the number of lock shards.
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count.max(1);
        self
    }

    /// Config reporting cross-queue conflicts as races.
    pub fn with_racing_rule_ids(mut self, racing_rule_ids: bool) -> Self {
        self.racing_rule_ids = racing_rule_ids;
        self
    }

    /// Config with findings logged or not.
    pub fn with_log_hazards(mut self, log_hazards: bool) -> Self {
        self.log_hazards = log_hazards;
        self
    }

    /// Config with a limit of findings per call.
    pub fn with_max_hazards_per_call(mut self, max: usize) -> Self {
        self.max_hazards_per_call = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.shard_count, 16);
        assert!(config.log_hazards);
        assert!(!config.racing_rule_ids);
        assert_eq!(config.max_hazards_per_call, None);
        assert_eq!(Config::default().with_shard_count(0).shard_count, 1);
    }
}
