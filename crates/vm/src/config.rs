//! Evaluator configuration.

/// Instruction ceiling used when nothing else is configured.
pub const DEFAULT_INSTRUCTION_LIMIT: u32 = 512;

/// Tunables for one evaluation.
///
/// The instruction limit is shared by the whole call tree of an assertion
/// and is the only timeout the evaluator has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    pub instruction_limit: u32,
}

impl EvalConfig {
    pub fn with_instruction_limit(mut self, limit: u32) -> Self {
        self.instruction_limit = limit;
        self
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            instruction_limit: DEFAULT_INSTRUCTION_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_is_512() {
        assert_eq!(EvalConfig::default().instruction_limit, 512);
    }

    #[test]
    fn builder_overrides_limit() {
        let config = EvalConfig::default().with_instruction_limit(20);
        assert_eq!(config.instruction_limit, 20);
    }
}
