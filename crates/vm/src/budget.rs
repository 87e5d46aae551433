//! The shared instruction budget.

/// Counts instructions executed across every frame of one evaluation.
#[derive(Debug, Clone)]
pub struct Budget {
    limit: u32,
    executed: u32,
}

impl Budget {
    pub fn new(limit: u32) -> Self {
        Self { limit, executed: 0 }
    }

    /// Charge one instruction. Returns false, without charging, once the
    /// limit has been reached.
    pub fn consume(&mut self) -> bool {
        if self.executed >= self.limit {
            return false;
        }
        self.executed += 1;
        true
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Instructions charged so far. Strictly increasing, so it doubles as
    /// a logical clock for the interpreter.
    pub fn executed(&self) -> u32 {
        self.executed
    }

    pub fn remaining(&self) -> u32 {
        self.limit - self.executed
    }
}
