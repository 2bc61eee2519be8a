//! Per-call codec options.

/// Options understood by readers. Codecs ignore fields they do not use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Select one correction by id from a multi-correction CDL, EDL or ALE file.
    pub correction_id: Option<String>,
}

impl ReadOptions {
    /// Selects the correction with the given id.
    pub fn with_correction_id(mut self, id: impl Into<String>) -> Self {
        self.correction_id = Some(id.into());
        self
    }
}

/// Default number of fractional digits written for table samples.
pub const DEFAULT_DECIMALS: usize = 7;

/// Options understood by writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Fractional digits written for every sample.
    pub decimals: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { decimals: DEFAULT_DECIMALS }
    }
}

impl WriteOptions {
    /// Options with the given precision.
    pub fn with_decimals(decimals: usize) -> Self {
        Self { decimals }
    }
}
