//! Token stream describing how to rebuild a target snapshot from a base.

/// Token describing one step of target reconstruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeltaToken {
    /// Literal byte payload appended to the output.
    Literal(Vec<u8>),
    /// Reference to a block of the base snapshot.
    Copy {
        /// Zero-based block index in the base.
        index: u64,
        /// Number of bytes copied starting at the block's offset.
        len: u32,
    },
}

impl DeltaToken {
    /// Returns the number of bytes contributed by this token.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        match self {
            Self::Literal(bytes) => bytes.len() as u64,
            Self::Copy { len, .. } => u64::from(*len),
        }
    }
}

/// Ordered collection of [`DeltaToken`] values that rebuild a target.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeltaScript {
    tokens: Vec<DeltaToken>,
    total_bytes: u64,
    literal_bytes: u64,
}

impl DeltaScript {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a token, merging adjacent literals.
    pub fn push(&mut self, token: DeltaToken) {
        let len = token.byte_len();
        if len == 0 {
            return;
        }
        self.total_bytes += len;
        match token {
            DeltaToken::Literal(bytes) => {
                self.literal_bytes += len;
                if let Some(DeltaToken::Literal(tail)) = self.tokens.last_mut() {
                    tail.extend_from_slice(&bytes);
                } else {
                    self.tokens.push(DeltaToken::Literal(bytes));
                }
            }
            copy @ DeltaToken::Copy { .. } => self.tokens.push(copy),
        }
    }

    /// Returns the underlying token stream.
    #[must_use]
    pub fn tokens(&self) -> &[DeltaToken] {
        &self.tokens
    }

    /// Returns the total number of bytes described by the script.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Returns the number of bytes emitted as literals.
    #[must_use]
    pub const fn literal_bytes(&self) -> u64 {
        self.literal_bytes
    }

    /// Returns the number of bytes copied from the base.
    #[must_use]
    pub const fn copy_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.literal_bytes)
    }

    /// Returns `true` when the script does not contain any tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl FromIterator<DeltaToken> for DeltaScript {
    fn from_iter<I: IntoIterator<Item = DeltaToken>>(iter: I) -> Self {
        let mut script = Self::new();
        for token in iter {
            script.push(token);
        }
        script
    }
}
