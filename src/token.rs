//! Identifier allocation for manifest nodes.
//!
//! Every node in a project manifest is addressed by a [`Token`]: 24 uppercase
//! hexadecimal characters. Derived tokens are the truncated digest of a
//! semantic key such as `FILE_Models/User.swift`, so the same key always maps
//! to the same token across runs. The [`IdAllocator`] keeps a reverse map of
//! issued tokens and reports a [`AllocError::KeyCollision`] instead of silently
//! aliasing two nodes.
//!
//! # Examples
//!
//! ```
//! use pbxgen::token::{DigestAlgorithm, IdAllocator, file_key};
//!
//! let mut ids = IdAllocator::new(DigestAlgorithm::Md5);
//! let first = ids.allocate(&file_key("Models/User.swift")).unwrap();
//! let again = ids.allocate(&file_key("Models/User.swift")).unwrap();
//! assert_eq!(first, again);
//! assert_eq!(first.as_str().len(), 24);
//! ```

use digest::Digest;
use md5::Md5;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Number of characters in a manifest token.
pub const TOKEN_WIDTH: usize = 24;

/// Fixed-width identifier used to address a node within a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Validate `raw` as a token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when `raw` is not exactly [`TOKEN_WIDTH`]
    /// uppercase hexadecimal characters.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        if raw.len() != TOKEN_WIDTH {
            return Err(TokenError::Width {
                token: raw.to_owned(),
                len: raw.len(),
            });
        }
        if let Some(ch) = raw.chars().find(|c| !is_upper_hex(*c)) {
            return Err(TokenError::Character {
                token: raw.to_owned(),
                ch,
            });
        }
        Ok(Self(raw.to_owned()))
    }

    /// Mint a run-scoped random token that is not derived from any key.
    ///
    /// Only the legacy patch strategy uses these; they are never reproducible.
    #[must_use]
    pub fn random() -> Self {
        let mut hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
        hex.truncate(TOKEN_WIDTH);
        Self(hex)
    }

    /// Borrow the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_hex(mut hex: String) -> Self {
        hex.truncate(TOKEN_WIDTH);
        Self(hex)
    }
}

const fn is_upper_hex(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, 'A'..='F')
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Token {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Token> for String {
    fn from(value: Token) -> Self {
        value.0
    }
}

/// Reasons a string is rejected as a [`Token`].
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum TokenError {
    /// The candidate has the wrong number of characters.
    #[error("token '{token}' has {len} characters, expected {TOKEN_WIDTH}")]
    #[diagnostic(code(pbxgen::token::width))]
    Width {
        /// Rejected input.
        token: String,
        /// Observed length.
        len: usize,
    },
    /// The candidate contains a character outside `0-9A-F`.
    #[error("token '{token}' contains '{ch}', expected uppercase hexadecimal")]
    #[diagnostic(code(pbxgen::token::character))]
    Character {
        /// Rejected input.
        token: String,
        /// First offending character.
        ch: char,
    },
}

/// Digest used to derive tokens from semantic keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5, matching manifests written by earlier project generators.
    #[default]
    Md5,
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Derive the token for `key`.
    #[must_use]
    pub fn token(self, key: &str) -> Token {
        match self {
            Self::Md5 => digest_token::<Md5>(key),
            Self::Sha256 => digest_token::<Sha256>(key),
        }
    }
}

fn digest_token<D: Digest>(key: &str) -> Token
where
    digest::Output<D>: fmt::UpperHex,
{
    let digest = D::digest(key.as_bytes());
    Token::from_hex(format!("{digest:X}"))
}

/// Errors raised while allocating identifiers.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum AllocError {
    /// Two distinct keys produced the same token.
    #[error("keys '{existing}' and '{incoming}' both map to token {token}")]
    #[diagnostic(
        code(pbxgen::token::key_collision),
        help("rename one of the colliding files or directories")
    )]
    KeyCollision {
        /// Token both keys map to.
        token: Token,
        /// Key that claimed the token first.
        existing: String,
        /// Key that collided with it.
        incoming: String,
    },
}

/// Maps semantic keys to tokens and remembers every token it has issued.
#[derive(Debug, Default)]
pub struct IdAllocator {
    algorithm: DigestAlgorithm,
    issued: HashMap<Token, String>,
}

impl IdAllocator {
    /// Create an allocator deriving tokens with `algorithm`.
    #[must_use]
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            issued: HashMap::new(),
        }
    }

    /// Return the token for `key`, recording it in the reverse map.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::KeyCollision`] when the derived token was already
    /// issued for a different key.
    pub fn allocate(&mut self, key: &str) -> Result<Token, AllocError> {
        self.allocate_as(key, key)
    }

    /// Return the token for `key`, recording it under `identity`.
    ///
    /// Use this when several inputs may flatten to the same key: the token
    /// is still derived from `key`, but two different identities mapping to
    /// it are reported instead of sharing one node.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::KeyCollision`] when the derived token was already
    /// issued for a different identity.
    pub fn allocate_as(&mut self, key: &str, identity: &str) -> Result<Token, AllocError> {
        let token = self.algorithm.token(key);
        self.claim(&token, identity)?;
        Ok(token)
    }

    /// Register a fixed token under `key` so derived tokens cannot alias it.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::KeyCollision`] when `token` is already claimed by
    /// another key.
    pub fn reserve(&mut self, token: &Token, key: &str) -> Result<(), AllocError> {
        self.claim(token, key)
    }

    /// Number of distinct tokens issued or reserved so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    /// Whether nothing has been issued yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    fn claim(&mut self, token: &Token, key: &str) -> Result<(), AllocError> {
        match self.issued.get(token) {
            Some(existing) if existing != key => Err(AllocError::KeyCollision {
                token: token.clone(),
                existing: existing.clone(),
                incoming: key.to_owned(),
            }),
            Some(_) => Ok(()),
            None => {
                self.issued.insert(token.clone(), key.to_owned());
                Ok(())
            }
        }
    }
}

/// Key of the file reference for the file at `path`.
#[must_use]
pub fn file_key(path: &str) -> String {
    format!("FILE_{path}")
}

/// Key of the build-phase membership for the file at `path`.
#[must_use]
pub fn build_key(path: &str) -> String {
    format!("BUILD_{path}")
}

/// Key of the group for directory `dir`.
///
/// Separators are flattened, so `A/B` and `A_B` share a key; allocate
/// groups under [`group_identity`] to detect that.
#[must_use]
pub fn group_key(dir: &str) -> String {
    format!("GROUP_{}", dir.replace('/', "_"))
}

/// Unflattened identity of the group for directory `dir`.
#[must_use]
pub fn group_identity(dir: &str) -> String {
    format!("GROUP_{dir}")
}
