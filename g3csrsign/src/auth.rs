/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use tonic::metadata::MetadataMap;

use crate::issue::RequestError;

/// Talos puts the machine token directly in the request metadata.
pub const TOKEN_METADATA_KEY: &str = "token";

const TOKEN_LOG_PREFIX_CHARS: usize = 8;

pub enum TokenLookup<'a> {
    NoMetadata,
    Missing,
    Found(&'a [u8]),
}

/// The side channel a request token is carried in.
pub trait TokenSource {
    fn lookup_token(&self) -> TokenLookup<'_>;
}

impl TokenSource for MetadataMap {
    fn lookup_token(&self) -> TokenLookup<'_> {
        if self.is_empty() {
            return TokenLookup::NoMetadata;
        }
        match self.get(TOKEN_METADATA_KEY) {
            Some(v) => TokenLookup::Found(v.as_bytes()),
            None => TokenLookup::Missing,
        }
    }
}

fn log_prefix(s: &str) -> &str {
    match s.char_indices().nth(TOKEN_LOG_PREFIX_CHARS) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// The shared secret token, never printed in full.
#[derive(Clone)]
pub struct SharedToken(Arc<str>);

impl SharedToken {
    pub fn new(token: String) -> Option<Self> {
        if token.is_empty() {
            None
        } else {
            Some(SharedToken(Arc::from(token)))
        }
    }

    pub fn prefix(&self) -> &str {
        log_prefix(&self.0)
    }

    pub fn matches(&self, candidate: &[u8]) -> bool {
        constant_time_eq::constant_time_eq(self.0.as_bytes(), candidate)
    }

    pub fn authenticate<S: TokenSource + ?Sized>(&self, source: &S) -> Result<(), RequestError> {
        let received = match source.lookup_token() {
            TokenLookup::NoMetadata => {
                warn!("no metadata in request");
                return Err(RequestError::MissingToken);
            }
            TokenLookup::Missing => {
                warn!("no token in metadata");
                return Err(RequestError::MissingToken);
            }
            TokenLookup::Found(v) => v,
        };

        let received_prefix = log_prefix(std::str::from_utf8(received).unwrap_or("<non-utf8>"));
        debug!("token prefix: {received_prefix}...");
        if !self.matches(received) {
            warn!(
                "invalid token received: {received_prefix}..., expected: {}...",
                self.prefix()
            );
            return Err(RequestError::InvalidToken);
        }
        debug!("token validated successfully");
        Ok(())
    }
}

impl fmt::Debug for SharedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedToken({}...)", self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::metadata::MetadataValue;

    fn token() -> SharedToken {
        SharedToken::new("abcdef.0123456789abcdef".to_string()).unwrap()
    }

    #[test]
    fn empty_token() {
        assert!(SharedToken::new(String::new()).is_none());
    }

    #[test]
    fn prefix() {
        assert_eq!(token().prefix(), "abcdef.0");
        let short = SharedToken::new("abc".to_string()).unwrap();
        assert_eq!(short.prefix(), "abc");
        let wide = SharedToken::new("ééééééééé".to_string()).unwrap();
        assert_eq!(wide.prefix(), "éééééééé");
    }

    #[test]
    fn debug_redacted() {
        let s = format!("{:?}", token());
        assert_eq!(s, "SharedToken(abcdef.0...)");
        assert!(!s.contains("0123456789abcdef"));
    }

    #[test]
    fn exact_match() {
        let t = token();
        assert!(t.matches(b"abcdef.0123456789abcdef"));
        assert!(!t.matches(b"abcdef.0123456789abcdeF"));
        assert!(!t.matches(b"abcdef.0123456789abcde"));
        assert!(!t.matches(b""));
    }

    #[test]
    fn empty_metadata() {
        let md = MetadataMap::new();
        assert!(matches!(md.lookup_token(), TokenLookup::NoMetadata));
        assert!(matches!(
            token().authenticate(&md),
            Err(RequestError::MissingToken)
        ));
    }

    #[test]
    fn missing_field() {
        let mut md = MetadataMap::new();
        md.insert("authorization", MetadataValue::from_static("abcdef.0123456789abcdef"));
        assert!(matches!(md.lookup_token(), TokenLookup::Missing));
        assert!(matches!(
            token().authenticate(&md),
            Err(RequestError::MissingToken)
        ));
    }

    #[test]
    fn wrong_token() {
        let mut md = MetadataMap::new();
        md.insert(TOKEN_METADATA_KEY, MetadataValue::from_static("wrong"));
        assert!(matches!(
            token().authenticate(&md),
            Err(RequestError::InvalidToken)
        ));
    }

    #[test]
    fn valid_token() {
        let mut md = MetadataMap::new();
        md.insert(
            TOKEN_METADATA_KEY,
            MetadataValue::from_static("abcdef.0123456789abcdef"),
        );
        token().authenticate(&md).unwrap();
    }
}
