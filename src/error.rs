//! Failure kinds shared by the composition and queuing pipeline.

use std::io;
use std::str::Utf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum TootError {
    #[error("address {0:?} has an invalid shape")]
    InvalidAddressShape(String),

    #[error("no account is configured for domain {0:?}")]
    UnknownDomain(String),

    #[error("the account for domain {0:?} does not define UserPrefixURI")]
    MissingPrefixConfig(String),

    #[error("{0:?} is not a valid https actor URI")]
    InvalidUri(String),

    #[error("user name {name:?} contains disallowed character {ch:?}")]
    DisallowedCharacter { name: String, ch: char },

    #[error("input is not valid UTF-8")]
    InvalidEncoding(#[from] Utf8Error),

    #[error("nothing to send, input is empty")]
    EmptyInput,

    #[error("message is already queued as {0}")]
    DuplicateMessage(String),

    #[error("outbox I/O failed")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(String),
}
