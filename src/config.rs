use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::TootError;

/// Default per-message code point limit, matching the common Fediverse cap.
pub(crate) const DEFAULT_NOTE_LENGTH: usize = 500;

const ACTIVE_ACCOUNT: &str = "default";
const GLOBAL_SECTION: &str = "global";

/// One named account section from the config file. All keys are optional in
/// the file; accessors report what a command actually needs.
#[derive(Clone, Default, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Account {
    #[serde(rename = "User")]
    pub(crate) user: Option<String>,
    #[serde(rename = "UserPrefixURI")]
    pub(crate) user_prefix_uri: Option<String>,
    #[serde(rename = "Domain")]
    pub(crate) domain: Option<String>,
    #[serde(rename = "Inbox")]
    pub(crate) inbox: Option<String>,
    #[serde(rename = "Outbox")]
    pub(crate) outbox: Option<PathBuf>,
    #[serde(rename = "MaxNoteLength")]
    pub(crate) max_note_length: Option<usize>,
}

impl Account {
    /// Canonical URI of this account's user, used as `attributedTo` / `actor`.
    pub(crate) fn author_iri(&self) -> Result<String, TootError> {
        let prefix = self
            .user_prefix_uri
            .as_deref()
            .ok_or_else(|| TootError::Config("account does not define UserPrefixURI".into()))?;
        let user = self
            .user
            .as_deref()
            .ok_or_else(|| TootError::Config("account does not define User".into()))?;
        Ok(format!("{prefix}{user}"))
    }

    pub(crate) fn outbox_dir(&self) -> Result<&Path, TootError> {
        self.outbox
            .as_deref()
            .ok_or_else(|| TootError::Config("account does not define Outbox".into()))
    }

    /// Segment limit for this account. Always positive: `Config::parse`
    /// rejects a zero `MaxNoteLength`.
    pub(crate) fn note_length(&self) -> usize {
        self.max_note_length.unwrap_or(DEFAULT_NOTE_LENGTH)
    }
}

/// Immutable account table, built once at startup and passed explicitly to
/// the resolver and the command handlers.
#[derive(Clone, Default, Debug)]
pub(crate) struct Config {
    accounts: BTreeMap<String, Account>,
}

impl Config {
    pub(crate) fn load(path: &Path) -> Result<Config, TootError> {
        let text = fs::read_to_string(path)
            .map_err(|err| TootError::Config(format!("cannot read {}: {err}", path.display())))?;
        Config::parse(&text)
    }

    /// Parse the TOML account table. The `global` section is not an account;
    /// its keys become defaults for every account that leaves them unset.
    pub(crate) fn parse(text: &str) -> Result<Config, TootError> {
        let mut accounts: BTreeMap<String, Account> =
            toml::from_str(text).map_err(|err| TootError::Config(err.to_string()))?;
        if let Some(global) = accounts.remove(GLOBAL_SECTION) {
            for account in accounts.values_mut() {
                merge_defaults(account, &global);
            }
        }
        for (name, account) in &accounts {
            if account.max_note_length == Some(0) {
                return Err(TootError::Config(format!(
                    "account {name:?}: MaxNoteLength must be positive"
                )));
            }
        }
        Ok(Config { accounts })
    }

    /// The account this invocation acts as.
    pub(crate) fn active(&self) -> Result<&Account, TootError> {
        self.accounts
            .get(ACTIVE_ACCOUNT)
            .ok_or_else(|| TootError::Config(format!("no {ACTIVE_ACCOUNT:?} account configured")))
    }

    pub(crate) fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    #[cfg(test)]
    pub(crate) fn with_accounts(accounts: BTreeMap<String, Account>) -> Config {
        Config { accounts }
    }
}

fn merge_defaults(account: &mut Account, global: &Account) {
    if account.user.is_none() {
        account.user = global.user.clone();
    }
    if account.user_prefix_uri.is_none() {
        account.user_prefix_uri = global.user_prefix_uri.clone();
    }
    if account.domain.is_none() {
        account.domain = global.domain.clone();
    }
    if account.inbox.is_none() {
        account.inbox = global.inbox.clone();
    }
    if account.outbox.is_none() {
        account.outbox = global.outbox.clone();
    }
    if account.max_note_length.is_none() {
        account.max_note_length = global.max_note_length;
    }
}
