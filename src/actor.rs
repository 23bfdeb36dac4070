//! Recipient identifier resolution.
//!
//! A recipient can be given as a bare local user name, as a `user@domain`
//! address, or as an absolute `https` URI. Everything that reaches the
//! composer is a canonical absolute URI.

use tracing::{debug, warn};
use url::Url;

use crate::config::{Account, Config};
use crate::error::TootError;

/// Characters never allowed in a user name or address.
const DISALLOWED_CHARS: &str = "`!#$%&*<>,?\\|[]{}'\";";

const MAX_ADDRESS_LEN: usize = 255;

/// Shape check for `user@domain` addresses, in the spirit of RFC 822.
/// A pure predicate so a stricter validator can replace it without
/// touching the resolver.
#[derive(Clone, Copy, Default)]
pub(crate) struct AddressValidator;

impl AddressValidator {
    /// Validate an `@`-form address and split it into `(user, domain)`.
    pub(crate) fn split_address<'t>(
        &self,
        token: &'t str,
    ) -> Result<(&'t str, &'t str), TootError> {
        let invalid = || TootError::InvalidAddressShape(token.to_string());

        if token.chars().count() > MAX_ADDRESS_LEN {
            return Err(invalid());
        }
        if token.chars().any(|ch| DISALLOWED_CHARS.contains(ch)) {
            return Err(invalid());
        }
        if token.matches('@').count() != 1 {
            return Err(invalid());
        }
        let (user, domain) = token.split_once('@').expect("token has one @");
        if user.chars().count() + domain.chars().count() < 2 {
            return Err(invalid());
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(invalid());
        }
        Ok((user, domain))
    }

    /// Check a bare local user name for disallowed characters.
    pub(crate) fn check_user(&self, name: &str) -> Result<(), TootError> {
        if let Some(ch) = name.chars().find(|ch| DISALLOWED_CHARS.contains(*ch)) {
            return Err(TootError::DisallowedCharacter {
                name: name.to_string(),
                ch,
            });
        }
        Ok(())
    }
}

/// Turns raw recipient tokens into canonical actor URIs against an account
/// table fixed at startup. Pure apart from logging.
pub(crate) struct ActorResolver<'a> {
    config: &'a Config,
    active: &'a Account,
    validator: AddressValidator,
}

impl<'a> ActorResolver<'a> {
    pub(crate) fn new(config: &'a Config) -> Result<ActorResolver<'a>, TootError> {
        Ok(ActorResolver {
            config,
            active: config.active()?,
            validator: AddressValidator,
        })
    }

    /// Resolve one trimmed token into an absolute `https` actor URI.
    pub(crate) fn resolve(&self, token: &str) -> Result<String, TootError> {
        if token.contains('@') {
            let (user, domain) = self.validator.split_address(token)?;
            return self.resolve_remote(token, user, domain);
        }
        if token.contains("://") {
            return self.check_uri(token);
        }
        self.validator.check_user(token)?;
        let prefix = self.active.user_prefix_uri.as_deref().ok_or_else(|| {
            TootError::Config("active account does not define UserPrefixURI".into())
        })?;
        Ok(format!("{prefix}{token}"))
    }

    /// `user@domain` resolves through the account configured for that
    /// domain. Every account is scanned before giving up on the domain.
    fn resolve_remote(&self, token: &str, user: &str, domain: &str) -> Result<String, TootError> {
        let account = self
            .config
            .accounts()
            .find(|account| account.domain.as_deref() == Some(domain));
        let Some(account) = account else {
            return Err(TootError::UnknownDomain(domain.to_string()));
        };
        let Some(prefix) = account.user_prefix_uri.as_deref() else {
            return Err(TootError::MissingPrefixConfig(domain.to_string()));
        };
        let iri = format!("{prefix}{user}");
        debug!(token, %iri, "resolved address");
        Ok(iri)
    }

    fn check_uri(&self, token: &str) -> Result<String, TootError> {
        let uri =
            Url::parse(token).map_err(|_| TootError::InvalidUri(token.to_string()))?;
        if uri.scheme() != "https" || uri.host_str().is_none_or(str::is_empty) {
            return Err(TootError::InvalidUri(token.to_string()));
        }
        Ok(token.to_string())
    }

    /// Resolve a comma separated recipient list. Tokens are trimmed, empty
    /// tokens are skipped, and tokens that fail to resolve are logged and
    /// dropped. An empty result is the caller's hard failure to raise.
    pub(crate) fn resolve_all(&self, list: &str) -> Vec<String> {
        let mut resolved = Vec::new();
        for token in list.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match self.resolve(token) {
                Ok(iri) => resolved.push(iri),
                Err(err) => warn!(token, %err, "dropping unresolvable recipient"),
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::Result;

    use crate::config::{Account, Config};
    use crate::error::TootError;

    use super::{ActorResolver, AddressValidator};

    fn test_config() -> Config {
        let mut accounts = BTreeMap::new();
        accounts.insert(
            "default".to_string(),
            Account {
                user: Some("self".to_string()),
                user_prefix_uri: Some("https://home.example/users/".to_string()),
                domain: Some("home.example".to_string()),
                ..Account::default()
            },
        );
        accounts.insert(
            "known".to_string(),
            Account {
                user_prefix_uri: Some("https://known.example/users/".to_string()),
                domain: Some("known.example".to_string()),
                ..Account::default()
            },
        );
        accounts.insert(
            "bare".to_string(),
            Account {
                domain: Some("bare.example".to_string()),
                ..Account::default()
            },
        );
        Config::with_accounts(accounts)
    }

    #[test]
    fn bare_user_gets_active_account_prefix() -> Result<()> {
        let config = test_config();
        let resolver = ActorResolver::new(&config)?;
        assert_eq!(resolver.resolve("alice")?, "https://home.example/users/alice");
        Ok(())
    }

    #[test]
    fn bare_user_with_disallowed_character_is_rejected() -> Result<()> {
        let config = test_config();
        let resolver = ActorResolver::new(&config)?;
        assert!(matches!(
            resolver.resolve("ali;ce"),
            Err(TootError::DisallowedCharacter { ch: ';', .. })
        ));
        Ok(())
    }

    #[test]
    fn address_resolves_through_matching_domain_account() -> Result<()> {
        let config = test_config();
        let resolver = ActorResolver::new(&config)?;
        // "known" sorts after "bare" and "default"; all accounts must be
        // scanned, not just the first one.
        assert_eq!(
            resolver.resolve("alice@known.example")?,
            "https://known.example/users/alice"
        );
        Ok(())
    }

    #[test]
    fn unknown_domain_fails() -> Result<()> {
        let config = test_config();
        let resolver = ActorResolver::new(&config)?;
        assert!(matches!(
            resolver.resolve("bob@elsewhere.example"),
            Err(TootError::UnknownDomain(domain)) if domain == "elsewhere.example"
        ));
        Ok(())
    }

    #[test]
    fn domain_without_prefix_config_fails() -> Result<()> {
        let config = test_config();
        let resolver = ActorResolver::new(&config)?;
        assert!(matches!(
            resolver.resolve("bob@bare.example"),
            Err(TootError::MissingPrefixConfig(domain)) if domain == "bare.example"
        ));
        Ok(())
    }

    #[test]
    fn two_at_signs_are_an_invalid_shape() -> Result<()> {
        let config = test_config();
        let resolver = ActorResolver::new(&config)?;
        assert!(matches!(
            resolver.resolve("@alice@known.example"),
            Err(TootError::InvalidAddressShape(_))
        ));
        Ok(())
    }

    #[test]
    fn https_uri_passes_through_unchanged() -> Result<()> {
        let config = test_config();
        let resolver = ActorResolver::new(&config)?;
        assert_eq!(
            resolver.resolve("https://other.example/users/carol")?,
            "https://other.example/users/carol"
        );
        Ok(())
    }

    #[test]
    fn non_https_uri_is_rejected() -> Result<()> {
        let config = test_config();
        let resolver = ActorResolver::new(&config)?;
        assert!(matches!(
            resolver.resolve("http://other.example/users/carol"),
            Err(TootError::InvalidUri(_))
        ));
        assert!(matches!(
            resolver.resolve("not a uri ://"),
            Err(TootError::InvalidUri(_))
        ));
        Ok(())
    }

    #[test]
    fn resolve_all_drops_bad_tokens() -> Result<()> {
        let config = test_config();
        let resolver = ActorResolver::new(&config)?;
        let resolved = resolver.resolve_all("alice@known.example, @bad, ");
        assert_eq!(resolved, vec!["https://known.example/users/alice"]);
        Ok(())
    }

    #[test]
    fn address_shape_rules() {
        let validator = AddressValidator;
        assert_eq!(
            validator.split_address("alice@known.example").unwrap(),
            ("alice", "known.example")
        );
        // domain needs a dot and non-empty labels
        assert!(validator.split_address("@bad").is_err());
        assert!(validator.split_address("alice@nodot").is_err());
        assert!(validator.split_address("alice@dot.").is_err());
        assert!(validator.split_address("alice@.example").is_err());
        // disallowed characters anywhere in the address
        assert!(validator.split_address("al[ce@known.example").is_err());
        // total length cap
        let long = format!("{}@known.example", "a".repeat(255));
        assert!(validator.split_address(&long).is_err());
    }
}
