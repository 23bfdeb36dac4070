mod actor;
mod compose;
mod config;
mod error;
mod outbox;
mod segment;

use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::actor::ActorResolver;
use crate::compose::ActivityObject;
use crate::config::Config;
use crate::error::TootError;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Compose ActivityPub messages and queue them for delivery.
        cmd tootc {
            /// Alternate config file
            optional -c, --config path: PathBuf

            /// Queue a public note read from standard input
            cmd post {}

            /// Queue a direct note read from standard input
            cmd dm {
                /// Comma separated recipient list
                required -t, --to to: String
            }

            /// Queue a reply read from standard input
            cmd reply {
                /// Author of the post being replied to
                required -t, --to to: String
                /// URI of the post being replied to
                required -i, --in-reply-to iri: String
            }

            /// Queue a like
            cmd like {
                /// Author of the post being liked
                required -t, --to to: String
                /// URI of the post being liked
                required -o, --object iri: String
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let flags = flags::Tootc::from_env_or_exit();
    let config_path = match flags.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)?;

    match flags.subcommand {
        flags::TootcCmd::Post(_) => post(&config, &read_stdin()?),
        flags::TootcCmd::Dm(dm) => direct(&config, &dm.to, &read_stdin()?),
        flags::TootcCmd::Reply(reply) => {
            let text = read_stdin()?;
            reply_to(&config, &reply.to, &reply.in_reply_to, &text)
        }
        flags::TootcCmd::Like(like) => like_post(&config, &like.to, &like.object),
    }
}

fn default_config_path() -> Result<PathBuf> {
    let home = env::var_os("HOME").context("HOME is not set and --config was not given")?;
    Ok(PathBuf::from(home).join(".config/tootc/config.toml"))
}

/// One-shot buffered read of the piped message text.
fn read_stdin() -> Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("message text must be piped on standard input");
    }
    let mut raw = Vec::new();
    stdin.read_to_end(&mut raw).map_err(TootError::from)?;
    Ok(message_text(raw)?)
}

/// Decode raw input and trim a single trailing newline. Input with no
/// visible content left is a hard failure, the segmenter never sees it.
fn message_text(raw: Vec<u8>) -> Result<String, TootError> {
    let mut text = String::from_utf8(raw)
        .map_err(|err| TootError::InvalidEncoding(err.utf8_error()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    if text.trim().is_empty() {
        return Err(TootError::EmptyInput);
    }
    Ok(text)
}

fn post(config: &Config, text: &str) -> Result<()> {
    let account = config.active()?;
    let author = account.author_iri()?;
    let outbox_dir = account.outbox_dir()?;
    for part in segment::segment(text, account.note_length()) {
        queue(&ActivityObject::note(part, &author), outbox_dir)?;
    }
    Ok(())
}

fn direct(config: &Config, recipients: &str, text: &str) -> Result<()> {
    let account = config.active()?;
    let resolver = ActorResolver::new(config)?;
    let to = resolver.resolve_all(recipients);
    if to.is_empty() {
        bail!("none of the recipients in {recipients:?} could be resolved");
    }
    let author = account.author_iri()?;
    let outbox_dir = account.outbox_dir()?;
    for part in segment::segment(text, account.note_length()) {
        queue(&ActivityObject::direct_note(part, &author, &to), outbox_dir)?;
    }
    Ok(())
}

fn reply_to(config: &Config, recipient: &str, in_reply_to: &str, text: &str) -> Result<()> {
    let account = config.active()?;
    let resolver = ActorResolver::new(config)?;
    let to = resolver.resolve(recipient.trim())?;
    let author = account.author_iri()?;
    let outbox_dir = account.outbox_dir()?;
    for part in segment::segment(text, account.note_length()) {
        queue(
            &ActivityObject::reply(part, &author, &to, in_reply_to),
            outbox_dir,
        )?;
    }
    Ok(())
}

fn like_post(config: &Config, recipient: &str, object: &str) -> Result<()> {
    let account = config.active()?;
    let resolver = ActorResolver::new(config)?;
    let to = resolver.resolve(recipient.trim())?;
    let author = account.author_iri()?;
    queue(&ActivityObject::like(&author, &to, object), account.outbox_dir()?)
}

fn queue(object: &ActivityObject, outbox_dir: &Path) -> Result<()> {
    let entry = outbox::enqueue(&object.to_bytes()?, outbox_dir)?;
    info!(path = %entry.path.display(), "queued message");
    Ok(())
}
