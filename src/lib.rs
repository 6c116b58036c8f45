//! chiavi: account identity and credential recovery.
//!
//! The engine resolves a partial, schema-described identity into a canonical
//! account id, verifies credentials against a per-field policy, keeps account
//! data in sync across access-level partitions, and signs time-bounded
//! recovery tokens. [`api`] embeds the engine behind `/v1/auth` endpoints;
//! [`cli`] wires configuration and telemetry around it.

pub mod account;
pub mod api;
pub mod cli;
pub mod schema;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
