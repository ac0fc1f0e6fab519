//! Actor resolution for helpdesk commands.
//!
//! Every human action is audited under the name of whoever performed it.
//! Rather than requiring `--as` on every invocation, the actor is resolved
//! through a chain:
//!
//! 1. `--as <actor>`: explicit per-command override
//! 2. `HELPDESK_ACTOR` env var: process/session level
//! 3. `actor` in `~/.helpdesk/config.toml`: global default
//!
//! `system` is reserved for triage and cannot be claimed by a person.

use std::env;

use crate::config::Config;
use crate::model::SYSTEM_ACTOR;

/// Error message shown when no actor can be resolved.
pub const ACTOR_REQUIRED: &str = "actor required: pass --as <actor>, \
    set HELPDESK_ACTOR, or add `actor = \"...\"` to ~/.helpdesk/config.toml";

/// Resolve the acting user from the tiered resolution chain.
pub fn resolve_actor(explicit: Option<&str>, config: &Config) -> Result<String, String> {
    let from_env = env::var("HELPDESK_ACTOR").ok();
    resolve_from(explicit, from_env.as_deref(), config.actor.as_deref())
}

fn resolve_from(
    explicit: Option<&str>,
    from_env: Option<&str>,
    from_config: Option<&str>,
) -> Result<String, String> {
    let actor = [explicit, from_env, from_config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|a| !a.is_empty())
        .ok_or(ACTOR_REQUIRED)?;

    if actor == SYSTEM_ACTOR {
        return Err(format!("'{SYSTEM_ACTOR}' is reserved for automated triage"));
    }
    Ok(actor.to_string())
}
