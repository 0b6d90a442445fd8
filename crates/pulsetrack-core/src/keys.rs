//! Deterministic construction of namespaced cache keys.
//!
//! Key shape: `{prefix}:{namespace}:{part}[:{part}...]`. Identifiers are
//! validated at the web boundary to exclude the `:` separator, which keeps
//! these functions collision-free for distinct `(namespace, parts)` tuples.

pub fn campaign(prefix: &str, campaign_id: &str) -> String {
    join(prefix, "campaign", &[campaign_id])
}

pub fn pageview(prefix: &str, campaign_id: &str, visitor_id: &str) -> String {
    join(prefix, "pageview", &[campaign_id, visitor_id])
}

pub fn hit_gate(prefix: &str, campaign_id: &str, visitor_id: &str) -> String {
    join(prefix, "hit_gate", &[campaign_id, visitor_id])
}

fn join(prefix: &str, namespace: &str, parts: &[&str]) -> String {
    let mut key = String::with_capacity(
        prefix.len() + namespace.len() + parts.iter().map(|p| p.len() + 1).sum::<usize>() + 1,
    );
    key.push_str(prefix);
    key.push(':');
    key.push_str(namespace);
    for part in parts {
        key.push(':');
        key.push_str(part);
    }
    key
}
