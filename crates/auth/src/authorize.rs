//! Authorization policy for account and resource mutation.
//!
//! - No IO
//! - No panics
//! - Pure decision over two snapshots

use serde::Serialize;

use showcase_core::AccountId;

use crate::{Account, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

/// Outcome plus the rule that produced it (for audit logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyExplanation {
    pub decision: Decision,
    pub rule: &'static str,
}

struct Rule {
    name: &'static str,
    /// `None` means "not applicable, continue".
    evaluate: fn(target: &Account, actor: &Account) -> Option<Decision>,
}

fn is_plain_admin(account: &Account) -> bool {
    account.roles.contains(Role::Admin) && !account.roles.contains(Role::SuperAdmin)
}

fn self_service(target: &Account, actor: &Account) -> Option<Decision> {
    (target.id == actor.id).then_some(Decision::Allow)
}

fn requires_privilege(_target: &Account, actor: &Account) -> Option<Decision> {
    (!actor.roles.is_privileged()).then_some(Decision::Deny)
}

fn admin_cannot_reach_superadmin(target: &Account, actor: &Account) -> Option<Decision> {
    (is_plain_admin(actor) && target.roles.contains(Role::SuperAdmin)).then_some(Decision::Deny)
}

fn admin_cannot_reach_peer_admin(target: &Account, actor: &Account) -> Option<Decision> {
    (is_plain_admin(actor) && target.roles.contains(Role::Admin)).then_some(Decision::Deny)
}

fn privileged_default(_target: &Account, _actor: &Account) -> Option<Decision> {
    Some(Decision::Allow)
}

/// Evaluated top to bottom; the first rule that returns a decision wins.
/// The two admin denials must stay after `requires_privilege` and before
/// `privileged_default`.
const ACCOUNT_RULES: &[Rule] = &[
    Rule { name: "self_service", evaluate: self_service },
    Rule { name: "requires_privilege", evaluate: requires_privilege },
    Rule { name: "admin_cannot_reach_superadmin", evaluate: admin_cannot_reach_superadmin },
    Rule { name: "admin_cannot_reach_peer_admin", evaluate: admin_cannot_reach_peer_admin },
    Rule { name: "privileged_default", evaluate: privileged_default },
];

/// Explain whether `actor` may modify (update, deactivate) `target`.
pub fn explain_account_modification(target: &Account, actor: &Account) -> PolicyExplanation {
    for rule in ACCOUNT_RULES {
        if let Some(decision) = (rule.evaluate)(target, actor) {
            return PolicyExplanation {
                decision,
                rule: rule.name,
            };
        }
    }
    // Unreachable while `privileged_default` terminates the list.
    PolicyExplanation {
        decision: Decision::Deny,
        rule: "no_rule_matched",
    }
}

pub fn can_modify(target: &Account, actor: &Account) -> bool {
    explain_account_modification(target, actor).decision == Decision::Allow
}

/// Owned resources (products, their images): only the exact owner.
///
/// Narrower than the account policy: there is no admin override here.
pub fn can_modify_resource(owner_id: AccountId, actor: &Account) -> bool {
    owner_id == actor.id
}
