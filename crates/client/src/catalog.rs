//! Static catalog of upstream operations.
//!
//! Every operation the upstream accepts is pinned here together with the
//! version tag its current revision expects. The upstream rejects calls whose
//! tag does not match its deployed revision, so tags are updated in lockstep
//! with upstream releases. Unknown operations fail before any network
//! activity.

use bc_domain::{Error, Result};

/// Operation name → version tag, as captured from the upstream web app.
const OPERATIONS: &[(&str, &str)] = &[
    (
        "ViewerQuery",
        "7e4bde27c6ac60dcba05ea1e5e2bd4d79e7b1b3aa246c3b1d76e0a7c2f9ed1c4",
    ),
    (
        "SubscriptionsMutation",
        "5a7bfc9ce3b4d8f20c61e09ffd2c83cf3db85cd94f52e1c7b6a85e02cdeb41f8",
    ),
    (
        "ConversationStartMutation",
        "9c1f03a7e45b28d6b3fe8ad92c07415f6d0e8be1754cfa9320d14b6ec85d7a02",
    ),
    (
        "ConversationReplyMutation",
        "2d84e1cf06b97a453c8fd1b20a6e59e487f6304cd2ab817e95fc0de63ba12947",
    ),
    (
        "MessageCancelMutation",
        "fbe10c7a92d4563e8b0fa41dc3275d9105ce8fb4a67d20e13c98d5a4e7b6013d",
    ),
    (
        "ConversationBreakMutation",
        "c3a5fd80e1924b67a8de53c9f0b1647dd2c09ae8517b34fe6d20c7b9851fe4a6",
    ),
    (
        "ConversationDeleteMutation",
        "08d7bc5f3ea9427106ce84da21f5b39ec6d17f5a0b42e98dcf3651a08e29d7b5",
    ),
    (
        "ConversationHistoryQuery",
        "614a0ce92f7d81b5c3e6fa2d90845cb1e73d6f08a25c41db9e80f73a6c15e2d9",
    ),
    (
        "BotCreateMutation",
        "a9f2c68d04e157b3dc80e9b6f241a75c3f8d01be6259ca47e1db30f598c46ea1",
    ),
    (
        "BotEditMutation",
        "3fb7d20a859ce461f7a2dc04b96e83d510fe67c29a04db85ce13f7a4602d9b58",
    ),
    (
        "BotDeleteMutation",
        "71c0de84b5f3a92616db4ce0f8152a7dc49e03b6d8af57e20c31b9e665a4fd03",
    ),
];

/// Lookup facade over [`OPERATIONS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCatalog;

impl QueryCatalog {
    /// Version tag for `operation`. Absence is a programmer error surfaced
    /// before any request is built.
    pub fn version_tag(&self, operation: &str) -> Result<&'static str> {
        OPERATIONS
            .iter()
            .find(|(name, _)| *name == operation)
            .map(|(_, tag)| *tag)
            .ok_or_else(|| Error::UnknownOperation(operation.to_string()))
    }

    /// Names of every known operation, catalog order.
    pub fn operations(&self) -> impl Iterator<Item = &'static str> {
        OPERATIONS.iter().map(|(name, _)| *name)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_operation_has_a_tag() {
        let tag = QueryCatalog.version_tag("ViewerQuery").unwrap();
        assert_eq!(tag.len(), 64);
    }

    #[test]
    fn unknown_operation_fails_before_network() {
        let err = QueryCatalog.version_tag("SelfDestructMutation").unwrap_err();
        assert!(matches!(err, Error::UnknownOperation(op) if op == "SelfDestructMutation"));
    }

    #[test]
    fn all_tags_are_lowercase_hex() {
        for (name, tag) in OPERATIONS {
            assert_eq!(tag.len(), 64, "{name}");
            assert!(
                tag.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()),
                "{name}"
            );
        }
    }

    #[test]
    fn operation_names_are_unique() {
        let mut names: Vec<_> = QueryCatalog.operations().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OPERATIONS.len());
    }
}
