//! Clone eligibility: whether this node should pull down a replica of a
//! file another node just announced. Two policies are implemented, per
//! the documented criterion and per the original's actual deployed
//! shortcut.

use dfs3_types::NodeId;

/// A ten-minute "active" window for `last_seen`, matching the documented
/// `datetime('now', '-10 minutes')` criterion in `core/nodes.py`.
pub const ACTIVE_WINDOW_SECS: i64 = 600;

/// One day of uptime, the documented eligibility floor.
pub const MIN_UPTIME_SECS: u64 = 86_400;

/// Top-K candidates considered by free space, documented alongside the
/// scored criterion.
pub const TOP_K_CANDIDATES: usize = 3;

/// A node's registry-derived state as seen by the scored eligibility
/// check. Built by the caller from `dfs3-registry` data so this crate
/// does not need a direct dependency on the registry.
#[derive(Debug, Clone)]
pub struct NodeCandidate {
    pub node_id: NodeId,
    pub uptime: u64,
    pub last_seen: i64,
    pub free_space: u64,
}

pub trait CloneEligibility: Send + Sync {
    /// Whether `local_node_id` should clone a file of `size` bytes that
    /// `source_node_id` just announced, given the currently known,
    /// replica-less candidate pool. `seeding` is `true` while this node is
    /// replaying another node's event history at startup; background
    /// cloning is always suppressed during that window so a bulk replay
    /// doesn't fan out into a storm of peer fetches.
    fn is_eligible(
        &self,
        local_node_id: &NodeId,
        source_node_id: &NodeId,
        size: u64,
        candidates: &[NodeCandidate],
        now: i64,
        seeding: bool,
    ) -> bool;
}

/// The documented criterion: uptime >= 1 day, active within the last 10
/// minutes, free space above `size`, ranked by free space and capped to
/// the top `TOP_K_CANDIDATES`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoredEligibility;

impl CloneEligibility for ScoredEligibility {
    fn is_eligible(
        &self,
        local_node_id: &NodeId,
        source_node_id: &NodeId,
        size: u64,
        candidates: &[NodeCandidate],
        now: i64,
        seeding: bool,
    ) -> bool {
        if seeding {
            return false;
        }

        let mut ranked: Vec<&NodeCandidate> = candidates
            .iter()
            .filter(|c| &c.node_id != source_node_id)
            .filter(|c| c.uptime >= MIN_UPTIME_SECS)
            .filter(|c| now - c.last_seen <= ACTIVE_WINDOW_SECS)
            .filter(|c| c.free_space > size)
            .collect();

        ranked.sort_by(|a, b| {
            b.free_space
                .cmp(&a.free_space)
                .then_with(|| a.node_id.as_str().cmp(b.node_id.as_str()))
        });
        ranked.truncate(TOP_K_CANDIDATES);

        ranked.iter().any(|c| &c.node_id == local_node_id)
    }
}

/// The original's actual deployed shortcut (`core/nodes.py:
/// should_clone_from`): any node other than the emitter clones.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysEligibility;

impl CloneEligibility for AlwaysEligibility {
    fn is_eligible(
        &self,
        local_node_id: &NodeId,
        source_node_id: &NodeId,
        _size: u64,
        _candidates: &[NodeCandidate],
        _now: i64,
        seeding: bool,
    ) -> bool {
        !seeding && local_node_id != source_node_id
    }
}

/// Config knob selecting which policy governs background cloning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClonePolicy {
    Scored,
    Always,
}

impl ClonePolicy {
    pub fn eligibility(self) -> Box<dyn CloneEligibility> {
        match self {
            ClonePolicy::Scored => Box::new(ScoredEligibility),
            ClonePolicy::Always => Box::new(AlwaysEligibility),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    fn node(id: &str) -> NodeId {
        NodeId::try_from(id.repeat(64)).unwrap()
    }

    #[test]
    fn always_eligibility_excludes_only_the_source() {
        let policy = AlwaysEligibility;
        assert!(policy.is_eligible(&node("a"), &node("b"), 100, &[], 0, false));
        assert!(!policy.is_eligible(&node("a"), &node("a"), 100, &[], 0, false));
    }

    #[test]
    fn always_eligibility_suppressed_while_seeding() {
        let policy = AlwaysEligibility;
        assert!(!policy.is_eligible(&node("a"), &node("b"), 100, &[], 0, true));
    }

    #[test]
    fn scored_eligibility_requires_uptime_and_recency_and_space() {
        let policy = ScoredEligibility;
        let now = 1_700_010_000;
        let eligible = NodeCandidate {
            node_id: node("c"),
            uptime: MIN_UPTIME_SECS + 1,
            last_seen: now - 60,
            free_space: 10_000,
        };
        let stale = NodeCandidate {
            node_id: node("d"),
            uptime: MIN_UPTIME_SECS + 1,
            last_seen: now - ACTIVE_WINDOW_SECS - 60,
            free_space: 10_000,
        };
        let candidates = vec![eligible.clone(), stale];

        assert!(policy.is_eligible(&node("c"), &node("b"), 100, &candidates, now, false));
        assert!(!policy.is_eligible(&node("d"), &node("b"), 100, &candidates, now, false));
    }

    #[test]
    fn scored_eligibility_suppressed_while_seeding() {
        let policy = ScoredEligibility;
        let now = 1_700_010_000;
        let eligible = NodeCandidate {
            node_id: node("c"),
            uptime: MIN_UPTIME_SECS + 1,
            last_seen: now - 60,
            free_space: 10_000,
        };
        assert!(!policy.is_eligible(&node("c"), &node("b"), 100, &[eligible], now, true));
    }

    #[test]
    fn scored_eligibility_caps_to_top_k_by_free_space() {
        let policy = ScoredEligibility;
        let now = 1_700_010_000;
        let candidates: Vec<NodeCandidate> = (0..5)
            .map(|i| NodeCandidate {
                node_id: node(&((b'a' + i) as char).to_string()),
                uptime: MIN_UPTIME_SECS + 1,
                last_seen: now,
                free_space: 1_000 - i as u64,
            })
            .collect();

        let last = &candidates[4];
        assert!(!policy.is_eligible(&last.node_id, &node("z"), 1, &candidates, now, false));
        let first = &candidates[0];
        assert!(policy.is_eligible(&first.node_id, &node("z"), 1, &candidates, now, false));
    }
}
