//! # Declarative fan-out topology.
//!
//! A [`RouteTable`] maps `(stage, task-id pattern)` to the stages that must
//! receive a copy of the packet once the source stage has forwarded it.
//!
//! ## Standard topology
//! ```text
//! soc ── id "sail"   ──► sail
//!     ── id "vip"    ──► vip
//!     ── id "rootfs" ──► switch
//! ```
//! Every other id stops at `soc`; `sail`, `vip` and `switch` are leaves.

use std::sync::Arc;

use crate::tasks::Stage;

/// Which task ids a [`Route`] applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdPattern {
    /// Every id.
    Any,
    /// Exactly this id.
    Exact(Arc<str>),
    /// Ids starting with this prefix.
    Prefix(Arc<str>),
}

impl IdPattern {
    /// Shorthand for [`IdPattern::Exact`].
    pub fn exact(id: impl Into<Arc<str>>) -> Self {
        IdPattern::Exact(id.into())
    }

    /// True if `id` satisfies the pattern.
    pub fn matches(&self, id: &str) -> bool {
        match self {
            IdPattern::Any => true,
            IdPattern::Exact(want) => want.as_ref() == id,
            IdPattern::Prefix(prefix) => id.starts_with(prefix.as_ref()),
        }
    }
}

/// One fan-out rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Stage whose successful forwarding triggers the rule.
    pub from: Stage,
    /// Ids the rule applies to.
    pub pattern: IdPattern,
    /// Stages that receive a new task, in order.
    pub to: Vec<Stage>,
}

/// Ordered list of fan-out rules.
///
/// Rules are evaluated in insertion order; every matching rule contributes its
/// targets, so a task may fan out to several stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Table without any fan-out.
    pub fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    /// The upgrade topology: `soc` hands `sail`, `vip` and `rootfs` on to
    /// `sail`, `vip` and `switch`.
    pub fn standard() -> Self {
        Self::empty()
            .with_route(Stage::Soc, IdPattern::exact("sail"), [Stage::Sail])
            .with_route(Stage::Soc, IdPattern::exact("vip"), [Stage::Vip])
            .with_route(Stage::Soc, IdPattern::exact("rootfs"), [Stage::Switch])
    }

    /// Appends a rule.
    pub fn with_route(
        mut self,
        from: Stage,
        pattern: IdPattern,
        to: impl IntoIterator<Item = Stage>,
    ) -> Self {
        self.routes.push(Route {
            from,
            pattern,
            to: to.into_iter().collect(),
        });
        self
    }

    /// Stages that must receive a copy of task `id` after `from` forwarded it.
    pub fn downstream<'a>(&'a self, from: Stage, id: &'a str) -> impl Iterator<Item = Stage> + 'a {
        self.routes
            .iter()
            .filter(move |r| r.from == from && r.pattern.matches(id))
            .flat_map(|r| r.to.iter().copied())
    }

    /// All rules, in evaluation order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(table: &RouteTable, from: Stage, id: &str) -> Vec<Stage> {
        table.downstream(from, id).collect()
    }

    #[test]
    fn test_standard_topology() {
        let table = RouteTable::standard();
        assert_eq!(targets(&table, Stage::Soc, "sail"), vec![Stage::Sail]);
        assert_eq!(targets(&table, Stage::Soc, "vip"), vec![Stage::Vip]);
        assert_eq!(targets(&table, Stage::Soc, "rootfs"), vec![Stage::Switch]);
        assert!(targets(&table, Stage::Soc, "description").is_empty());
        assert!(targets(&table, Stage::Soc, "middleware").is_empty());
    }

    #[test]
    fn test_leaf_stages_never_fan_out() {
        let table = RouteTable::standard();
        for stage in [Stage::Sail, Stage::Vip, Stage::Switch] {
            assert!(targets(&table, stage, "vip").is_empty());
            assert!(targets(&table, stage, "sail").is_empty());
        }
    }

    #[test]
    fn test_matching_rules_accumulate_in_order() {
        let table = RouteTable::empty()
            .with_route(Stage::Soc, IdPattern::Prefix("fw-".into()), [Stage::Vip])
            .with_route(Stage::Soc, IdPattern::Any, [Stage::Sail, Stage::Switch]);
        assert_eq!(
            targets(&table, Stage::Soc, "fw-1"),
            vec![Stage::Vip, Stage::Sail, Stage::Switch]
        );
        assert_eq!(targets(&table, Stage::Soc, "cfg"), vec![Stage::Sail, Stage::Switch]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_exact_is_not_prefix() {
        assert!(!IdPattern::exact("vip").matches("vip2"));
        assert!(IdPattern::Prefix("vip".into()).matches("vip2"));
    }
}
