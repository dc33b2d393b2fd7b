//! Walks a change log and hands each change set to a visitor.

use super::filter::ChangeSetFilter;
use super::visitor::{ChangeSetVisitor, RunContext};
use super::ChangeSet;
use crate::error::Result;

/// Ordered walk over change sets with a filter chain.
///
/// Filters run in order; the first rejection stops evaluation and the change
/// set goes to [`ChangeSetVisitor::skipped`] with that filter's message.
pub struct ChangeLogIterator<'a> {
    change_sets: Vec<&'a ChangeSet>,
    filters: Vec<Box<dyn ChangeSetFilter + 'a>>,
}

impl<'a> ChangeLogIterator<'a> {
    /// Forward walk in change log order.
    pub fn new(
        change_sets: impl IntoIterator<Item = &'a ChangeSet>,
        filters: Vec<Box<dyn ChangeSetFilter + 'a>>,
    ) -> Self {
        Self {
            change_sets: change_sets.into_iter().collect(),
            filters,
        }
    }

    /// Backward walk, used for rollback.
    pub fn reverse(
        change_sets: impl IntoIterator<Item = &'a ChangeSet>,
        filters: Vec<Box<dyn ChangeSetFilter + 'a>>,
    ) -> Self {
        let mut iterator = Self::new(change_sets, filters);
        iterator.change_sets.reverse();
        iterator
    }

    fn verdict(&mut self, change_set: &ChangeSet) -> Vec<String> {
        for filter in self.filters.iter_mut() {
            let result = filter.accepts(change_set);
            if !result.accepted {
                return vec![result.message];
            }
        }
        Vec::new()
    }

    /// Visit every change set, accepted or not.
    pub async fn run(mut self, visitor: &mut dyn ChangeSetVisitor, ctx: &RunContext<'_>) -> Result<()> {
        let change_sets = std::mem::take(&mut self.change_sets);
        for change_set in change_sets {
            let reasons = self.verdict(change_set);
            if reasons.is_empty() {
                visitor.visit(change_set, ctx).await?;
            } else {
                visitor.skipped(change_set, &reasons, ctx).await?;
            }
        }
        Ok(())
    }

    /// The change sets the filters accept, in walk order.
    pub fn accepted(mut self) -> Vec<&'a ChangeSet> {
        let change_sets = std::mem::take(&mut self.change_sets);
        change_sets
            .into_iter()
            .filter(|cs| self.verdict(cs).is_empty())
            .collect()
    }
}
