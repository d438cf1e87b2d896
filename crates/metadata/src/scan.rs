//! Sequential page walking over a cursored bulk scan.
//!
//! The underlying primitive only supports "up to N items after opaque
//! token T", and its internal ordering is not stable across calls with
//! different offsets, so client-side slicing would let items shift between
//! adjacent pages. The only stable contract is "continue from this exact
//! token": the walk fetches batch after batch from the start and keeps the
//! batch that lands on the target page.

use crate::kv::{ContinuationToken, RawItem};

/// State for producing one page (1-indexed) from a forward-only scan.
///
/// The walk itself is a pure state machine; the caller issues the store
/// calls and feeds each response into [`PageWalk::advance`]. This keeps the
/// algorithm testable with canned tokens, and dropping the caller's future
/// mid-walk stops the walk with it.
#[derive(Clone, Debug)]
pub struct PageWalk {
    target_page: u32,
    current_page: u32,
    token: Option<ContinuationToken>,
}

/// Outcome of feeding one scan response into the walk.
#[derive(Debug)]
pub enum WalkStep {
    /// Issue another scan call starting from [`PageWalk::token`].
    Continue(PageWalk),
    /// The target page is complete.
    Done {
        items: Vec<RawItem>,
        /// True iff a continuation token remained after the target page.
        has_more: bool,
    },
}

impl PageWalk {
    /// Start a walk toward the given page. Page numbers below 1 are
    /// treated as 1.
    pub fn new(target_page: u32) -> Self {
        Self {
            target_page: target_page.max(1),
            current_page: 1,
            token: None,
        }
    }

    /// The cursor the next scan call must start from.
    pub fn token(&self) -> Option<&ContinuationToken> {
        self.token.as_ref()
    }

    /// Fold one scan response into the walk.
    pub fn advance(mut self, items: Vec<RawItem>, next_token: Option<ContinuationToken>) -> WalkStep {
        if self.current_page == self.target_page {
            return WalkStep::Done {
                items,
                has_more: next_token.is_some(),
            };
        }
        match next_token {
            Some(token) => {
                self.current_page += 1;
                self.token = Some(token);
                WalkStep::Continue(self)
            }
            // Exhausted before reaching the target page: the page is empty,
            // not an error.
            None => WalkStep::Done {
                items: Vec::new(),
                has_more: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str) -> RawItem {
        json!({"ImageId": id}).as_object().unwrap().clone()
    }

    fn token(tag: &str) -> ContinuationToken {
        ContinuationToken::new(tag.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn first_page_completes_immediately() {
        let walk = PageWalk::new(1);
        assert!(walk.token().is_none());

        match walk.advance(vec![item("a"), item("b")], Some(token("t1"))) {
            WalkStep::Done { items, has_more } => {
                assert_eq!(items.len(), 2);
                assert!(has_more);
            }
            WalkStep::Continue(_) => panic!("first page should complete in one step"),
        }
    }

    #[test]
    fn walk_advances_through_tokens_to_target() {
        let walk = PageWalk::new(3);

        let walk = match walk.advance(vec![item("a")], Some(token("t1"))) {
            WalkStep::Continue(walk) => walk,
            WalkStep::Done { .. } => panic!("page 1 is not the target"),
        };
        assert_eq!(walk.token().unwrap(), &token("t1"));

        let walk = match walk.advance(vec![item("b")], Some(token("t2"))) {
            WalkStep::Continue(walk) => walk,
            WalkStep::Done { .. } => panic!("page 2 is not the target"),
        };
        assert_eq!(walk.token().unwrap(), &token("t2"));

        match walk.advance(vec![item("c")], None) {
            WalkStep::Done { items, has_more } => {
                assert_eq!(items.len(), 1);
                assert!(!has_more);
            }
            WalkStep::Continue(_) => panic!("page 3 is the target"),
        }
    }

    #[test]
    fn page_past_the_data_is_empty_not_an_error() {
        let walk = PageWalk::new(999);
        match walk.advance(vec![item("a"), item("b")], None) {
            WalkStep::Done { items, has_more } => {
                assert!(items.is_empty());
                assert!(!has_more);
            }
            WalkStep::Continue(_) => panic!("exhausted scan must complete the walk"),
        }
    }

    #[test]
    fn page_zero_is_treated_as_page_one() {
        let walk = PageWalk::new(0);
        match walk.advance(vec![item("a")], None) {
            WalkStep::Done { items, .. } => assert_eq!(items.len(), 1),
            WalkStep::Continue(_) => panic!("page 0 clamps to page 1"),
        }
    }
}
