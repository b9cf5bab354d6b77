//! Final stage: removes authoring leftovers and marks the root as ready.

use kuchiki::Selectors;

use super::Builder;
use crate::diagnostics::Diagnostics;
use crate::dom;
use crate::error::EngineError;
use crate::pipeline::Stage;
use crate::root::Scope;

/// Removes authoring leftovers and marks the root as processed.
pub(crate) struct CleanupBuilder<'a> {
    remove: Option<&'a Selectors>,
    ready_class: &'a str,
}

impl<'a> CleanupBuilder<'a> {
    pub(crate) fn new(remove: Option<&'a Selectors>, ready_class: &'a str) -> Self {
        Self {
            remove,
            ready_class,
        }
    }
}

impl Builder for CleanupBuilder<'_> {
    fn stage(&self) -> Stage {
        Stage::Cleanup
    }

    fn run(&mut self, scope: &Scope, _diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        let mut removed = 0;
        let leftovers = self
            .remove
            .map(|remove| dom::select_all(scope.root(), remove))
            .unwrap_or_default();
        for node in leftovers {
            if scope.is_excluded(&node) {
                continue;
            }
            node.detach();
            removed += 1;
        }
        if !self.ready_class.is_empty() {
            dom::add_class(scope.root(), self.ready_class);
        }
        tracing::debug!(removed, "Cleaned up content root");
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builders::testing::scope;

    #[test]
    fn test_removes_leftovers_and_marks_root() {
        let scope = scope(r#"<h2 class="snippet-title">Snippet</h2><p>kept</p>"#);
        let remove = Selectors::compile(".snippet-title").unwrap();
        let mut diagnostics = Diagnostics::default();
        CleanupBuilder::new(Some(&remove), "snippets-ready")
            .run(&scope, &mut diagnostics)
            .unwrap();
        assert_eq!(
            dom::outer_html(scope.root()),
            r#"<div class="gh-content snippets-ready"><p>kept</p></div>"#
        );
    }
}
