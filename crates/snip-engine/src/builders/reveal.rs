//! `{{reveal-answer: Title}}` quiz blocks with `{{correct: ..}}` and
//! `{{wrong: ..}}` answers.

use kuchiki::NodeRef;

use super::{BlockBuilder, Builder, Expansion, expand_blocks};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dom::{self, TextMap, element, element_with_text};
use crate::error::EngineError;
use crate::extract::ExtractedFragment;
use crate::locate::MarkerSpan;
use crate::marker::{ANSWER, BlockMarker, REVEAL_ANSWER, clean_payload};
use crate::pipeline::Stage;
use crate::root::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnswerKind {
    Correct,
    Wrong,
}

impl AnswerKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Wrong => "wrong",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Answer {
    kind: AnswerKind,
    text: String,
}

/// Strip every answer marker out of `holder`, in order of appearance.
///
/// A top-level node left blank by a removal goes with it.
fn take_answers(holder: &NodeRef) -> Vec<Answer> {
    let mut answers = Vec::new();
    loop {
        let map = TextMap::new(holder);
        let Some(captures) = ANSWER.captures(map.text()) else {
            break;
        };
        let (Some(whole), Some(kind), Some(text)) = (captures.get(0), captures.get(1), captures.get(2))
        else {
            break;
        };
        let (Some(start), Some(end)) = (map.point(whole.start()), map.point(whole.end())) else {
            break;
        };

        answers.push(Answer {
            kind: if kind.as_str() == "correct" {
                AnswerKind::Correct
            } else {
                AnswerKind::Wrong
            },
            text: clean_payload(text.as_str()),
        });

        let host = start
            .node
            .inclusive_ancestors()
            .find(|node| node.parent().as_ref() == Some(holder));
        dom::delete_range(holder, &start, &end);
        if let Some(host) = host
            && host.parent().is_some()
            && dom::is_blank_node(&host)
        {
            host.detach();
        }
    }
    answers
}

/// Builds reveal-answer widgets.
#[derive(Debug, Default)]
pub(crate) struct RevealBuilder;

impl RevealBuilder {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl BlockBuilder for RevealBuilder {
    fn stage(&self) -> Stage {
        Stage::RevealAnswer
    }

    fn marker(&self) -> &'static BlockMarker {
        &REVEAL_ANSWER
    }

    fn build(
        &mut self,
        span: &MarkerSpan,
        fragment: ExtractedFragment,
        diagnostics: &mut Diagnostics,
    ) -> Result<Expansion, EngineError> {
        let title = span.payload_or_empty();
        let holder = element("div", &[]);
        fragment.append_to(&holder);
        let answers = take_answers(&holder);

        if answers.is_empty() {
            diagnostics.report(
                Stage::RevealAnswer,
                DiagnosticKind::NoAnswers,
                format!("{{{{reveal-answer: {title}}}}} has no {{{{correct:}}}} or {{{{wrong:}}}} answers"),
            );
        }

        let container = element("div", &[("class", "reveal-answer")]);
        let header = element(
            "button",
            &[
                ("class", "reveal-answer__header"),
                ("type", "button"),
                ("aria-expanded", "false"),
            ],
        );
        header.append(element_with_text(
            "span",
            &[("class", "reveal-answer__title")],
            title,
        ));
        header.append(element(
            "span",
            &[("class", "reveal-answer__icon"), ("aria-hidden", "true")],
        ));
        container.append(header);

        let rest: Vec<NodeRef> = holder.children().collect();
        if !dom::is_blank(&rest) {
            let body = element("div", &[("class", "reveal-answer__body")]);
            for node in rest {
                body.append(node);
            }
            container.append(body);
        }

        let list = element("ol", &[("class", "reveal-answer__answers")]);
        for answer in &answers {
            let item = element(
                "li",
                &[(
                    "class",
                    &format!(
                        "reveal-answer__answer reveal-answer__answer--{}",
                        answer.kind.as_str()
                    ),
                )],
            );
            item.append(element_with_text(
                "span",
                &[("class", "reveal-answer__answer-text")],
                &answer.text,
            ));
            list.append(item);
        }
        container.append(list);

        Ok(Expansion::Replace(container))
    }
}

impl Builder for RevealBuilder {
    fn stage(&self) -> Stage {
        Stage::RevealAnswer
    }

    fn run(&mut self, scope: &Scope, diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        expand_blocks(self, scope, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builders::testing::run;
    use crate::dom::testing::body;
    use crate::dom::inner_html;

    #[test]
    fn test_take_answers_in_order() {
        let holder = body(
            "<body><p>Pick one:</p><p>{{wrong: Paris}}</p><p>{{correct: Rome}} is right</p><p>{{wrong: Oslo}} {{wrong: Bern}}</p></body>",
        );
        let answers = take_answers(&holder);
        let texts: Vec<(&str, &str)> = answers
            .iter()
            .map(|a| (a.kind.as_str(), a.text.as_str()))
            .collect();
        assert_eq!(
            texts,
            vec![
                ("wrong", "Paris"),
                ("correct", "Rome"),
                ("wrong", "Oslo"),
                ("wrong", "Bern"),
            ]
        );
        assert_eq!(inner_html(&holder), "<p>Pick one:</p><p> is right</p>");
    }

    #[test]
    fn test_reveal_widget() {
        let (html, widgets, diagnostics) = run(
            &mut RevealBuilder::new(),
            "<p>{{reveal-answer: Capital?}}</p><p>{{correct: Rome}}</p><p>{{wrong: Milan}}</p><p>{{/reveal-answer}}</p>",
        );
        assert_eq!(widgets, 1);
        assert!(diagnostics.is_empty());
        assert_eq!(
            html,
            concat!(
                r#"<div class="reveal-answer">"#,
                r#"<button aria-expanded="false" class="reveal-answer__header" type="button">"#,
                r#"<span class="reveal-answer__title">Capital?</span>"#,
                r#"<span aria-hidden="true" class="reveal-answer__icon"></span></button>"#,
                r#"<ol class="reveal-answer__answers">"#,
                r#"<li class="reveal-answer__answer reveal-answer__answer--correct"><span class="reveal-answer__answer-text">Rome</span></li>"#,
                r#"<li class="reveal-answer__answer reveal-answer__answer--wrong"><span class="reveal-answer__answer-text">Milan</span></li>"#,
                "</ol></div>",
            )
        );
    }

    #[test]
    fn test_question_text_goes_to_body() {
        let (html, _, _) = run(
            &mut RevealBuilder::new(),
            "<p>{{reveal-answer: Q}}</p><p>Which one?</p><p>{{correct: A}}</p><p>{{/reveal-answer}}</p>",
        );
        assert!(html.contains(r#"<div class="reveal-answer__body"><p>Which one?</p></div>"#));
    }

    #[test]
    fn test_no_answers_still_renders() {
        let (html, widgets, diagnostics) = run(
            &mut RevealBuilder::new(),
            "<p>{{reveal-answer: Empty}}</p><p>{{/reveal-answer}}</p>",
        );
        assert_eq!(widgets, 1);
        assert_eq!(diagnostics.count(DiagnosticKind::NoAnswers), 1);
        assert!(html.contains(r#"<ol class="reveal-answer__answers"></ol>"#));
    }
}
