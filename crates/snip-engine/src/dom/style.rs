//! Inline `style` attribute access.

use kuchiki::NodeRef;

use super::{attr, remove_attr, set_attr};

/// Split a declaration list on `;` outside quotes and parentheses, so
/// `url("data:...;base64,...")` stays one value.
fn split_declarations(style: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (index, c) in style.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&style[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&style[start..]);
    parts
}

fn parse(style: &str) -> Vec<(String, String)> {
    split_declarations(style)
        .into_iter()
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            (!property.is_empty() && !value.is_empty()).then(|| (property, value.to_owned()))
        })
        .collect()
}

fn serialize(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(property, value)| format!("{property}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Value of an inline style property.
pub(crate) fn style_property(node: &NodeRef, property: &str) -> Option<String> {
    let style = attr(node, "style")?;
    parse(&style)
        .into_iter()
        .find(|(name, _)| name == property)
        .map(|(_, value)| value)
}

/// Set inline style properties, keeping declaration order stable: existing
/// properties are updated where they are, new ones are appended.
pub(crate) fn set_style(node: &NodeRef, properties: &[(&str, &str)]) {
    let mut declarations = attr(node, "style").map(|s| parse(&s)).unwrap_or_default();
    for (property, value) in properties {
        match declarations.iter_mut().find(|(name, _)| name == property) {
            Some(existing) => (*value).clone_into(&mut existing.1),
            None => declarations.push(((*property).to_owned(), (*value).to_owned())),
        }
    }
    if declarations.is_empty() {
        remove_attr(node, "style");
    } else {
        set_attr(node, "style", &serialize(&declarations));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dom::element;

    #[test]
    fn test_set_style_appends_in_order() {
        let node = element("span", &[]);
        set_style(&node, &[("color", "red"), ("font-size", "inherit")]);
        assert_eq!(attr(&node, "style").unwrap(), "color: red; font-size: inherit");
    }

    #[test]
    fn test_set_style_updates_in_place() {
        let node = element("p", &[("style", "margin: 4px;COLOR:blue; ")]);
        set_style(&node, &[("color", "#FFFFFF"), ("margin", "0")]);
        assert_eq!(attr(&node, "style").unwrap(), "margin: 0; color: #FFFFFF");
    }

    #[test]
    fn test_semicolons_inside_urls_and_quotes() {
        let node = element(
            "div",
            &[(
                "style",
                r#"background:url("data:image/png;base64,AAAA"); content: 'a;b'; margin: url(x;y)"#,
            )],
        );
        assert_eq!(
            style_property(&node, "background").unwrap(),
            r#"url("data:image/png;base64,AAAA")"#
        );
        assert_eq!(style_property(&node, "content").unwrap(), "'a;b'");
        set_style(&node, &[("color", "red")]);
        assert_eq!(
            attr(&node, "style").unwrap(),
            r#"background: url("data:image/png;base64,AAAA"); content: 'a;b'; margin: url(x;y); color: red"#
        );
    }

    #[test]
    fn test_style_property() {
        let node = element("span", &[("style", "color: rgb(1, 2, 3); font-weight: 500")]);
        assert_eq!(style_property(&node, "color").unwrap(), "rgb(1, 2, 3)");
        assert_eq!(style_property(&node, "margin"), None);
    }
}
