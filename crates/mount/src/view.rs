//! View - Rendered output of a fragment

use serde::Serialize;

/// A node of rendered output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum View {
    Text {
        text: String,
    },
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<View>,
    },
}

impl View {
    pub fn text(text: impl Into<String>) -> Self {
        View::Text { text: text.into() }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        View::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute (no-op on text nodes)
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let View::Element { attrs, .. } = &mut self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    /// Builder: append a child (no-op on text nodes)
    pub fn child(mut self, child: View) -> Self {
        if let View::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    /// Builder: append several children
    pub fn children(mut self, iter: impl IntoIterator<Item = View>) -> Self {
        if let View::Element { children, .. } = &mut self {
            children.extend(iter);
        }
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        match self {
            View::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            View::Text { .. } => None,
        }
    }

    /// Concatenated text content, one line per text node
    pub fn text_content(&self) -> String {
        let mut lines = Vec::new();
        self.collect_text(&mut lines);
        lines.join("\n")
    }

    fn collect_text(&self, out: &mut Vec<String>) {
        match self {
            View::Text { text } => out.push(text.clone()),
            View::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Number of elements carrying `name=value`
    pub fn count_with_attr(&self, name: &str, value: &str) -> usize {
        match self {
            View::Text { .. } => 0,
            View::Element { children, .. } => {
                let own = usize::from(self.get_attr(name) == Some(value));
                own + children
                    .iter()
                    .map(|c| c.count_with_attr(name, value))
                    .sum::<usize>()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_text_content() {
        let view = View::element("ul")
            .attr("class", "invoices")
            .child(View::element("li").attr("data-id", "inv-001").child(View::text("Acme")))
            .child(View::element("li").attr("data-id", "inv-004").child(View::text("Small Biz")));

        assert_eq!(view.get_attr("class"), Some("invoices"));
        assert_eq!(view.text_content(), "Acme\nSmall Biz");
        assert_eq!(view.count_with_attr("data-id", "inv-004"), 1);
    }

    #[test]
    fn test_attr_on_text_is_ignored() {
        let view = View::text("plain").attr("x", "y").child(View::text("z"));
        assert_eq!(view, View::text("plain"));
        assert_eq!(view.get_attr("x"), None);
    }
}
