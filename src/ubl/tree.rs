use crate::core::DocumentType;

/// Element content. Mixed content never occurs in UBL documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Rendered as a self-closing tag.
    Empty,
    Text(String),
    Children(Vec<Element>),
}

/// One element of the output tree, with attributes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub content: Content,
}

impl Element {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            content: Content::Empty,
        }
    }

    pub fn text(name: &'static str, text: impl Into<String>) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            content: Content::Text(text.into()),
        }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    pub fn attrs(mut self, attrs: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    /// Append a child. Text content is replaced.
    pub fn child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        match &mut self.content {
            Content::Children(children) => children.push(child),
            _ => self.content = Content::Children(vec![child]),
        }
    }

    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Children(children) => children,
            _ => &[],
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Follow a `/`-separated path of child names, taking the first match at
    /// each step.
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/').try_fold(self, |current, name| {
            current.children().iter().find(|c| c.name == name)
        })
    }

    /// All descendants named `name`, in document order.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect(self, name, &mut found);
        found
    }
}

fn collect<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in element.children() {
        if child.name == name {
            found.push(child);
        }
        collect(child, name, found);
    }
}

/// Typed UBL tree for one document, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTree {
    pub document_type: DocumentType,
    pub root: Element,
}
