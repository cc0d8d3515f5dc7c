use std::io::{self, Write};

use markup5ever::{Attribute, Namespace, Prefix, QualName};
use markup5ever_rcdom::{Handle, NodeData};

/// Delimiter for attribute values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Quote {
    #[default]
    Double,
    Single,
}

impl Quote {
    fn as_char(self) -> char {
        match self {
            Self::Double => '"',
            Self::Single => '\'',
        }
    }

    /// The delimiter of the first attribute value in `text`, if any.
    pub(crate) fn detect(text: &str) -> Self {
        let mut in_tag = false;
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '<' => in_tag = !matches!(chars.peek(), Some('!' | '?' | '/')),
                '>' => in_tag = false,
                '=' if in_tag => {
                    while chars.next_if(|c| c.is_whitespace()).is_some() {}
                    return match chars.peek() {
                        Some('\'') => Self::Single,
                        _ => Self::Double,
                    };
                }
                _ => {}
            }
        }
        Self::Double
    }
}

/// Serialize `handle` and its subtree. A document node writes its children.
///
/// Childless elements are written self-closed. A prefixed namespace is
/// declared on the outermost element whose subtree binds the prefix to a
/// single namespace; the default namespace is declared where it changes.
pub(crate) fn write_node<W: Write>(handle: &Handle, quote: Quote, out: W) -> io::Result<()> {
    let mut writer = Writer {
        out,
        quote,
        scope: Vec::new(),
    };
    writer.node(handle)
}

struct Writer<W> {
    out: W,
    quote: Quote,
    scope: Vec<(Option<Prefix>, Namespace)>,
}

impl<W: Write> Writer<W> {
    fn node(&mut self, handle: &Handle) -> io::Result<()> {
        match &handle.data {
            NodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.node(child)?;
                }
                Ok(())
            }
            NodeData::Element { name, attrs, .. } => {
                let attrs = attrs.borrow().clone();
                self.element(handle, name, &attrs)
            }
            NodeData::Text { contents } => self.escaped(&contents.borrow(), None),
            NodeData::Comment { contents } => write!(self.out, "<!--{contents}-->"),
            NodeData::ProcessingInstruction { target, contents } if contents.is_empty() => {
                write!(self.out, "<?{target}?>")
            }
            NodeData::ProcessingInstruction { target, contents } => {
                write!(self.out, "<?{target} {contents}?>")
            }
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => {
                write!(self.out, "<!DOCTYPE {name}")?;
                if !public_id.is_empty() {
                    write!(self.out, " PUBLIC \"{public_id}\" \"{system_id}\"")?;
                } else if !system_id.is_empty() {
                    write!(self.out, " SYSTEM \"{system_id}\"")?;
                }
                write!(self.out, ">")
            }
        }
    }

    fn element(&mut self, handle: &Handle, name: &QualName, attrs: &[Attribute]) -> io::Result<()> {
        let depth = self.scope.len();

        let mut wanted = vec![(name.prefix.clone(), name.ns.clone())];
        wanted.extend(
            attrs
                .iter()
                .filter(|attr| attr.name.prefix.is_some())
                .map(|attr| (attr.name.prefix.clone(), attr.name.ns.clone())),
        );
        wanted.extend(
            hoistable(handle)
                .into_iter()
                .map(|(prefix, ns)| (Some(prefix), ns)),
        );

        let mut declared = Vec::new();
        for (prefix, ns) in wanted {
            if is_reserved(prefix.as_ref()) || (prefix.is_some() && ns.is_empty()) {
                continue;
            }
            let in_scope = match self.bound(prefix.as_ref()) {
                Some(current) => *current == ns,
                None => prefix.is_none() && ns.is_empty(),
            };
            if !in_scope {
                self.scope.push((prefix.clone(), ns.clone()));
                declared.push((prefix, ns));
            }
        }

        let qname = qualified(name);
        write!(self.out, "<{qname}")?;
        for (prefix, ns) in &declared {
            match prefix {
                Some(prefix) => write!(self.out, " xmlns:{prefix}=")?,
                None => write!(self.out, " xmlns=")?,
            }
            self.attribute_value(ns)?;
        }
        for attr in attrs {
            write!(self.out, " {}=", qualified(&attr.name))?;
            self.attribute_value(&attr.value)?;
        }

        let children = handle.children.borrow();
        if children.is_empty() {
            write!(self.out, "/>")?;
        } else {
            write!(self.out, ">")?;
            for child in children.iter() {
                self.node(child)?;
            }
            write!(self.out, "</{qname}>")?;
        }
        self.scope.truncate(depth);
        Ok(())
    }

    fn bound(&self, prefix: Option<&Prefix>) -> Option<&Namespace> {
        self.scope
            .iter()
            .rev()
            .find(|(p, _)| p.as_ref() == prefix)
            .map(|(_, ns)| ns)
    }

    fn attribute_value(&mut self, value: &str) -> io::Result<()> {
        let quote = self.quote.as_char();
        write!(self.out, "{quote}")?;
        self.escaped(value, Some(quote))?;
        write!(self.out, "{quote}")
    }

    fn escaped(&mut self, text: &str, quote: Option<char>) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in text.char_indices() {
            let entity = match c {
                '&' => "&amp;",
                '<' => "&lt;",
                '>' if quote.is_none() => "&gt;",
                '"' if quote == Some('"') => "&quot;",
                '\'' if quote == Some('\'') => "&apos;",
                _ => continue,
            };
            self.out.write_all(text[start..i].as_bytes())?;
            self.out.write_all(entity.as_bytes())?;
            start = i + c.len_utf8();
        }
        self.out.write_all(text[start..].as_bytes())
    }
}

fn qualified(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{prefix}:{}", name.local),
        None => name.local.to_string(),
    }
}

fn is_reserved(prefix: Option<&Prefix>) -> bool {
    matches!(prefix.map(|p| &**p), Some("xml" | "xmlns"))
}

// Prefixes bound to exactly one namespace across the subtree, in document
// order.
fn hoistable(handle: &Handle) -> Vec<(Prefix, Namespace)> {
    let mut seen = Vec::new();
    collect_bindings(handle, &mut seen);
    let mut out: Vec<(Prefix, Namespace)> = Vec::new();
    for (prefix, ns) in &seen {
        let conflicting = seen.iter().any(|(p, n)| p == prefix && n != ns);
        if !conflicting && !out.iter().any(|(p, _)| p == prefix) {
            out.push((prefix.clone(), ns.clone()));
        }
    }
    out
}

fn collect_bindings(handle: &Handle, out: &mut Vec<(Prefix, Namespace)>) {
    if let NodeData::Element { name, attrs, .. } = &handle.data {
        let attrs = attrs.borrow();
        let names = std::iter::once(name.clone())
            .chain(attrs.iter().map(|attr| attr.name.clone()));
        for name in names {
            if let Some(prefix) = name.prefix {
                if !is_reserved(Some(&prefix)) && !name.ns.is_empty() {
                    out.push((prefix, name.ns));
                }
            }
        }
    }
    for child in handle.children.borrow().iter() {
        collect_bindings(child, out);
    }
}
