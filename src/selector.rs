use crate::dom::{Dom, Element, NodeId, has_class};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SimplePart {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attr { name: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Compound {
    parts: Vec<SimplePart>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        self.parts.iter().all(|part| match part {
            SimplePart::Universal => true,
            SimplePart::Tag(tag) => element.tag_name.eq_ignore_ascii_case(tag),
            SimplePart::Id(id) => element.attrs.get("id").map(String::as_str) == Some(id.as_str()),
            SimplePart::Class(class) => has_class(element, class),
            SimplePart::Attr { name, value } => match value {
                Some(expected) => element.attrs.get(name) == Some(expected),
                None => element.attrs.contains_key(name),
            },
        })
    }

    fn id_only(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [SimplePart::Id(id)] => Some(id),
            _ => None,
        }
    }
}

// Selector groups split on ','; each group is a descendant chain of compound
// selectors. Combinators other than descendant whitespace are unsupported.
pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<Compound>>> {
    let mut groups = Vec::new();
    for group in selector.split(',') {
        let group = group.trim();
        if group.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        let mut chain = Vec::new();
        for compound in group.split_whitespace() {
            chain.push(parse_compound(selector, compound)?);
        }
        if chain.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        groups.push(chain);
    }
    if groups.is_empty() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(groups)
}

fn parse_compound(selector: &str, src: &str) -> Result<Compound> {
    let chars: Vec<char> = src.chars().collect();
    let mut parts = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                parts.push(SimplePart::Universal);
                i += 1;
            }
            '#' => {
                let (name, next) = read_ident(&chars, i + 1);
                if name.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.to_string()));
                }
                parts.push(SimplePart::Id(name));
                i = next;
            }
            '.' => {
                let (name, next) = read_ident(&chars, i + 1);
                if name.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.to_string()));
                }
                parts.push(SimplePart::Class(name));
                i = next;
            }
            '[' => {
                let (part, next) = parse_attr_part(selector, &chars, i + 1)?;
                parts.push(part);
                i = next;
            }
            ch if is_ident_char(ch) => {
                let (name, next) = read_ident(&chars, i);
                parts.push(SimplePart::Tag(name.to_ascii_lowercase()));
                i = next;
            }
            _ => return Err(Error::UnsupportedSelector(selector.to_string())),
        }
    }

    if parts.is_empty() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(Compound { parts })
}

fn parse_attr_part(selector: &str, chars: &[char], at: usize) -> Result<(SimplePart, usize)> {
    let mut i = at;
    let (name, next) = read_ident(chars, i);
    if name.is_empty() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    i = next;

    if chars.get(i) == Some(&']') {
        return Ok((SimplePart::Attr { name, value: None }, i + 1));
    }

    if chars.get(i) != Some(&'=') {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    i += 1;

    let quote = match chars.get(i) {
        Some('"') => Some('"'),
        Some('\'') => Some('\''),
        _ => None,
    };

    let mut value = String::new();
    if let Some(quote) = quote {
        i += 1;
        while i < chars.len() && chars[i] != quote {
            value.push(chars[i]);
            i += 1;
        }
        if i >= chars.len() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        i += 1;
    } else {
        while i < chars.len() && chars[i] != ']' {
            value.push(chars[i]);
            i += 1;
        }
    }

    if chars.get(i) != Some(&']') {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }

    Ok((
        SimplePart::Attr {
            name,
            value: Some(value),
        },
        i + 1,
    ))
}

fn read_ident(chars: &[char], at: usize) -> (String, usize) {
    let mut i = at;
    let mut out = String::new();
    while i < chars.len() && is_ident_char(chars[i]) {
        out.push(chars[i]);
        i += 1;
    }
    (out, i)
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

impl Dom {
    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let all = self.query_selector_all(selector)?;
        Ok(all.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        if groups.len() == 1 && groups[0].len() == 1 {
            if let Some(id) = groups[0][0].id_only() {
                return Ok(self.by_id(id).into_iter().collect());
            }
        }

        let mut candidates = Vec::new();
        self.collect_elements_dfs(self.root, &mut candidates);

        Ok(candidates
            .into_iter()
            .filter(|candidate| {
                groups
                    .iter()
                    .any(|chain| self.matches_selector_chain(*candidate, chain))
            })
            .collect())
    }

    fn matches_selector_chain(&self, node_id: NodeId, chain: &[Compound]) -> bool {
        let Some((last, ancestors)) = chain.split_last() else {
            return false;
        };
        let Some(element) = self.element(node_id) else {
            return false;
        };
        if !last.matches(element) {
            return false;
        }

        let mut remaining = ancestors;
        let mut cursor = self.parent(node_id);
        while let Some(compound) = remaining.last() {
            let Some(current) = cursor else {
                return false;
            };
            if self
                .element(current)
                .map(|element| compound.matches(element))
                .unwrap_or(false)
            {
                remaining = &remaining[..remaining.len() - 1];
            }
            cursor = self.parent(current);
        }
        true
    }
}
