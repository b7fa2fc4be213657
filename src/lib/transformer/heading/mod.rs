use std::collections::{HashSet, VecDeque};

use pulldown_cmark::{CowStr, Event, HeadingLevel, Tag, TagEnd};

use crate::{transformer::Transformer, utils::slugify};

/// Prepares post headings for a page that already has an `<h1>` title.
///
/// Every heading moves down one level (h6 stays h6) and gets a unique
/// slug id, so sections can be linked to. Ids written in the markdown
/// (`# Title {#custom}`) are kept.
pub struct PostHeadingTransformer<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    inner: I,
    pending: VecDeque<Event<'a>>,
    seen: HashSet<String>,
}

impl<'a, I> Iterator for PostHeadingTransformer<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(ev) = self.pending.pop_front() {
            return Some(ev);
        }

        match self.inner.next()? {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let mut text = String::new();
                let mut body = Vec::new();
                for ev in self.inner.by_ref() {
                    if let Event::End(TagEnd::Heading(_)) = ev {
                        break;
                    }
                    if let Event::Text(t) | Event::Code(t) = &ev {
                        text.push_str(t);
                    }
                    body.push(ev);
                }

                let id = match id {
                    Some(id) => {
                        self.seen.insert(id.to_string());
                        id
                    }
                    None => CowStr::from(self.unique_id(&text)),
                };

                let level = demote(level);
                self.pending.extend(body);
                self.pending.push_back(Event::End(TagEnd::Heading(level)));
                Some(Event::Start(Tag::Heading {
                    level,
                    id: Some(id),
                    classes,
                    attrs,
                }))
            }
            other => Some(other),
        }
    }
}

impl<'a, I> PostHeadingTransformer<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    fn unique_id(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.seen.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        self.seen.insert(candidate.clone());
        candidate
    }
}

fn demote(level: HeadingLevel) -> HeadingLevel {
    match level {
        HeadingLevel::H1 => HeadingLevel::H2,
        HeadingLevel::H2 => HeadingLevel::H3,
        HeadingLevel::H3 => HeadingLevel::H4,
        HeadingLevel::H4 => HeadingLevel::H5,
        HeadingLevel::H5 | HeadingLevel::H6 => HeadingLevel::H6,
    }
}

impl<'a, I> Transformer<'a, I> for PostHeadingTransformer<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    fn transform(inner: I) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
            seen: HashSet::new(),
        }
    }
}
