use pulldown_cmark::{Event, Parser as CmarkParser, Tag, TagEnd};

/// Headings of a Markdown document with their byte offsets, in order.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    headings: Vec<(usize, String)>,
}

impl Outline {
    pub fn of(source: &str) -> Self {
        let mut headings = Vec::new();
        let mut current: Option<(usize, String)> = None;

        for (event, range) in CmarkParser::new(source).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { .. }) => {
                    current = Some((range.start, String::new()));
                }
                Event::Text(s) | Event::Code(s) => {
                    if let Some((_, text)) = current.as_mut() {
                        text.push_str(&s);
                    }
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((offset, text)) = current.take() {
                        let text = normalize_heading(&text);
                        if !text.is_empty() {
                            headings.push((offset, text));
                        }
                    }
                }
                _ => {}
            }
        }

        Outline { headings }
    }

    /// The closest heading that starts before `offset`.
    pub fn section_at(&self, offset: usize) -> Option<&str> {
        let idx = self.headings.partition_point(|(start, _)| *start < offset);
        idx.checked_sub(1).map(|i| self.headings[i].1.as_str())
    }
}

/// Strip leading/trailing whitespace, collapse interior whitespace.
fn normalize_heading(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
