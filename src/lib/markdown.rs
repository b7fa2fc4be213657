//! Markdown bodies to HTML.

use pulldown_cmark::{Options, Parser};

use crate::transformer::{WithTransformer, heading::PostHeadingTransformer};

pub fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_GFM);
    options.insert(Options::ENABLE_MATH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options
}

/// Render a post or page body. Headings are demoted below the page title.
pub fn to_html(src: &str, options: Options) -> String {
    let events = Parser::new_ext(src, options).with_transformer::<PostHeadingTransformer<'_, _>>();
    let mut rendered = String::with_capacity(src.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut rendered, events);
    rendered
}
