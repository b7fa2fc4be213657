use std::{fs, path::Path};

use chrono::{DateTime, FixedOffset};
use color_eyre::eyre::eyre;
use rss::{Category, Channel, Guid, Item};
use tracing::debug;

use crate::{
    config::{FEED_ITEM_LIMIT, SiteConfig},
    post::BlogPost,
    types::{PublishTime, Tag},
};

/// Generate both RSS and Atom feeds into the given output directory.
///
/// `posts` must already be the visible, newest-first listing. `render`
/// turns a post into the HTML used as feed content.
pub fn write_feeds(
    out_dir: &Path,
    posts: &[BlogPost],
    site: &SiteConfig,
    render: impl Fn(&BlogPost) -> String,
) -> color_eyre::Result<()> {
    let entries = posts
        .iter()
        .take(FEED_ITEM_LIMIT)
        .map(|p| FeedEntry::from_post(p, site.base_url(), render(p)))
        .collect::<Vec<_>>();

    let rss_xml = build_rss(&entries, site)?;
    fs::write(out_dir.join("rss.xml"), rss_xml)?;

    let atom_xml = build_atom(&entries, site)?;
    fs::write(out_dir.join("atom.xml"), atom_xml)?;

    debug!(entries = entries.len(), "wrote feeds");
    Ok(())
}

#[derive(Clone, Debug)]
struct FeedEntry {
    title: String,
    url: String,
    author: String,
    summary: Option<String>,
    content: String,
    tags: Vec<Tag>,
    published: PublishTime,
    updated: PublishTime,
}

impl FeedEntry {
    fn from_post(post: &BlogPost, base_url: &str, content: String) -> Self {
        let base = base_url.trim_end_matches('/');
        let url = format!("{}/{}", base, post.href().as_str());
        Self {
            title: post.title.clone(),
            url,
            author: post.author.clone(),
            summary: Some(post.description.clone()).filter(|d| !d.is_empty()),
            content,
            tags: post.tags.clone(),
            published: post.pub_datetime,
            updated: post.updated(),
        }
    }
}

fn build_rss(entries: &[FeedEntry], site: &SiteConfig) -> color_eyre::Result<String> {
    let mut channel = Channel::default();
    channel.set_title(site.title.clone());
    channel.set_link(site.base_url().to_string());
    channel.set_description(site.desc.clone());

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut item = Item::default();
        item.set_title(Some(entry.title.clone()));
        item.set_link(Some(entry.url.clone()));
        item.set_guid(Some(Guid {
            value: entry.url.clone(),
            permalink: true,
        }));
        item.set_author(Some(entry.author.clone()));
        item.set_pub_date(Some(to_chrono(&entry.published)?.to_rfc2822()));
        item.set_description(entry.summary.clone());
        item.set_content(Some(entry.content.clone()));

        let cats: Vec<Category> = entry
            .tags
            .iter()
            .map(|t| {
                let mut c = Category::default();
                c.set_name(t.name().to_string());
                c
            })
            .collect();
        item.set_categories(cats);

        items.push(item);
    }

    channel.set_items(items);
    Ok(channel.to_string())
}

fn build_atom(entries: &[FeedEntry], site: &SiteConfig) -> color_eyre::Result<String> {
    let mut feed = atom_syndication::Feed::default();
    feed.set_title(site.title.clone());
    feed.set_id(site.base_url().to_string());

    // Updated is required in Atom; use the newest entry or fall back to the epoch.
    let updated = match entries.iter().map(|e| e.updated).max() {
        Some(t) => to_chrono(&t)?,
        None => DateTime::<FixedOffset>::default(),
    };
    feed.set_updated(updated);

    {
        let mut link = atom_syndication::Link::default();
        link.set_href(site.base_url().to_string());
        feed.set_links(vec![link]);
    }

    {
        let mut author = atom_syndication::Person::default();
        author.set_name(site.author.clone());
        author.set_uri(Some(site.profile.clone()).filter(|p| !p.is_empty()));
        feed.set_authors(vec![author]);
    }

    let mut atom_entries = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut e = atom_syndication::Entry::default();
        e.set_id(entry.url.clone());
        e.set_title(entry.title.clone());
        e.set_published(Some(to_chrono(&entry.published)?));
        e.set_updated(to_chrono(&entry.updated)?);

        let mut link = atom_syndication::Link::default();
        link.set_href(entry.url.clone());
        e.set_links(vec![link]);

        let mut author = atom_syndication::Person::default();
        author.set_name(entry.author.clone());
        e.set_authors(vec![author]);

        if let Some(summary) = &entry.summary {
            e.set_summary(Some(atom_syndication::Text::plain(summary.clone())));
        }

        let mut content = atom_syndication::Content::default();
        content.set_content_type(Some("html".into()));
        content.set_value(Some(entry.content.clone()));
        e.set_content(Some(content));

        let categories: Vec<atom_syndication::Category> = entry
            .tags
            .iter()
            .map(|t| {
                let mut c = atom_syndication::Category::default();
                c.set_term(t.slug().to_string());
                c.set_label(Some(t.name().to_string()));
                c
            })
            .collect();
        e.set_categories(categories);

        atom_entries.push(e);
    }

    feed.set_entries(atom_entries);
    Ok(feed.to_string())
}

fn to_chrono(t: &PublishTime) -> color_eyre::Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&t.to_rfc3339()).map_err(|e| eyre!("parse date: {e}"))
}
