use color_eyre::Section;
use gray_matter::{Matter, engine::YAML};
use serde::Deserialize;

use crate::{
    config::SiteConfig,
    post::BlogPost,
    types::{PublishTime, Tag},
    utils::{absolute_url, escape_attr},
};

/// YAML front matter of a content file.
#[derive(Deserialize, Default, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct Header {
    title: Option<String>,
    author: Option<String>,
    #[serde(alias = "ctime")]
    pub_datetime: Option<String>,
    #[serde(alias = "mtime")]
    mod_datetime: Option<String>,
    description: Option<String>,
    featured: bool,
    draft: bool,
    tags: Option<Vec<String>>,
    #[serde(alias = "image")]
    og_image: Option<String>,
    #[serde(rename = "canonicalURL")]
    canonical_url: Option<String>,
}

/// A content file split into its front matter and markdown body.
#[derive(Debug)]
pub struct Document {
    pub header: Header,
    pub body: String,
}

impl TryFrom<&str> for Document {
    type Error = color_eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let matter = Matter::<YAML>::new();
        matter
            .parse::<Header>(value)
            .with_note(|| "While parsing frontmatter.")
            .map(|res| Document {
                header: res.data.unwrap_or_default(),
                body: res.content,
            })
    }
}

impl Header {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn raw_pub_datetime(&self) -> Option<&str> {
        self.pub_datetime.as_deref()
    }

    pub fn pub_datetime(&self) -> Option<PublishTime> {
        self.pub_datetime.as_deref().and_then(PublishTime::parse)
    }

    pub fn mod_datetime(&self) -> Option<PublishTime> {
        self.mod_datetime.as_deref().and_then(PublishTime::parse)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn featured(&self) -> bool {
        self.featured
    }

    pub fn draft(&self) -> bool {
        self.draft
    }

    /// Parsed tags in front-matter order, duplicates dropped. Falls back to
    /// the default tag when nothing usable is listed.
    pub fn tags(&self) -> Vec<Tag> {
        let mut parsed: Vec<Tag> = Vec::new();
        for tag in self.tags.as_deref().unwrap_or(&[]).iter().filter_map(|t| Tag::parse(t)) {
            if !parsed.contains(&tag) {
                parsed.push(tag);
            }
        }
        if parsed.is_empty() {
            parsed.push(Tag::fallback());
        }
        parsed
    }

    pub fn og_image(&self) -> Option<&str> {
        self.og_image.as_deref()
    }

    pub fn canonical_url(&self) -> Option<&str> {
        self.canonical_url.as_deref()
    }
}

/// Render OpenGraph + Twitter meta tags for a post page.
pub fn article_og_meta(post: &BlogPost, page_url: &str, site: &SiteConfig) -> String {
    let url = post.canonical_url.as_deref().unwrap_or(page_url);
    let image_url = post
        .og_image
        .as_deref()
        .or(site.og_image.as_deref())
        .map(|img| absolute_url(site.base_url(), img));

    let mut out = render_social_meta(
        &post.title,
        &post.description,
        url,
        "article",
        &post.author,
        image_url.as_deref(),
    );
    out.push_str(&format!(
        r#"
<meta property="article:published_time" content="{}">"#,
        escape_attr(&post.pub_datetime.to_rfc3339())
    ));
    if let Some(modified) = &post.mod_datetime {
        out.push_str(&format!(
            r#"
<meta property="article:modified_time" content="{}">"#,
            escape_attr(&modified.to_rfc3339())
        ));
    }
    out
}

/// Render OpenGraph + Twitter meta tags for non-article pages (e.g., index, tag listings).
pub fn generic_og_meta(page_title: &str, page_url: &str, site: &SiteConfig) -> String {
    let image_url = site
        .og_image
        .as_deref()
        .map(|img| absolute_url(site.base_url(), img));

    render_social_meta(
        page_title,
        &site.desc,
        page_url,
        "website",
        &site.author,
        image_url.as_deref(),
    )
}

fn render_social_meta(
    title: &str,
    description: &str,
    url: &str,
    og_type: &str,
    creator: &str,
    image_url: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        r#"
<meta name="description" content="{}">"#,
        escape_attr(description)
    ));
    out.push_str(&format!(
        r#"
<meta property="og:title" content="{}">"#,
        escape_attr(title)
    ));
    out.push_str(&format!(
        r#"
<meta property="og:description" content="{}">"#,
        escape_attr(description)
    ));
    out.push_str(&format!(
        r#"
<meta property="og:type" content="{}">"#,
        escape_attr(og_type)
    ));
    out.push_str(&format!(
        r#"
<meta property="og:url" content="{}">"#,
        escape_attr(url)
    ));
    if let Some(img) = image_url {
        out.push_str(&format!(
            r#"
<meta property="og:image" content="{}">"#,
            escape_attr(img)
        ));
        out.push_str(&format!(
            r#"
<meta name="twitter:image" content="{}">"#,
            escape_attr(img)
        ));
    }
    out.push_str(
        r#"
<meta name="twitter:card" content="summary_large_image">"#,
    );
    out.push_str(&format!(
        r#"
<meta name="twitter:title" content="{}">"#,
        escape_attr(title)
    ));
    out.push_str(&format!(
        r#"
<meta name="twitter:description" content="{}">"#,
        escape_attr(description)
    ));
    out.push_str(&format!(
        r#"
<meta name="twitter:creator" content="{}">"#,
        escape_attr(creator)
    ));
    out.push_str(&format!(
        r#"
<link rel="canonical" href="{}">"#,
        escape_attr(url)
    ));
    out
}
