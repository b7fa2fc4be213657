use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{Section, eyre::eyre};
use minify_html::{Cfg, minify};
use pulldown_cmark::Options;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    config::{
        ABOUT_DIR, ABOUT_FILE, ARCHIVES_DIR, Config, INPUT_DIR, OUTPUT_DIR, POSTS_DIR, TAGS_DIR,
        load_config,
    },
    feed::write_feeds,
    header::{Document, article_og_meta, generic_og_meta},
    markdown,
    pagination::paginate,
    post::{BlogPost, featured, neighbours, recent, render_cards, render_datetime, visible_posts},
    taxonomy::{archive, posts_by_tag, unique_tags},
    templates::{Chrome, PageParts, page_shell, pager},
    types::{Href, RelPath, Tag},
    utils::{escape_attr, escape_text, prefix_to_root},
};

const ASSETS_DIR: &str = "assets";

type SourceDoc = (PathBuf, String);
type RenderedPage = (RelPath, String);

/// What a build saw, for logging and `folio check`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub total: usize,
    pub visible: usize,
    pub drafts: usize,
    pub scheduled: usize,
    pub pages: usize,
}

/// Load the site configuration under `root` and build it as of now.
pub fn build_at(root: &Path) -> color_eyre::Result<BuildReport> {
    let config = load_config(root).with_note(|| "While loading the site configuration.")?;
    build_with(root, &config, OffsetDateTime::now_utc())
}

/// Build the site under `root` with an explicit configuration and clock.
pub fn build_with(
    root: &Path,
    config: &Config,
    now: OffsetDateTime,
) -> color_eyre::Result<BuildReport> {
    let ctx = BuildCtx::load_at(root, config, now);

    Pipeline::new(ctx)
        .discover()?
        .parse()?
        .filter()
        .render()?
        .emit()
}

/// Read, parse and filter the content without writing anything.
pub fn check_with(
    root: &Path,
    config: &Config,
    now: OffsetDateTime,
) -> color_eyre::Result<BuildReport> {
    let ctx = BuildCtx::load_at(root, config, now);
    Ok(Pipeline::new(ctx).discover()?.parse()?.filter().state.report)
}

struct BuildCtx<'c> {
    config: &'c Config,
    now: OffsetDateTime,
    root: PathBuf,
    input_dir: PathBuf,
    output_dir: PathBuf,
    head_html: String,
    footer_html: String,
    parser_options: Options,
    min_cfg: Cfg,
}

impl<'c> BuildCtx<'c> {
    fn load_at(root: &Path, config: &'c Config, now: OffsetDateTime) -> Self {
        let root = root.to_path_buf();
        let input_dir = root.join(INPUT_DIR);
        let output_dir = root.join(OUTPUT_DIR);

        let head_html =
            fs::read_to_string(root.join("header").with_extension("html")).unwrap_or_default();
        let footer_html =
            fs::read_to_string(root.join("footer").with_extension("html")).unwrap_or_default();

        Self {
            config,
            now,
            root,
            input_dir,
            output_dir,
            head_html,
            footer_html,
            parser_options: markdown::parser_options(),
            min_cfg: Cfg::new(),
        }
    }

    fn chrome(&self, has_about: bool) -> Chrome<'_> {
        Chrome {
            config: self.config,
            head_common: &self.head_html,
            footer_common: &self.footer_html,
            has_about,
        }
    }

    fn page_url(&self, href: &Href) -> String {
        format!("{}/{}", self.config.site.base_url(), href.as_str())
    }
}

fn discover_sources(ctx: &BuildCtx<'_>) -> color_eyre::Result<Vec<SourceDoc>> {
    let posts_dir = ctx.input_dir.join(POSTS_DIR);
    if !posts_dir.is_dir() {
        warn!(dir = %posts_dir.display(), "no posts directory, building an empty site");
        return Ok(Vec::new());
    }

    let mut md_paths: Vec<PathBuf> = Vec::new();
    let mut walk_errors: Vec<walkdir::Error> = Vec::new();

    for item in WalkDir::new(&posts_dir) {
        match item {
            Ok(entry) => {
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "md")
                {
                    md_paths.push(entry.path().to_path_buf());
                }
            }
            Err(e) => walk_errors.push(e),
        }
    }

    if !walk_errors.is_empty() {
        return Err(eyre!(
            "Failed to open some directory entries: {walk_errors:?}"
        ));
    }

    md_paths.sort();

    let mut docs: Vec<SourceDoc> = Vec::with_capacity(md_paths.len());
    let mut file_errors: Vec<(PathBuf, std::io::Error)> = Vec::new();

    for path in md_paths {
        match fs::read_to_string(&path) {
            Ok(content) => docs.push((path, content)),
            Err(e) => file_errors.push((path, e)),
        }
    }

    if !file_errors.is_empty() {
        return Err(eyre!("Failed to open some files: {file_errors:?}"));
    }

    debug!(count = docs.len(), "discovered posts");
    Ok(docs)
}

fn discover_about(ctx: &BuildCtx<'_>) -> color_eyre::Result<Option<String>> {
    let path = ctx.input_dir.join(ABOUT_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)
        .with_note(|| format!("While reading {}", path.display()))?;
    Ok(Some(content))
}

fn parse_sources(ctx: &BuildCtx<'_>, sources: Vec<SourceDoc>) -> color_eyre::Result<Vec<BlogPost>> {
    let posts_dir = ctx.input_dir.join(POSTS_DIR);
    let mut posts = Vec::with_capacity(sources.len());
    let mut slugs: HashSet<String> = HashSet::new();

    for (full_path, content) in sources {
        let rel_in_posts = full_path
            .strip_prefix(&posts_dir)
            .map_err(|_| eyre!("Path outside the posts directory"))?;
        let rel_to_root = full_path
            .strip_prefix(&ctx.root)
            .map_err(|_| eyre!("Path outside the site root"))?;

        let doc = Document::try_from(content.as_str())
            .with_note(|| format!("While reading {}", rel_to_root.display()))?;
        let post = BlogPost::from_document(rel_in_posts, rel_to_root, doc, &ctx.config.site.author)?;

        if !slugs.insert(post.slug.clone()) {
            return Err(eyre!(
                "{}: another post already uses the slug `{}`",
                rel_to_root.display(),
                post.slug
            ));
        }
        posts.push(post);
    }

    Ok(posts)
}

fn filter_posts(ctx: &BuildCtx<'_>, posts: &[BlogPost]) -> (Vec<BlogPost>, BuildReport) {
    let visible = visible_posts(posts, ctx.now, ctx.config.site.scheduled_post_margin);
    let drafts = posts.iter().filter(|p| p.draft).count();
    let report = BuildReport {
        total: posts.len(),
        visible: visible.len(),
        drafts,
        scheduled: posts.len() - drafts - visible.len(),
        pages: 0,
    };
    info!(
        total = report.total,
        visible = report.visible,
        drafts = report.drafts,
        scheduled = report.scheduled,
        "filtered posts"
    );
    (visible, report)
}

fn render_site(
    ctx: &BuildCtx<'_>,
    visible: &[BlogPost],
    about: Option<&Document>,
) -> Vec<RenderedPage> {
    let chrome = ctx.chrome(about.is_some());
    let mut pages: Vec<RenderedPage> = Vec::new();

    pages.push(render_home(ctx, &chrome, visible));
    pages.extend(render_post_listing(ctx, &chrome, visible));
    for (i, post) in visible.iter().enumerate() {
        pages.push(render_post(ctx, &chrome, visible, i, post));
    }
    pages.extend(render_tags(ctx, &chrome, visible));
    if ctx.config.site.show_archives {
        pages.push(render_archives(ctx, &chrome, visible));
    }
    if let Some(doc) = about {
        pages.push(render_about(ctx, &chrome, doc));
    }

    pages
}

fn wrap(
    ctx: &BuildCtx<'_>,
    chrome: &Chrome<'_>,
    rel: RelPath,
    title: &str,
    head_fragment: Option<String>,
    body: &str,
) -> RenderedPage {
    let prefix = prefix_to_root(rel.as_path());
    let head_fragment =
        head_fragment.unwrap_or_else(|| generic_og_meta(title, &ctx.page_url(&Href::from_rel(&rel)), &ctx.config.site));
    let html = page_shell(
        chrome,
        &PageParts {
            href_prefix: &prefix,
            title,
            head_fragment: &head_fragment,
            body,
        },
    );
    (rel, html)
}

fn render_home(ctx: &BuildCtx<'_>, chrome: &Chrome<'_>, visible: &[BlogPost]) -> RenderedPage {
    let site = &ctx.config.site;
    let rel = RelPath::root_index();
    let prefix = prefix_to_root(rel.as_path());

    let mut body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n",
        escape_text(&site.title),
        escape_text(&site.desc)
    );

    let featured_posts = featured(visible);
    if !featured_posts.is_empty() {
        body.push_str("<section id=\"featured\"><h2>Featured</h2>\n");
        body.push_str(&render_cards(featured_posts, &prefix));
        body.push_str("</section>\n");
    }

    let recent_posts = recent(visible, site.post_per_index.get());
    if !recent_posts.is_empty() {
        body.push_str("<section id=\"recent-posts\"><h2>Recent Posts</h2>\n");
        body.push_str(&render_cards(recent_posts, &prefix));
        body.push_str("</section>\n");
    }

    body.push_str(&format!(
        r#"<p class="all-posts"><a href="{}{POSTS_DIR}/index.html">All Posts</a></p>"#,
        escape_attr(&prefix)
    ));

    let title = site.title.clone();
    wrap(ctx, chrome, rel, &title, None, &body)
}

/// `dir/[sub/]index.html` for the first page, `dir/[sub/]page/N/index.html`
/// after that.
fn listing_rel(dir: &str, sub: Option<&str>, index: usize) -> RelPath {
    let number = (index + 1).to_string();
    let mut segments: Vec<&str> = sub.into_iter().collect();
    if index > 0 {
        segments.push("page");
        segments.push(&number);
    }
    RelPath::index_under(dir, segments)
}

fn render_listing(
    ctx: &BuildCtx<'_>,
    chrome: &Chrome<'_>,
    posts: &[BlogPost],
    dir: &str,
    sub: Option<&str>,
    heading: &str,
) -> Vec<RenderedPage> {
    paginate(posts, ctx.config.site.post_per_page)
        .map(|page| {
            let rel = listing_rel(dir, sub, page.index);
            let prefix = prefix_to_root(rel.as_path());

            let mut body = format!("<h1>{}</h1>\n", escape_text(heading));
            if page.items.is_empty() {
                body.push_str("<p>No posts yet.</p>\n");
            }
            body.push_str(&render_cards(page.items, &prefix));
            body.push_str(&pager(&page, |i| {
                format!("{prefix}{}", Href::from_rel(&listing_rel(dir, sub, i)))
            }));

            let title = if page.is_first() {
                heading.to_string()
            } else {
                format!("{heading} (page {})", page.number())
            };
            wrap(ctx, chrome, rel, &title, None, &body)
        })
        .collect()
}

fn render_post_listing(
    ctx: &BuildCtx<'_>,
    chrome: &Chrome<'_>,
    visible: &[BlogPost],
) -> Vec<RenderedPage> {
    render_listing(ctx, chrome, visible, POSTS_DIR, None, "Posts")
}

fn render_post(
    ctx: &BuildCtx<'_>,
    chrome: &Chrome<'_>,
    visible: &[BlogPost],
    index: usize,
    post: &BlogPost,
) -> RenderedPage {
    let rel = post.rel_out();
    let prefix = prefix_to_root(rel.as_path());

    let mut body = format!("<h1>{}</h1>\n", escape_text(&post.title));
    body.push_str(&render_datetime(post));
    body.push_str(&render_tag_links(&post.tags, &prefix));
    body.push_str("\n<div class=\"prose\">\n");
    body.push_str(&markdown::to_html(&post.body, ctx.parser_options));
    body.push_str("</div>\n");

    if let Some(edit) = &ctx.config.site.edit_post {
        body.push_str(&format!(
            r#"<p class="edit-post"><a href="{}" rel="noopener">{}</a></p>"#,
            escape_attr(&edit.href_for(&post.source_path)),
            escape_text(&edit.text)
        ));
    }

    let (newer, older) = neighbours(visible, index);
    if newer.is_some() || older.is_some() {
        body.push_str(r#"<nav class="post-nav">"#);
        if let Some(p) = newer {
            body.push_str(&format!(
                r#"<a rel="prev" href="{}{}">Newer: {}</a>"#,
                escape_attr(&prefix),
                p.href(),
                escape_text(&p.title)
            ));
        }
        if let Some(p) = older {
            body.push_str(&format!(
                r#"<a rel="next" href="{}{}">Older: {}</a>"#,
                escape_attr(&prefix),
                p.href(),
                escape_text(&p.title)
            ));
        }
        body.push_str("</nav>\n");
    }

    let meta = article_og_meta(post, &ctx.page_url(&post.href()), &ctx.config.site);
    wrap(ctx, chrome, rel, &post.title, Some(meta), &body)
}

fn tag_href(tag: &Tag, prefix: &str) -> String {
    format!(
        "{prefix}{}",
        Href::from_rel(&RelPath::index_under(TAGS_DIR, [tag.slug()]))
    )
}

fn render_tag_links(tags: &[Tag], prefix: &str) -> String {
    let links: Vec<String> = tags
        .iter()
        .map(|t| {
            format!(
                r#"<a class="tag" href="{}">#{}</a>"#,
                escape_attr(&tag_href(t, prefix)),
                escape_text(t.name())
            )
        })
        .collect();
    format!(r#"<p class="tags">{}</p>"#, links.join(" "))
}

fn render_tags(ctx: &BuildCtx<'_>, chrome: &Chrome<'_>, visible: &[BlogPost]) -> Vec<RenderedPage> {
    let tags = unique_tags(visible);
    let mut pages = Vec::with_capacity(tags.len() + 1);

    let rel = RelPath::dir_index(TAGS_DIR);
    let prefix = prefix_to_root(rel.as_path());
    let mut body = String::from("<h1>Tags</h1>\n<ul class=\"tag-list\">\n");
    for (tag, count) in &tags {
        body.push_str(&format!(
            r#"<li><a href="{}">#{}</a> <span class="count">({count})</span></li>"#,
            escape_attr(&tag_href(tag, &prefix)),
            escape_text(tag.name())
        ));
        body.push('\n');
    }
    body.push_str("</ul>\n");
    pages.push(wrap(ctx, chrome, rel, "Tags", None, &body));

    for (tag, _) in &tags {
        let tagged = posts_by_tag(visible, tag);
        pages.extend(render_listing(
            ctx,
            chrome,
            &tagged,
            TAGS_DIR,
            Some(tag.slug()),
            &format!("Tag: {}", tag.name()),
        ));
    }

    pages
}

fn render_archives(ctx: &BuildCtx<'_>, chrome: &Chrome<'_>, visible: &[BlogPost]) -> RenderedPage {
    let rel = RelPath::dir_index(ARCHIVES_DIR);
    let prefix = prefix_to_root(rel.as_path());

    let mut body = String::from("<h1>Archives</h1>\n");
    for year in archive(visible) {
        body.push_str(&format!("<h2>{}</h2>\n", year.year));
        for month in &year.months {
            body.push_str(&format!(
                "<h3>{} <sup>{}</sup></h3>\n",
                month.month,
                month.posts.len()
            ));
            body.push_str(&render_cards(month.posts.iter().copied(), &prefix));
        }
    }

    wrap(ctx, chrome, rel, "Archives", None, &body)
}

fn render_about(ctx: &BuildCtx<'_>, chrome: &Chrome<'_>, doc: &Document) -> RenderedPage {
    let rel = RelPath::dir_index(ABOUT_DIR);
    let title = doc.header.title().unwrap_or("About");

    let mut body = format!("<h1>{}</h1>\n", escape_text(title));
    body.push_str(&markdown::to_html(&doc.body, ctx.parser_options));

    let title = title.to_string();
    wrap(ctx, chrome, rel, &title, None, &body)
}

fn emit_site(ctx: &BuildCtx<'_>, pages: Vec<RenderedPage>, visible: &[BlogPost]) -> color_eyre::Result<usize> {
    reset_output_dir(&ctx.output_dir)?;

    let written = pages.len();
    for (rel, page_html) in pages {
        let out_path = ctx.output_dir.join(rel.as_path());
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, minify(page_html.as_bytes(), &ctx.min_cfg))
            .with_note(|| format!("While writing {}", out_path.display()))?;
        debug!(path = %rel.as_path().display(), "wrote page");
    }

    write_feeds(&ctx.output_dir, visible, &ctx.config.site, |p| {
        markdown::to_html(&p.body, ctx.parser_options)
    })
    .with_note(|| "While writing feeds.")?;

    let stylesheet_in_path = ctx.root.join("style").with_extension("css");
    if stylesheet_in_path.exists() {
        fs::copy(&stylesheet_in_path, ctx.output_dir.join("style").with_extension("css"))?;
    }

    copy_assets(ctx)?;

    Ok(written)
}

/// Start every build from an empty output directory, so pages for posts that
/// became drafts, moved or were deleted do not linger.
fn reset_output_dir(output_dir: &Path) -> color_eyre::Result<()> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)
            .with_note(|| format!("While clearing {}", output_dir.display()))?;
        debug!(path = %output_dir.display(), "cleared previous output");
    }
    fs::create_dir_all(output_dir)?;
    Ok(())
}

/// Copy `assets/` from the site root verbatim.
fn copy_assets(ctx: &BuildCtx<'_>) -> color_eyre::Result<()> {
    let assets_dir = ctx.root.join(ASSETS_DIR);
    if !assets_dir.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(&assets_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(&ctx.root)
            .map_err(|_| eyre!("Asset outside the site root"))?;
        let dest = ctx.output_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
    }
    Ok(())
}

trait PipelineStage {}
/// Pipeline typestate driver
struct Pipeline<'c, S: PipelineStage> {
    ctx: BuildCtx<'c>,
    state: S,
}

impl PipelineStage for () {}
struct Discovered {
    posts: Vec<SourceDoc>,
    about: Option<String>,
}
impl PipelineStage for Discovered {}
struct Parsed {
    posts: Vec<BlogPost>,
    about: Option<Document>,
}
impl PipelineStage for Parsed {}
struct Filtered {
    visible: Vec<BlogPost>,
    about: Option<Document>,
    report: BuildReport,
}
impl PipelineStage for Filtered {}
struct Rendered {
    pages: Vec<RenderedPage>,
    visible: Vec<BlogPost>,
    report: BuildReport,
}
impl PipelineStage for Rendered {}

// initial state
impl<'c> Pipeline<'c, ()> {
    fn new(ctx: BuildCtx<'c>) -> Self {
        Self { ctx, state: () }
    }

    fn discover(self) -> color_eyre::Result<Pipeline<'c, Discovered>> {
        let posts = discover_sources(&self.ctx)?;
        let about = discover_about(&self.ctx)?;
        Ok(Pipeline {
            ctx: self.ctx,
            state: Discovered { posts, about },
        })
    }
}

impl<'c> Pipeline<'c, Discovered> {
    fn parse(self) -> color_eyre::Result<Pipeline<'c, Parsed>> {
        let posts = parse_sources(&self.ctx, self.state.posts)?;
        let about = self
            .state
            .about
            .as_deref()
            .map(Document::try_from)
            .transpose()
            .with_note(|| format!("While reading {INPUT_DIR}/{ABOUT_FILE}"))?;
        Ok(Pipeline {
            ctx: self.ctx,
            state: Parsed { posts, about },
        })
    }
}

impl<'c> Pipeline<'c, Parsed> {
    fn filter(self) -> Pipeline<'c, Filtered> {
        let (visible, report) = filter_posts(&self.ctx, &self.state.posts);
        Pipeline {
            ctx: self.ctx,
            state: Filtered {
                visible,
                about: self.state.about,
                report,
            },
        }
    }
}

impl<'c> Pipeline<'c, Filtered> {
    fn render(self) -> color_eyre::Result<Pipeline<'c, Rendered>> {
        let pages = render_site(&self.ctx, &self.state.visible, self.state.about.as_ref());
        Ok(Pipeline {
            ctx: self.ctx,
            state: Rendered {
                pages,
                visible: self.state.visible,
                report: self.state.report,
            },
        })
    }
}

impl<'c> Pipeline<'c, Rendered> {
    fn emit(self) -> color_eyre::Result<BuildReport> {
        let pages = emit_site(&self.ctx, self.state.pages, &self.state.visible)?;
        info!(pages, output = %self.ctx.output_dir.display(), "site written");
        Ok(BuildReport {
            pages,
            ..self.state.report
        })
    }
}

#[cfg(test)]
mod tests;
