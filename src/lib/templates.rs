//! Page chrome shared by every generated page.

use crate::{
    config::{ABOUT_DIR, ARCHIVES_DIR, Config, POSTS_DIR, TAGS_DIR},
    pagination::Page,
    utils::{escape_attr, escape_text},
};

/// Drives `#theme-btn`: cycles the `data-theme` attribute on `<html>` and
/// remembers the choice. Without a stored choice the system preference wins.
const THEME_SCRIPT: &str = r#"<script>
(function () {
  var key = "theme";
  var root = document.documentElement;
  var stored = localStorage.getItem(key);
  var prefersDark = window.matchMedia("(prefers-color-scheme: dark)").matches;
  var theme = stored || (prefersDark ? "dark" : "light");
  root.setAttribute("data-theme", theme);
  var btn = document.getElementById("theme-btn");
  if (!btn) return;
  btn.setAttribute("aria-label", theme);
  btn.addEventListener("click", function () {
    theme = theme === "dark" ? "light" : "dark";
    root.setAttribute("data-theme", theme);
    btn.setAttribute("aria-label", theme);
    localStorage.setItem(key, theme);
  });
})();
</script>"#;

/// Site-wide pieces that wrap every page.
pub struct Chrome<'a> {
    pub config: &'a Config,
    /// Extra `<head>` markup from `header.html` at the site root.
    pub head_common: &'a str,
    /// Extra markup from `footer.html` at the site root.
    pub footer_common: &'a str,
    pub has_about: bool,
}

/// One page to wrap in the chrome.
pub struct PageParts<'a> {
    /// Leads from the page back to the output root, e.g. `../../`.
    pub href_prefix: &'a str,
    pub title: &'a str,
    /// Page-specific `<head>` markup (social meta and the like).
    pub head_fragment: &'a str,
    pub body: &'a str,
}

/// Basic HTML shell shared by pages.
pub fn page_shell(chrome: &Chrome<'_>, page: &PageParts<'_>) -> String {
    let config = chrome.config;
    let prefix = page.href_prefix;
    let full_title = if page.title == config.site.title {
        escape_text(page.title)
    } else {
        format!(
            "{} | {}",
            escape_text(page.title),
            escape_text(&config.site.title)
        )
    };
    let (color_scheme, theme_script) = if config.site.light_and_dark_mode {
        (
            "\n<meta name=\"color-scheme\" content=\"light dark\">",
            THEME_SCRIPT,
        )
    } else {
        ("", "")
    };

    format!(
        r#"<!doctype html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="author" content="{author}">{color_scheme}{og_locale}
<title>{full_title}</title>
<link rel="stylesheet" href="{prefix}style.css">
<link rel="alternate" type="application/rss+xml" title="{site_title}" href="{prefix}rss.xml">
{head_common}
{head_fragment}
</head>
<body>
{header}
<main>
<article>
<section>
{body}
</section>
</article>
</main>
{footer}
{footer_common}
{theme_script}
</body>
</html>
"#,
        lang = escape_attr(&config.locale.lang),
        author = escape_attr(&config.site.author),
        site_title = escape_attr(&config.site.title),
        head_common = chrome.head_common,
        head_fragment = page.head_fragment,
        header = site_header(chrome, prefix),
        body = page.body,
        footer = site_footer(config, prefix),
        footer_common = chrome.footer_common,
        og_locale = og_locale(&config.locale.lang_tag),
    )
}

fn site_header(chrome: &Chrome<'_>, prefix: &str) -> String {
    let config = chrome.config;
    let brand = if config.logo.enable {
        format!(
            r#"<img src="{}{}" alt="{}" width="{}" height="{}">"#,
            escape_attr(prefix),
            config.logo.src(),
            escape_attr(&config.site.title),
            config.logo.width,
            config.logo.height
        )
    } else {
        escape_text(&config.site.title)
    };

    let mut nav = String::new();
    let mut link = |dir: &str, label: &str| {
        nav.push_str(&format!(
            r#"<li><a href="{}{dir}/index.html">{label}</a></li>"#,
            escape_attr(prefix)
        ));
    };
    link(POSTS_DIR, "Posts");
    link(TAGS_DIR, "Tags");
    if config.site.show_archives {
        link(ARCHIVES_DIR, "Archives");
    }
    if chrome.has_about {
        link(ABOUT_DIR, "About");
    }
    if config.site.light_and_dark_mode {
        nav.push_str(
            r#"<li><button id="theme-btn" type="button" title="Toggles light &amp; dark" aria-label="auto" aria-live="polite">Theme</button></li>"#,
        );
    }

    format!(
        r#"<header>
<a class="brand" href="{}index.html">{brand}</a>
<nav><ul>{nav}</ul></nav>
{socials}
</header>"#,
        escape_attr(prefix),
        socials = social_links(config)
    )
}

/// `og:locale` wants `en_US`, language tags are written `en-US`. The first
/// tag is the page locale, the rest are alternates.
fn og_locale(lang_tags: &[String]) -> String {
    let mut out = String::new();
    for (i, tag) in lang_tags.iter().enumerate() {
        let property = if i == 0 { "og:locale" } else { "og:locale:alternate" };
        out.push_str(&format!(
            "\n<meta property=\"{property}\" content=\"{}\">",
            escape_attr(&tag.replace('-', "_"))
        ));
    }
    out
}

fn site_footer(config: &Config, prefix: &str) -> String {
    let author = escape_text(&config.site.author);
    let byline = if config.site.profile.is_empty() {
        author
    } else {
        format!(
            r#"<a href="{}">{author}</a>"#,
            escape_attr(&config.site.profile)
        )
    };
    format!(
        r#"<footer>
{socials}
<p>&copy; {byline} · <a href="{prefix}rss.xml">RSS</a></p>
</footer>"#,
        socials = social_links(config),
        prefix = escape_attr(prefix),
    )
}

/// Active social links in configured order.
pub fn social_links(config: &Config) -> String {
    let items: String = config
        .socials
        .iter()
        .filter(|s| s.active)
        .map(|s| {
            format!(
                r#"<li><a class="{}" href="{}" title="{}" rel="me noopener">{}</a></li>"#,
                s.name.icon_class(),
                escape_attr(&s.href),
                escape_attr(&s.display_title(&config.site.title)),
                escape_text(s.name.as_str())
            )
        })
        .collect();
    if items.is_empty() {
        return String::new();
    }
    format!(r#"<ul class="socials">{items}</ul>"#)
}

/// Previous/next links for a paginated listing. `href_for` maps a zero-based
/// page index to a link relative to the current page.
pub fn pager<T>(page: &Page<'_, T>, href_for: impl Fn(usize) -> String) -> String {
    if page.total <= 1 {
        return String::new();
    }
    let mut out = String::from(r#"<nav class="pagination" aria-label="Pagination">"#);
    if !page.is_first() {
        out.push_str(&format!(
            r#"<a rel="prev" href="{}">Prev</a>"#,
            escape_attr(&href_for(page.index - 1))
        ));
    }
    out.push_str(&format!(
        r#"<span class="page-count">{} / {}</span>"#,
        page.number(),
        page.total
    ));
    if !page.is_last() {
        out.push_str(&format!(
            r#"<a rel="next" href="{}">Next</a>"#,
            escape_attr(&href_for(page.index + 1))
        ));
    }
    out.push_str("</nav>");
    out
}
