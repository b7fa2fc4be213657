//! Site configuration.
//!
//! The built-in defaults below describe the site. A `site.toml` at the site
//! root may override any of them; keys it leaves out keep the built-in value.
//! Everything is validated once, up front, and the resulting [`Config`] is
//! passed by reference to whatever needs it.

use std::{fs, num::NonZeroUsize, path::Path};

use serde::Deserialize;
use time::Duration;
use tracing::info;
use url::Url;

use crate::{
    error::ConfigError,
    social::{RawSocialLink, SocialLink, validate_socials},
};

pub const INPUT_DIR: &str = "contents";
pub const OUTPUT_DIR: &str = "public";
pub const POSTS_DIR: &str = "posts";
pub const TAGS_DIR: &str = "tags";
pub const ARCHIVES_DIR: &str = "archives";
pub const ABOUT_DIR: &str = "about";
pub const ABOUT_FILE: &str = "about.md";
pub const CONFIG_FILE: &str = "site.toml";

// Site-wide metadata.
pub const SITE_WEBSITE: &str = "https://folio.example.com/";
pub const SITE_AUTHOR: &str = "Minh Tran";
pub const SITE_PROFILE: &str = "https://folio.example.com/about/";
pub const SITE_DESC: &str = "Notes on competitive programming, algorithms and whatever else I am learning.";
pub const SITE_TITLE: &str = "Folio";
// Fallback image for OpenGraph/Twitter cards.
pub const SITE_OG_IMAGE: Option<&str> = Some("og.jpg");
pub const SITE_LIGHT_AND_DARK_MODE: bool = true;
pub const SITE_POST_PER_INDEX: i64 = 4;
pub const SITE_POST_PER_PAGE: i64 = 4;
// Fifteen minutes.
pub const SITE_SCHEDULED_POST_MARGIN_MS: i64 = 15 * 60 * 1000;
pub const SITE_SHOW_ARCHIVES: bool = true;
pub const SITE_EDIT_POST_URL: &str = "https://github.com/minhtran/folio/edit/main/";
pub const SITE_EDIT_POST_TEXT: &str = "Suggest Changes";

pub const LOCALE_LANG: &str = "en";
pub const LOCALE_LANG_TAGS: &[&str] = &["en-US"];

pub const LOGO_ENABLE: bool = false;
pub const LOGO_SVG: bool = true;
pub const LOGO_WIDTH: u32 = 216;
pub const LOGO_HEIGHT: u32 = 46;

/// `(name, href, link title, active)`, in display order.
pub const DEFAULT_SOCIALS: &[(&str, &str, &str, bool)] = &[
    ("Github", "https://github.com/minhtran", "{title} on Github", true),
    ("LinkedIn", "https://www.linkedin.com/in/minhtran/", "{title} on LinkedIn", true),
    ("Mail", "mailto:minh@folio.example.com", "Send an email to {title}", true),
    ("X", "https://x.com/minhtran", "{title} on X", false),
];

// Maximum number of items to include in feeds.
pub const FEED_ITEM_LIMIT: usize = 50;

/// Everything the site needs to know about itself.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: SiteConfig,
    pub locale: LocaleConfig,
    pub logo: LogoConfig,
    pub socials: Vec<SocialLink>,
}

#[derive(Clone, Debug)]
pub struct SiteConfig {
    pub website: Url,
    pub author: String,
    pub profile: String,
    pub desc: String,
    pub title: String,
    pub og_image: Option<String>,
    pub light_and_dark_mode: bool,
    pub post_per_index: NonZeroUsize,
    pub post_per_page: NonZeroUsize,
    pub scheduled_post_margin: Duration,
    pub show_archives: bool,
    pub edit_post: Option<EditPost>,
}

impl SiteConfig {
    /// Website URL without the trailing slash, for joining paths onto.
    pub fn base_url(&self) -> &str {
        self.website.as_str().trim_end_matches('/')
    }
}

/// Template for the "edit this post" link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditPost {
    pub url: String,
    pub text: String,
    pub append_file_path: bool,
}

impl EditPost {
    pub fn href_for(&self, source_path: &str) -> String {
        if self.append_file_path {
            format!("{}{}", self.url, source_path.trim_start_matches('/'))
        } else {
            self.url.clone()
        }
    }
}

/// An empty `lang_tag` list means "use the environment default".
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LocaleConfig {
    pub lang: String,
    pub lang_tag: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            lang: LOCALE_LANG.to_string(),
            lang_tag: LOCALE_LANG_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogoConfig {
    pub enable: bool,
    pub svg: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            enable: LOGO_ENABLE,
            svg: LOGO_SVG,
            width: LOGO_WIDTH,
            height: LOGO_HEIGHT,
        }
    }
}

impl LogoConfig {
    pub fn src(&self) -> &'static str {
        if self.svg {
            "assets/logo.svg"
        } else {
            "assets/logo.png"
        }
    }
}

/// `site.toml` as written, before validation.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub site: RawSiteConfig,
    pub locale: LocaleConfig,
    pub logo: LogoConfig,
    pub socials: Vec<RawSocialLink>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            site: RawSiteConfig::default(),
            locale: LocaleConfig::default(),
            logo: LogoConfig::default(),
            socials: DEFAULT_SOCIALS
                .iter()
                .map(|(name, href, title, active)| RawSocialLink {
                    name: name.to_string(),
                    href: href.to_string(),
                    link_title: title.to_string(),
                    active: *active,
                })
                .collect(),
        }
    }
}

/// Counts are signed here so that `postPerPage = 0` or `-1` reaches
/// validation instead of failing as a type error.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RawSiteConfig {
    pub website: String,
    pub author: String,
    pub profile: String,
    pub desc: String,
    pub title: String,
    pub og_image: Option<String>,
    pub light_and_dark_mode: bool,
    pub post_per_index: i64,
    pub post_per_page: i64,
    pub scheduled_post_margin: i64,
    pub show_archives: bool,
    pub edit_post: RawEditPost,
}

impl Default for RawSiteConfig {
    fn default() -> Self {
        Self {
            website: SITE_WEBSITE.to_string(),
            author: SITE_AUTHOR.to_string(),
            profile: SITE_PROFILE.to_string(),
            desc: SITE_DESC.to_string(),
            title: SITE_TITLE.to_string(),
            og_image: SITE_OG_IMAGE.map(|s| s.to_string()),
            light_and_dark_mode: SITE_LIGHT_AND_DARK_MODE,
            post_per_index: SITE_POST_PER_INDEX,
            post_per_page: SITE_POST_PER_PAGE,
            scheduled_post_margin: SITE_SCHEDULED_POST_MARGIN_MS,
            show_archives: SITE_SHOW_ARCHIVES,
            edit_post: RawEditPost::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RawEditPost {
    pub enabled: bool,
    pub url: String,
    pub text: String,
    pub append_file_path: bool,
}

impl Default for RawEditPost {
    fn default() -> Self {
        Self {
            enabled: true,
            url: SITE_EDIT_POST_URL.to_string(),
            text: SITE_EDIT_POST_TEXT.to_string(),
            append_file_path: true,
        }
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let site = SiteConfig::try_from(raw.site)?;
        validate_locale(&raw.locale)?;
        let socials = validate_socials(raw.socials)?;
        Ok(Self {
            site,
            locale: raw.locale,
            logo: raw.logo,
            socials,
        })
    }
}

impl TryFrom<RawSiteConfig> for SiteConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSiteConfig) -> Result<Self, Self::Error> {
        let website = parse_http_url("website", &raw.website)?;
        if !raw.profile.is_empty() {
            parse_http_url("profile", &raw.profile)?;
        }
        let author = non_empty("author", raw.author)?;
        let title = non_empty("title", raw.title)?;
        let post_per_index = positive("postPerIndex", raw.post_per_index)?;
        let post_per_page = positive("postPerPage", raw.post_per_page)?;

        if raw.scheduled_post_margin < 0 {
            return Err(ConfigError::field(
                "scheduledPostMargin",
                format!("must not be negative, got {}", raw.scheduled_post_margin),
            ));
        }

        let edit_post = if raw.edit_post.enabled {
            parse_http_url("editPost.url", &raw.edit_post.url)?;
            Some(EditPost {
                url: raw.edit_post.url,
                text: raw.edit_post.text,
                append_file_path: raw.edit_post.append_file_path,
            })
        } else {
            None
        };

        Ok(Self {
            website,
            author,
            profile: raw.profile,
            desc: raw.desc,
            title,
            og_image: raw.og_image.filter(|s| !s.trim().is_empty()),
            light_and_dark_mode: raw.light_and_dark_mode,
            post_per_index,
            post_per_page,
            scheduled_post_margin: Duration::milliseconds(raw.scheduled_post_margin),
            show_archives: raw.show_archives,
            edit_post,
        })
    }
}

fn parse_http_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::field(field, format!("invalid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::field(
            field,
            format!("scheme `{}` not supported, must be http or https", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::field(field, "URL must have a host"));
    }
    Ok(url)
}

fn non_empty(field: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::field(field, "must not be empty"))
    } else {
        Ok(value)
    }
}

fn positive(field: &'static str, value: i64) -> Result<NonZeroUsize, ConfigError> {
    usize::try_from(value)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| ConfigError::field(field, format!("must be a positive integer, got {value}")))
}

fn validate_locale(locale: &LocaleConfig) -> Result<(), ConfigError> {
    if !is_language_tag(&locale.lang) {
        return Err(ConfigError::field(
            "locale.lang",
            format!("`{}` is not a language tag", locale.lang),
        ));
    }
    if let Some(bad) = locale.lang_tag.iter().find(|t| !is_language_tag(t)) {
        return Err(ConfigError::field(
            "locale.langTag",
            format!("`{bad}` is not a BCP-47 language tag"),
        ));
    }
    Ok(())
}

/// Syntactic BCP-47 check: a 2-8 letter primary subtag followed by
/// alphanumeric subtags of 1-8 characters.
fn is_language_tag(tag: &str) -> bool {
    let mut subtags = tag.split('-');
    let primary_ok = subtags
        .next()
        .is_some_and(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()));
    primary_ok
        && subtags.all(|s| (1..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Validate the built-in configuration.
pub fn get_config() -> Result<Config, ConfigError> {
    Config::try_from(RawConfig::default())
}

/// Parse and validate a `site.toml` document.
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(text)?;
    Config::try_from(raw)
}

/// Load `site.toml` from the site root, falling back to the built-in
/// configuration when the file does not exist.
pub fn load_config(root: &Path) -> Result<Config, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        info!("no {CONFIG_FILE} found, using built-in configuration");
        return get_config();
    }

    let text = fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
    let config = parse_config(&text)?;
    info!(path = %path.display(), "loaded site configuration");
    Ok(config)
}
