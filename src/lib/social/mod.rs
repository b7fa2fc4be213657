//! Social links shown in the site header and footer.
//!
//! Links are checked when the configuration is loaded: the renderer picks an
//! icon by platform name, so an unknown name is a configuration error rather
//! than a missing icon at render time.

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::error::ConfigError;

/// Placeholder in a link title that is replaced with the site title.
pub const TITLE_PLACEHOLDER: &str = "{title}";

macro_rules! platforms {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Platforms the renderer has an icon for.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Platform {
            $($variant),+
        }

        impl Platform {
            pub const ALL: &'static [Platform] = &[$(Platform::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Platform::$variant => $name),+
                }
            }
        }

        impl FromStr for Platform {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Platform::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

platforms! {
    Github => "Github",
    Facebook => "Facebook",
    Instagram => "Instagram",
    LinkedIn => "LinkedIn",
    Mail => "Mail",
    X => "X",
    Twitch => "Twitch",
    YouTube => "YouTube",
    WhatsApp => "WhatsApp",
    Snapchat => "Snapchat",
    Pinterest => "Pinterest",
    TikTok => "TikTok",
    CodePen => "CodePen",
    Discord => "Discord",
    GitLab => "GitLab",
    Reddit => "Reddit",
    Skype => "Skype",
    Steam => "Steam",
    Telegram => "Telegram",
    Mastodon => "Mastodon",
}

impl Platform {
    /// Icon identifier used as a CSS class, e.g. `icon-github`.
    pub fn icon_class(&self) -> String {
        format!("icon-{}", self.as_str().to_lowercase())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A social link as written in `site.toml`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawSocialLink {
    pub name: String,
    pub href: String,
    #[serde(default)]
    pub link_title: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocialLink {
    pub name: Platform,
    pub href: String,
    pub link_title: String,
    pub active: bool,
}

impl SocialLink {
    /// Link title with the site title substituted in.
    pub fn display_title(&self, site_title: &str) -> String {
        self.link_title.replace(TITLE_PLACEHOLDER, site_title)
    }
}

/// Check every entry and return them in the same order.
pub fn validate_socials(raw: Vec<RawSocialLink>) -> Result<Vec<SocialLink>, ConfigError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, link)| validate_social(index, link))
        .collect()
}

fn validate_social(index: usize, raw: RawSocialLink) -> Result<SocialLink, ConfigError> {
    let reject = |message: String| ConfigError::Social {
        index,
        name: raw.name.clone(),
        message,
    };

    let name = raw
        .name
        .parse::<Platform>()
        .map_err(|_| reject("unknown platform".to_string()))?;

    let parsed = url::Url::parse(&raw.href).map_err(|e| reject(format!("invalid href: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_none() => {
            return Err(reject("href has no host".to_string()));
        }
        "http" | "https" | "mailto" => {}
        other => return Err(reject(format!("unsupported href scheme `{other}`"))),
    }

    Ok(SocialLink {
        name,
        href: raw.href,
        link_title: raw.link_title,
        active: raw.active,
    })
}
