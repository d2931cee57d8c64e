#![forbid(unsafe_code)]

//! Site configuration: selectors, class names, custom property names, and
//! header height defaults.
//!
//! Every field has a default matching the stock page markup, and every level
//! is `#[serde(default)]`, so a JSON document only needs the keys it
//! overrides:
//!
//! ```
//! use sitewire_core::SiteConfig;
//!
//! let config = SiteConfig::from_json(r##"{ "selectors": { "header": "#top" } }"##).unwrap();
//! assert_eq!(config.selectors.header, "#top");
//! assert_eq!(config.selectors.modal, ".modal");
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Result |
//! |---------|-------|--------|
//! | Malformed JSON | Syntax or type error | [`ConfigError::Parse`] |
//! | Empty selector/name | Blank override | [`ConfigError::Empty`] |
//! | Non-positive height | Bad default | [`ConfigError::Height`] |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`SiteConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid site config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config field `{0}` must not be empty")]
    Empty(&'static str),
    #[error("header default `{field}` must be a finite positive length, got {value}")]
    Height { field: &'static str, value: f64 },
}

/// Selectors used to discover page structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub header: String,
    pub sections: String,
    pub nav_links: String,
    pub carousels: String,
    pub carousel_track: String,
    pub carousel_slide: String,
    pub carousel_prev: String,
    pub carousel_next: String,
    pub carousel_viewport: String,
    pub carousel_images: String,
    pub modal_openers: String,
    pub modal: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            header: ".site-header".into(),
            sections: "main .stripe[id]".into(),
            nav_links: ".site-nav a[href^=\"#\"]".into(),
            carousels: ".carousel".into(),
            carousel_track: ".caro-track".into(),
            carousel_slide: ".caro-slide".into(),
            carousel_prev: ".caro-prev".into(),
            carousel_next: ".caro-next".into(),
            carousel_viewport: ".caro-viewport".into(),
            carousel_images: "img".into(),
            modal_openers: ".open-modal[data-modal-target]".into(),
            modal: ".modal".into(),
        }
    }
}

/// Class and attribute names toggled or inspected on elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    /// Marker on the current nav link.
    pub active: String,
    /// Marker on the header in compact mode.
    pub compact: String,
    /// Marker on `<body>` while a dialog is open.
    pub modal_open_body: String,
    /// Marker class on a dialog's backdrop element.
    pub modal_backdrop: String,
    /// Attribute on openers holding the dialog selector.
    pub modal_target_attr: String,
    /// Attribute marking close controls.
    pub modal_close_attr: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            active: "is-active".into(),
            compact: "is-compact".into(),
            modal_open_body: "modal-open".into(),
            modal_backdrop: "modal__backdrop".into(),
            modal_target_attr: "data-modal-target".into(),
            modal_close_attr: "data-modal-close".into(),
        }
    }
}

/// Custom property names shared with the stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CssVars {
    /// Written: current effective header height.
    pub header_height: String,
    /// Read: header height at the top of the page.
    pub header_height_large: String,
    /// Read: header height once scrolled.
    pub header_height_compact: String,
}

impl Default for CssVars {
    fn default() -> Self {
        Self {
            header_height: "--header-h".into(),
            header_height_large: "--header-h-large".into(),
            header_height_compact: "--header-h-compact".into(),
        }
    }
}

/// Fallback header heights used when the custom properties are missing or
/// malformed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderDefaults {
    pub large: f64,
    pub compact: f64,
    /// Used when neither `--header-h` nor the header's offset height is usable.
    pub measured: f64,
    /// Bottom-of-page tolerance in pixels.
    pub bottom_tolerance: f64,
}

impl Default for HeaderDefaults {
    fn default() -> Self {
        Self {
            large: 88.0,
            compact: 56.0,
            measured: 64.0,
            bottom_tolerance: 2.0,
        }
    }
}

/// Top-level configuration for a page install.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub selectors: Selectors,
    pub classes: ClassNames,
    pub css_vars: CssVars,
    pub header: HeaderDefaults,
}

impl SiteConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every selector and name is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.selectors;
        let c = &self.classes;
        let v = &self.css_vars;
        let required: [(&'static str, &str); 21] = [
            ("selectors.header", &s.header),
            ("selectors.sections", &s.sections),
            ("selectors.nav_links", &s.nav_links),
            ("selectors.carousels", &s.carousels),
            ("selectors.carousel_track", &s.carousel_track),
            ("selectors.carousel_slide", &s.carousel_slide),
            ("selectors.carousel_prev", &s.carousel_prev),
            ("selectors.carousel_next", &s.carousel_next),
            ("selectors.carousel_viewport", &s.carousel_viewport),
            ("selectors.carousel_images", &s.carousel_images),
            ("selectors.modal_openers", &s.modal_openers),
            ("selectors.modal", &s.modal),
            ("classes.active", &c.active),
            ("classes.compact", &c.compact),
            ("classes.modal_open_body", &c.modal_open_body),
            ("classes.modal_backdrop", &c.modal_backdrop),
            ("classes.modal_target_attr", &c.modal_target_attr),
            ("classes.modal_close_attr", &c.modal_close_attr),
            ("css_vars.header_height", &v.header_height),
            ("css_vars.header_height_large", &v.header_height_large),
            ("css_vars.header_height_compact", &v.header_height_compact),
        ];
        if let Some((field, _)) = required
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            return Err(ConfigError::Empty(field));
        }

        let h = &self.header;
        for (field, value) in [
            ("header.large", h.large),
            ("header.compact", h.compact),
            ("header.measured", h.measured),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Height { field, value });
            }
        }
        if !h.bottom_tolerance.is_finite() || h.bottom_tolerance < 0.0 {
            return Err(ConfigError::Height {
                field: "header.bottom_tolerance",
                value: h.bottom_tolerance,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_default() {
        let config = SiteConfig::from_json("{}").unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn defaults_match_stock_markup() {
        let config = SiteConfig::default();
        assert_eq!(config.selectors.sections, "main .stripe[id]");
        assert_eq!(config.selectors.nav_links, ".site-nav a[href^=\"#\"]");
        assert_eq!(config.classes.active, "is-active");
        assert_eq!(config.css_vars.header_height, "--header-h");
        assert_eq!(config.header.large, 88.0);
        assert_eq!(config.header.compact, 56.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_override_keeps_siblings() {
        let config = SiteConfig::from_json(
            r#"{ "classes": { "active": "current" }, "header": { "compact": 48 } }"#,
        )
        .unwrap();
        assert_eq!(config.classes.active, "current");
        assert_eq!(config.classes.compact, "is-compact");
        assert_eq!(config.header.compact, 48.0);
        assert_eq!(config.header.large, 88.0);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = SiteConfig::from_json("{ selectors: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn blank_selector_rejected() {
        let err = SiteConfig::from_json(r#"{ "selectors": { "modal": "  " } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Empty("selectors.modal")));
    }

    #[test]
    fn non_positive_height_rejected() {
        let err = SiteConfig::from_json(r#"{ "header": { "large": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Height {
                field: "header.large",
                ..
            }
        ));
        assert!(err.to_string().contains("header.large"));
    }

    #[test]
    fn round_trips_through_json() {
        let config = SiteConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SiteConfig::from_json(&json).unwrap(), config);
    }
}
