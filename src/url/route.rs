//! Detail-page route matching
//!
//! Routes are an explicit allow-list of path templates such as
//! `/token/{address}`. A literal segment must match exactly and a placeholder
//! matches exactly one non-empty segment, so `/token/{address}` accepts
//! `/token/0xabc` but rejects `/token/0xabc/holders` and `/tokens`.

use crate::ConfigError;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A single parsed route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    template: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parses a template like `/token/{address}`
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let trimmed = template.trim();
        if !trimmed.starts_with('/') {
            return Err(ConfigError::InvalidRoute(format!(
                "'{}' must start with '/'",
                template
            )));
        }

        let mut segments = Vec::new();
        for raw in path_segments(trimmed) {
            let segment = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                    Segment::Placeholder(name.to_string())
                }
                Some(_) => {
                    return Err(ConfigError::InvalidRoute(format!(
                        "'{}' has an empty or malformed placeholder",
                        template
                    )))
                }
                None if raw.contains(['{', '}']) => {
                    return Err(ConfigError::InvalidRoute(format!(
                        "'{}' mixes literal text and a placeholder in one segment",
                        template
                    )))
                }
                None => Segment::Literal(raw.to_string()),
            };
            segments.push(segment);
        }

        if segments.is_empty() {
            return Err(ConfigError::InvalidRoute(format!(
                "'{}' matches only the site root",
                template
            )));
        }

        Ok(Self {
            template: trimmed.to_string(),
            segments,
        })
    }

    /// Returns true if the path has exactly this shape
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path_segments(path).collect();
        if parts.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(parts)
            .all(|(segment, part)| match segment {
                Segment::Literal(lit) => lit == part,
                Segment::Placeholder(_) => !part.is_empty(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

/// The allow-list of detail-page routes
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteTemplate>,
}

impl RouteTable {
    /// Builds the table, rejecting an empty list or any malformed template
    pub fn from_templates<S: AsRef<str>>(templates: &[S]) -> Result<Self, ConfigError> {
        if templates.is_empty() {
            return Err(ConfigError::InvalidRoute(
                "at least one detail route is required".to_string(),
            ));
        }

        let routes = templates
            .iter()
            .map(|t| RouteTemplate::parse(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { routes })
    }

    /// Returns the first template matching the URL path, if any
    pub fn match_url(&self, url: &Url) -> Option<&RouteTemplate> {
        self.routes.iter().find(|route| route.matches(url.path()))
    }

    pub fn is_detail_page(&self, url: &Url) -> bool {
        self.match_url(url).is_some()
    }
}

/// Splits a path into segments, tolerating one trailing slash
fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    path.split('/').filter(move |_| !path.is_empty())
}
