use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Optional(String),
    Rest,
}

/// RoutePattern
///
/// A parsed path pattern: `/admin/blogs/:mode/:id?`, `/insurance/:id`, `/*`.
/// `:name?` and `*` are only allowed as the last segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("route {pattern:?}: parameter name is empty")]
    EmptyParam { pattern: String },

    #[error("route {pattern:?}: parameter :{name} is bound twice")]
    DuplicateParam { pattern: String, name: String },

    #[error("route {pattern:?}: optional parameter :{name}? must be the last segment")]
    OptionalNotLast { pattern: String, name: String },

    #[error("route {pattern:?}: '*' must be the last segment")]
    RestNotLast { pattern: String },
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let parts: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (index, part) in parts.iter().enumerate() {
            let last = index + 1 == parts.len();
            let segment = if *part == "*" {
                if !last {
                    return Err(PatternError::RestNotLast {
                        pattern: raw.to_string(),
                    });
                }
                Segment::Rest
            } else if let Some(name) = part.strip_prefix(':') {
                match name.strip_suffix('?') {
                    Some(name) if !last => {
                        return Err(PatternError::OptionalNotLast {
                            pattern: raw.to_string(),
                            name: name.to_string(),
                        });
                    }
                    Some(name) => Segment::Optional(name.to_string()),
                    None => Segment::Param(name.to_string()),
                }
            } else {
                Segment::Static(part.to_string())
            };

            if let Segment::Param(name) | Segment::Optional(name) = &segment {
                if name.is_empty() {
                    return Err(PatternError::EmptyParam {
                        pattern: raw.to_string(),
                    });
                }
                let bound_twice = segments.iter().any(|s| {
                    matches!(s, Segment::Param(n) | Segment::Optional(n) if n == name)
                });
                if bound_twice {
                    return Err(PatternError::DuplicateParam {
                        pattern: raw.to_string(),
                        name: name.clone(),
                    });
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: format!("/{}", parts.join("/")),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Rest))
    }

    /// Matches a request path, binding parameters positionally. Static segments
    /// compare ASCII case-insensitively; empty path segments are ignored.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        let mut params = RouteParams::default();

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    let part = parts.next()?;
                    if !part.eq_ignore_ascii_case(expected) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let part = parts.next()?;
                    params.push(name, part);
                }
                Segment::Optional(name) => {
                    if let Some(part) = parts.next() {
                        params.push(name, part);
                    }
                }
                Segment::Rest => {
                    let rest: Vec<&str> = parts.by_ref().collect();
                    params.push("*", &rest.join("/"));
                    return Some(params);
                }
            }
        }

        match parts.next() {
            Some(_) => None,
            None => Some(params),
        }
    }
}

/// Parameters bound by a successful match, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(Vec<(String, String)>);

impl RouteParams {
    fn push(&mut self, name: &str, value: &str) {
        self.0.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
