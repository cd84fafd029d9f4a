use serde::{Deserialize, Serialize};

/// Raw request parameters, already split off the wire by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestParams {
    /// Repeatable. Bare path, JSON object or JSON array.
    pub include: Vec<String>,
    /// Repeatable. Bare path or JSON array of paths.
    pub exclude: Vec<String>,
    /// Bare path or JSON array of `{property, direction}`.
    pub sort: Option<String>,
    /// Direction for a bare `sort`.
    pub direction: Option<String>,
    #[serde(alias = "cayenneExp")]
    pub filter: Option<String>,
    pub start: Option<i64>,
    pub limit: Option<i64>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, include: impl Into<String>) -> Self {
        self.include.push(include.into());
        self
    }

    pub fn exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude.push(exclude.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn start(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}
