//! Request-side types shared by the client trait and its callers.

/// Optional filters for a marketplace search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub category: Option<String>,
    /// Group slug.
    pub group: Option<String>,
    /// Creator wallet address.
    pub creator: Option<String>,
}

impl SearchFilters {
    /// Query-string pairs for the filters that are set, in a fixed order.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("category", self.category.as_deref()),
            ("group", self.group.as_deref()),
            ("creator", self.creator.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}
