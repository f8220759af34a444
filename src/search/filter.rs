/// Query Builder
///
/// Turns the user's dropdown selections and search text into a normalized
/// `Filter`. Pure: no I/O, no side effects.
///
/// Matching semantics (enforced by the Catalog Store):
/// - `brand` / `kind`: case-insensitive exact match on the whole field
/// - `search`: case-insensitive substring match on `model` only
///
/// An empty string and an absent value both mean "no constraint".

/// Structured constraint set sent to the Catalog Store
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filter {
    pub brand: Option<String>,
    pub kind: Option<String>,
    pub search: Option<String>,
}

impl Filter {
    pub fn with_brand(mut self, brand: Option<&str>) -> Self {
        self.brand = normalize(brand);
        self
    }

    pub fn with_type(mut self, kind: Option<&str>) -> Self {
        self.kind = normalize(kind);
        self
    }

    pub fn with_search(mut self, term: Option<&str>) -> Self {
        self.search = normalize(term);
        self
    }

    /// True when no dimension is constrained (the whole catalog matches)
    pub fn is_unconstrained(&self) -> bool {
        self.brand.is_none() && self.kind.is_none() && self.search.is_none()
    }
}

/// Build a `Filter` from raw inputs.
pub fn build_filter(brand: Option<&str>, kind: Option<&str>, term: Option<&str>) -> Filter {
    Filter::default()
        .with_brand(brand)
        .with_type(kind)
        .with_search(term)
}

fn normalize(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Live, mutable query inputs plus the sequence number of the last
/// dispatch issued for them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub brand: Option<String>,
    pub kind: Option<String>,
    pub term: String,
    /// `kind` was set by the brand→type table, not picked by the user
    pub kind_implied: bool,
    pub seq: u64,
}

impl QueryState {
    pub fn filter(&self) -> Filter {
        build_filter(
            self.brand.as_deref(),
            self.kind.as_deref(),
            Some(self.term.as_str()),
        )
    }
}
