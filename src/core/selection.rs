/// Transient user choice driving a single render.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub year: i32,

    /// Display order; duplicates are kept.
    pub countries: Vec<String>,
}

impl Selection {
    pub const fn new(year: i32, countries: Vec<String>) -> Self {
        Self { year, countries }
    }
}
