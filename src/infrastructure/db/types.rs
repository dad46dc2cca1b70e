//! Query builder for the database's REST interface.

/// A single `or=(col.ilike.*q*,...)` predicate, used by text fallback.
#[derive(Debug, Clone)]
pub struct OrIlike {
    pub columns: Vec<String>,
    pub needle: String,
}

/// A filtered table select.
///
/// Supports the three predicate shapes the server needs: equality, `in`,
/// and one `or(ilike)` group. Everything renders to REST query pairs.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    pub table: String,
    pub columns: String,
    pub eq: Vec<(String, String)>,
    pub any_of: Vec<(String, Vec<String>)>,
    pub or_ilike: Option<OrIlike>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table: name.into(),
            columns: "*".to_string(),
            eq: Vec::new(),
            any_of: Vec::new(),
            or_ilike: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    pub fn any_of(mut self, column: impl Into<String>, values: Vec<String>) -> Self {
        if !values.is_empty() {
            self.any_of.push((column.into(), values));
        }
        self
    }

    pub fn or_ilike(mut self, columns: Vec<String>, needle: impl Into<String>) -> Self {
        self.or_ilike = Some(OrIlike { columns, needle: needle.into() });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render to query-string pairs in the REST API's filter syntax.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        for (column, value) in &self.eq {
            pairs.push((column.clone(), format!("eq.{value}")));
        }
        for (column, values) in &self.any_of {
            pairs.push((column.clone(), format!("in.({})", values.join(","))));
        }
        if let Some(or) = &self.or_ilike {
            let clauses: Vec<String> = or
                .columns
                .iter()
                .map(|c| format!("{c}.ilike.*{}*", or.needle))
                .collect();
            pairs.push(("or".to_string(), format!("({})", clauses.join(","))));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}
