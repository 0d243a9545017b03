//! Parameterized query text.
//!
//! Queries are opaque to this layer; the store parses and plans them.
//! The only structure this crate imposes is named-parameter binding, so
//! caller values never end up concatenated into query text.

use serde_json::Value;

/// A single named query parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    /// Parameter name, including the `@` prefix.
    pub name: String,
    /// Bound value.
    pub value: Value,
}

/// A query with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Query text.
    pub text: String,
    /// Named parameters referenced by the text.
    pub parameters: Vec<QueryParameter>,
}

impl Query {
    /// Creates a query from raw text with no parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    /// Binds a named parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Expands a `{0}` placeholder in `template` into an IN-list of
    /// named parameters, one per value.
    ///
    /// Each value is bound as `@p0`, `@p1`, … in input order; the text
    /// receives only the parameter names, so values are never spliced
    /// into the query. With an empty value set the template is used
    /// as-is and no parameters are bound.
    ///
    /// # Example
    ///
    /// ```
    /// use shardstore_protocol::Query;
    ///
    /// let query = Query::with_in_clause(
    ///     "SELECT * FROM c WHERE c.id IN ({0})",
    ///     ["a", "b"],
    /// );
    /// assert_eq!(query.text, "SELECT * FROM c WHERE c.id IN (@p0, @p1)");
    /// assert_eq!(query.parameters.len(), 2);
    /// ```
    pub fn with_in_clause<I, V>(template: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut parameters = Vec::new();
        let mut names = Vec::new();

        for (index, value) in values.into_iter().enumerate() {
            let name = format!("@p{index}");
            names.push(name.clone());
            parameters.push(QueryParameter {
                name,
                value: value.into(),
            });
        }

        if parameters.is_empty() {
            return Self::new(template);
        }

        Self {
            text: template.replace("{0}", &names.join(", ")),
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_query_has_no_parameters() {
        let query = Query::new("SELECT * FROM c");
        assert_eq!(query.text, "SELECT * FROM c");
        assert!(query.parameters.is_empty());
    }

    #[test]
    fn with_parameter_binds_in_order() {
        let query = Query::new("SELECT * FROM c WHERE c.kind = @kind AND c.rank > @rank")
            .with_parameter("@kind", "sensor")
            .with_parameter("@rank", 3);

        assert_eq!(query.parameters.len(), 2);
        assert_eq!(query.parameters[0].name, "@kind");
        assert_eq!(query.parameters[0].value, Value::from("sensor"));
        assert_eq!(query.parameters[1].name, "@rank");
        assert_eq!(query.parameters[1].value, Value::from(3));
    }

    #[test]
    fn in_clause_expands_one_parameter_per_value() {
        let query = Query::with_in_clause("SELECT * FROM c WHERE c.id IN ({0})", ["a", "b", "c"]);

        assert_eq!(query.text, "SELECT * FROM c WHERE c.id IN (@p0, @p1, @p2)");
        assert_eq!(query.parameters.len(), 3);
        for (i, expected) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(query.parameters[i].name, format!("@p{i}"));
            assert_eq!(query.parameters[i].value, Value::from(*expected));
        }
    }

    #[test]
    fn in_clause_with_no_values_leaves_template_untouched() {
        let query =
            Query::with_in_clause("SELECT * FROM c WHERE c.id IN ({0})", Vec::<String>::new());

        assert_eq!(query.text, "SELECT * FROM c WHERE c.id IN ({0})");
        assert!(query.parameters.is_empty());
    }

    #[test]
    fn in_clause_never_splices_values_into_text() {
        let query = Query::with_in_clause(
            "SELECT * FROM c WHERE c.id IN ({0})",
            ["x'; DROP TABLE c; --"],
        );

        assert_eq!(query.text, "SELECT * FROM c WHERE c.id IN (@p0)");
        assert!(!query.text.contains("DROP TABLE"));
        assert_eq!(query.parameters[0].value, Value::from("x'; DROP TABLE c; --"));
    }
}
