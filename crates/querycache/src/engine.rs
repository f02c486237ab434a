// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Serialize, de::DeserializeOwned};

use crate::Binding;

/// The query execution engine a [`CachingQuery`](crate::CachingQuery) wraps.
///
/// Implementations build and run the actual SQL. The cache layer only reads the
/// statement and its bindings to derive a key, and calls
/// [`execute`](Self::execute) when there is nothing cached.
///
/// # Examples
///
/// ```
/// use querycache::{Binding, QueryEngine};
///
/// struct OrdersById {
///     id: i64,
///     bindings: Vec<Binding>,
/// }
///
/// impl QueryEngine for OrdersById {
///     type Row = (i64, String);
///     type Error = std::io::Error;
///
///     fn connection_name(&self) -> &str {
///         "main"
///     }
///
///     fn to_sql(&self, columns: &[&str]) -> String {
///         format!("SELECT {} FROM orders WHERE id = ?", columns.join(", "))
///     }
///
///     fn bindings(&self) -> &[Binding] {
///         &self.bindings
///     }
///
///     async fn execute(&self, _columns: &[&str]) -> Result<Vec<Self::Row>, Self::Error> {
///         Ok(vec![(self.id, "open".to_owned())])
///     }
/// }
/// ```
pub trait QueryEngine: Send + Sync {
    /// A result row. Rows are cached as JSON.
    type Row: Serialize + DeserializeOwned + Send;

    /// The engine's error type. It is never cached.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The name of the database connection the query runs on.
    fn connection_name(&self) -> &str;

    /// The SQL text that selecting `columns` would run.
    fn to_sql(&self, columns: &[&str]) -> String;

    /// The values bound to the statement's placeholders, in order.
    fn bindings(&self) -> &[Binding];

    /// Runs the query and returns its rows.
    fn execute(&self, columns: &[&str]) -> impl Future<Output = Result<Vec<Self::Row>, Self::Error>> + Send;
}
