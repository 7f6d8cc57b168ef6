use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::domain::{GridError, SortDirection};
use crate::rows::Row;

/// One window of data as returned by a source: the rows of the requested
/// page plus the total row count of the (server-side filtered) set.
#[derive(Debug, Clone, Deserialize)]
pub struct DataPage {
    pub rows: Vec<Row>,
    #[serde(rename = "totalRows")]
    pub total_rows: usize,
}

/// The query a refresh sends to a server-delegating source. Filter columns
/// and values are order-aligned lists joined by the configured delimiter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceQuery {
    pub current_page: usize,
    pub page_size: usize,
    pub filter_column: String,
    pub filter_value: String,
    pub sort_column: String,
    pub sort_direction: SortDirection,
    pub extra: Vec<(String, String)>,
}

impl SourceQuery {
    /// Join filter terms into the two delimiter-separated wire parameters.
    /// The delimiter character is stripped from values so the lists stay
    /// aligned.
    pub fn set_terms(&mut self, terms: &[(String, String)], delimiter: char) {
        let columns: Vec<String> = terms.iter().map(|(f, _)| f.clone()).collect();
        let values: Vec<String> = terms.iter().map(|(_, v)| v.replace(delimiter, "")).collect();
        let separator = delimiter.to_string();
        self.filter_column = columns.join(&separator);
        self.filter_value = values.join(&separator);
    }

    /// Render as a query string. Percent-encoding beyond the bare minimum
    /// is left to the transport.
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<(String, String)> = vec![
            ("currentPage".into(), self.current_page.to_string()),
            ("pageSize".into(), self.page_size.to_string()),
            ("filterColumn".into(), self.filter_column.clone()),
            ("filterValue".into(), self.filter_value.clone()),
            ("sortColumn".into(), self.sort_column.clone()),
            ("sortDirection".into(), self.sort_direction.as_str().to_string()),
        ];
        params.extend(self.extra.iter().cloned());
        params
            .iter()
            .map(|(k, v)| format!("{k}={}", v.replace(' ', "%20").replace('&', "%26")))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A provider of row windows. `MemorySource` hands out the full in-memory
/// set and the grid transforms client-side; `RemoteSource` delegates
/// filter/sort/page to an endpoint and returns pre-windowed pages.
pub trait DataSource {
    fn fetch(&mut self, query: &SourceQuery) -> Result<DataPage, GridError>;

    /// Whether transformations are delegated to the source.
    fn is_remote(&self) -> bool {
        false
    }

    /// Run a row mutation. Sources without mutation endpoints refuse.
    fn post_mutation(
        &mut self,
        kind: MutationKind,
        _mutation: &RowMutation,
    ) -> Result<Value, GridError> {
        Err(GridError::Source(format!("data source has no endpoint for {kind:?}")))
    }
}

/// In-memory row collection. The query is ignored, transformation happens
/// in the grid.
#[derive(Debug, Default)]
pub struct MemorySource {
    rows: Vec<Row>,
}

impl MemorySource {
    pub fn new(rows: Vec<Row>) -> Self {
        MemorySource { rows }
    }
}

impl DataSource for MemorySource {
    fn fetch(&mut self, _query: &SourceQuery) -> Result<DataPage, GridError> {
        Ok(DataPage { total_rows: self.rows.len(), rows: self.rows.clone() })
    }
}

/// Transport callback: given a full URL, return the response body. HTTP
/// details stay outside the engine.
pub type Transport = Box<dyn FnMut(&str) -> Result<String, GridError>>;

/// Endpoint set of a remote source. Mutations are optional.
#[derive(Debug, Clone, Default)]
pub struct RemoteEndpoints {
    pub url: String,
    pub url_insert: Option<String>,
    pub url_update: Option<String>,
    pub url_delete: Option<String>,
}

/// Remote `{rows, totalRows}` source. Builds the query URL from the grid
/// state and parses the JSON response; a malformed payload is an error the
/// controller downgrades to an empty dataset.
pub struct RemoteSource {
    endpoints: RemoteEndpoints,
    transport: Transport,
}

impl RemoteSource {
    pub fn new(endpoints: RemoteEndpoints, transport: Transport) -> Self {
        RemoteSource { endpoints, transport }
    }

    fn post(&mut self, url: &str, body: &Value) -> Result<Value, GridError> {
        // The transport decides how to deliver the body; it is appended the
        // way the query string is so a plain GET transport still works.
        let request = format!("{url}?payload={body}");
        let response = (self.transport)(&request)?;
        serde_json::from_str(&response)
            .map_err(|e| GridError::BadPayload(format!("mutation response: {e}")))
    }
}

impl DataSource for RemoteSource {
    fn fetch(&mut self, query: &SourceQuery) -> Result<DataPage, GridError> {
        let url = format!("{}?{}", self.endpoints.url, query.to_query_string());
        debug!("Fetching {url}");
        let body = (self.transport)(&url)?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Bad data page payload: {e}");
            GridError::BadPayload(e.to_string())
        })
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn post_mutation(
        &mut self,
        kind: MutationKind,
        mutation: &RowMutation,
    ) -> Result<Value, GridError> {
        let url = match kind {
            MutationKind::Insert => self.endpoints.url_insert.clone(),
            MutationKind::Update => self.endpoints.url_update.clone(),
            MutationKind::Delete => self.endpoints.url_delete.clone(),
        };
        let Some(url) = url else {
            return Err(GridError::Source(format!("no endpoint configured for {kind:?}")));
        };
        let body = serde_json::to_value(mutation)?;
        self.post(&url, &body)
    }
}

/// Row mutation kinds offered by the CRUD endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

/// `{beforeData, afterData}` body shared by all mutation endpoints.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RowMutation {
    #[serde(rename = "beforeData")]
    pub before: Row,
    #[serde(rename = "afterData")]
    pub after: Row,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_string_carries_aligned_filter_lists() {
        let mut query = SourceQuery {
            current_page: 2,
            page_size: 25,
            sort_column: "name".into(),
            sort_direction: SortDirection::Desc,
            ..SourceQuery::default()
        };
        query.set_terms(
            &[("name".to_string(), "jo;se".to_string()), ("city".to_string(), "ro".to_string())],
            ';',
        );

        let qs = query.to_query_string();
        assert!(qs.contains("currentPage=2"));
        assert!(qs.contains("filterColumn=name;city"));
        // The delimiter is stripped from values.
        assert!(qs.contains("filterValue=jose;ro"));
        assert!(qs.contains("sortDirection=desc"));
    }

    #[test]
    fn extra_params_pass_through() {
        let query = SourceQuery {
            extra: vec![("tenant".to_string(), "acme".to_string())],
            ..SourceQuery::default()
        };
        assert!(query.to_query_string().ends_with("tenant=acme"));
    }

    #[test]
    fn remote_source_parses_data_pages() {
        let mut source = RemoteSource::new(
            RemoteEndpoints { url: "http://x/rows".into(), ..RemoteEndpoints::default() },
            Box::new(|url| {
                assert!(url.starts_with("http://x/rows?"));
                Ok(r#"{"rows": [{"id": 1}], "totalRows": 41}"#.to_string())
            }),
        );
        let page = source.fetch(&SourceQuery::default()).unwrap();
        assert_eq!(page.total_rows, 41);
        assert_eq!(page.rows.len(), 1);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let mut source = RemoteSource::new(
            RemoteEndpoints { url: "http://x".into(), ..RemoteEndpoints::default() },
            Box::new(|_| Ok("[1, 2]".to_string())),
        );
        assert!(matches!(
            source.fetch(&SourceQuery::default()),
            Err(GridError::BadPayload(_))
        ));
    }

    #[test]
    fn mutations_need_a_configured_endpoint() {
        let mut source = RemoteSource::new(
            RemoteEndpoints {
                url: "http://x".into(),
                url_delete: Some("http://x/delete".into()),
                ..RemoteEndpoints::default()
            },
            Box::new(|url| {
                assert!(url.starts_with("http://x/delete?"));
                assert!(url.contains("beforeData"));
                Ok("{\"ok\": true}".to_string())
            }),
        );
        let mutation = RowMutation {
            before: [("id".to_string(), json!(1))].into_iter().collect(),
            after: Row::new(),
        };
        assert!(source.post_mutation(MutationKind::Delete, &mutation).is_ok());
        assert!(source.post_mutation(MutationKind::Insert, &mutation).is_err());
    }
}
