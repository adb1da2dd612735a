//! The production [`SlsApi`] transport over the SLS REST protocol.

use crate::api::{GetLogsRequest, SlsApi};
use crate::client::headers;
use crate::client::signer::Signer;
use crate::error::SlsError;
use crate::proto::LogGroup;
use crate::record::RemoteRecord;
use async_lock::OnceCell;
use async_trait::async_trait;
use compact_str::{CompactString, ToCompactString};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

// RFC 3986 unreserved characters stay as-is.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub(crate) struct HttpApi {
    endpoint: String,
    signer: Signer,
}

impl HttpApi {
    pub(crate) fn new(endpoint: String, signer: Signer) -> Self {
        HttpApi { endpoint, signer }
    }

    async fn client() -> Result<&'static reqwest::Client, SlsError> {
        HTTP_CLIENT
            .get_or_try_init(|| async {
                reqwest::ClientBuilder::new()
                    .user_agent(headers::USER_AGENT_VALUE)
                    .build()
            })
            .await
            .map_err(SlsError::from)
    }

    // The project is addressed as a subdomain of the endpoint.
    fn url(&self, project: &str, resource: &str) -> String {
        format!("http://{project}.{}{resource}", self.endpoint)
    }
}

#[async_trait]
impl SlsApi for HttpApi {
    async fn put_log_group(
        &self,
        project: &str,
        logstore: &str,
        group: LogGroup,
    ) -> Result<(), SlsError> {
        let client = Self::client().await?;

        let resource = format!("/logstores/{logstore}/shards/lb");
        let raw_length = group.encoded_len();
        let mut body = Vec::with_capacity(raw_length);
        group.encode(&mut body).expect("infallible");

        let signature = self.signer.sign_write(&resource, raw_length, &body);
        let response = client
            .post(self.url(project, &resource))
            .header(headers::AUTHORIZATION, signature.authorization)
            .header(headers::CONTENT_LENGTH, body.len().to_string())
            .header(headers::CONTENT_MD5, signature.content_md5)
            .header(headers::CONTENT_TYPE, headers::DEFAULT_CONTENT_TYPE)
            .header(headers::DATE, signature.date)
            .header(headers::LOG_API_VERSION, headers::API_VERSION)
            .header(headers::LOG_BODY_RAW_SIZE, signature.raw_length)
            .header(headers::LOG_SIGNATURE_METHOD, headers::SIGNATURE_METHOD)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::trace!(%status, body = %text, "put_log_group");
        if !status.is_success() {
            return Err(SlsError::Http {
                status: status.as_u16(),
                message: text.into_boxed_str(),
            });
        }
        Ok(())
    }

    async fn get_logs(&self, request: GetLogsRequest) -> Result<Vec<RemoteRecord>, SlsError> {
        let client = Self::client().await?;

        let resource = format!(
            "/logstores/{}?{}",
            request.logstore,
            canonical_query(&request)
        );
        let signature = self.signer.sign_read(&resource);
        let response = client
            .get(self.url(&request.project, &resource))
            .header(headers::AUTHORIZATION, signature.authorization)
            .header(headers::DATE, signature.date)
            .header(headers::LOG_API_VERSION, headers::API_VERSION)
            .header(headers::LOG_SIGNATURE_METHOD, headers::SIGNATURE_METHOD)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(SlsError::Http {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into(),
            });
        }
        let rows = flatten_rows(&body)?;
        tracing::trace!(%status, rows = rows.len(), "get_logs");
        Ok(rows)
    }

    async fn list_log_stores(&self, project: &str) -> Result<Vec<String>, SlsError> {
        let client = Self::client().await?;

        let resource = "/logstores";
        let signature = self.signer.sign_read(resource);
        let response = client
            .get(self.url(project, resource))
            .header(headers::AUTHORIZATION, signature.authorization)
            .header(headers::DATE, signature.date)
            .header(headers::LOG_API_VERSION, headers::API_VERSION)
            .header(headers::LOG_SIGNATURE_METHOD, headers::SIGNATURE_METHOD)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(SlsError::Http {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into(),
            });
        }
        let body: ListLogStoresBody = serde_json::from_slice(&body)?;
        tracing::trace!(%status, stores = body.logstores.len(), "list_log_stores");
        Ok(body.logstores)
    }
}

#[derive(serde::Deserialize)]
struct ListLogStoresBody {
    logstores: Vec<String>,
}

// Keys sorted, values percent-encoded. The same string is used for the URL
// and for the signed canonicalized resource.
fn canonical_query(request: &GetLogsRequest) -> String {
    let mut params: Vec<(&str, CompactString)> = vec![
        ("from", request.from.to_compact_string()),
        ("to", request.to.to_compact_string()),
        ("type", CompactString::const_new("log")),
    ];
    if let Some(ref query) = request.query {
        params.push(("query", query.clone()));
    }
    if let Some(ref topic) = request.topic {
        params.push(("topic", topic.clone()));
    }
    if let Some(line) = request.line {
        params.push(("line", line.to_compact_string()));
    }
    if let Some(offset) = request.offset {
        params.push(("offset", offset.to_compact_string()));
    }
    params.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (i, (key, value)) in params.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        out.extend(utf8_percent_encode(value, QUERY_VALUE));
    }
    out
}

// A query response is either a JSON array of rows (in order) or, in the
// older keyed shape, an object whose values are the rows.
fn flatten_rows(body: &[u8]) -> Result<Vec<RemoteRecord>, SlsError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(map) => map.into_iter().map(|(_, row)| row).collect(),
        _ => Vec::new(),
    };
    Ok(rows
        .into_iter()
        .filter_map(|row| match row {
            serde_json::Value::Object(fields) => {
                let mut record = RemoteRecord::new();
                for (name, value) in fields {
                    match value {
                        serde_json::Value::String(value) => record.insert(name, value),
                        other => record.insert(name, other.to_string()),
                    }
                }
                Some(record)
            }
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};
    use sha1::Sha1;

    fn api() -> HttpApi {
        HttpApi::new(
            "cn-hangzhou.sls.aliyuncs.com".to_owned(),
            Signer {
                hmac: Hmac::<Sha1>::new_from_slice(b"secret").unwrap(),
                access_key_id: "LTAI4example".to_owned(),
            },
        )
    }

    #[test]
    fn url_addresses_project_as_subdomain() {
        assert_eq!(
            api().url("proj", "/logstores/store/shards/lb"),
            "http://proj.cn-hangzhou.sls.aliyuncs.com/logstores/store/shards/lb"
        );
    }

    fn request() -> GetLogsRequest {
        GetLogsRequest {
            project: "proj".into(),
            logstore: "store".into(),
            from: 1700000000,
            to: 1700000600,
            query: None,
            topic: None,
            line: None,
            offset: None,
        }
    }

    #[test]
    fn canonical_query_minimal() {
        assert_eq!(
            canonical_query(&request()),
            "from=1700000000&to=1700000600&type=log"
        );
    }

    #[test]
    fn canonical_query_sorts_and_encodes() {
        let mut request = request();
        request.query = Some("level: error".into());
        request.topic = Some("app".into());
        request.line = Some(100);
        request.offset = Some(200);
        assert_eq!(
            canonical_query(&request),
            "from=1700000000&line=100&offset=200&query=level%3A%20error&to=1700000600&topic=app&type=log"
        );
    }

    #[test]
    fn flatten_array_body() {
        let rows = flatten_rows(
            br#"[{"__time__":"1700000000","msg":"a"},{"msg":"b","count":3}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("__time__"), Some("1700000000"));
        assert_eq!(rows[0].get("msg"), Some("a"));
        // non-string values are coerced to their JSON text
        assert_eq!(rows[1].get("count"), Some("3"));
    }

    #[test]
    fn flatten_keyed_body() {
        let rows = flatten_rows(br#"{"0":{"msg":"a"},"1":{"msg":"b"}}"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("msg"), Some("a"));
        assert_eq!(rows[1].get("msg"), Some("b"));
    }

    #[test]
    fn flatten_rejects_malformed_body() {
        assert!(matches!(
            flatten_rows(b"not json"),
            Err(SlsError::Body(_))
        ));
    }
}
