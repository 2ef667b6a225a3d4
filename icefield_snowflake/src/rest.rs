//! Rest API interface for Snowflake
//!
//! Statements go through the SQL API v2 (`POST /api/v2/statements`),
//! authenticated with a key-pair JWT.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use icefield_core::config::ProviderConfig;
use icefield_core::log_runtime;
use icefield_core::logging::debug;
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::consts;
use crate::error::{Error, Result};
use crate::sdk::{Row, SqlExecutor};

/// How long to wait between polls of a statement still running.
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Give up polling after this many attempts and let the host runtime retry.
const MAX_POLLS: usize = 240;

/// Claims for use with the `jsonwebtoken` crate when
/// creating a new JWT.
#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    /// Required (validate_exp defaults to true in validation). Expiration time (as UTC timestamp)
    exp: usize,
    /// Optional. Issued at (as UTC timestamp)
    iat: usize,
    /// Optional. Issuer
    iss: String,
    /// Optional. Subject (whom token refers to)
    sub: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct StatementResponse {
    result_set_meta_data: Option<ResultSetMetaData>,
    data: Vec<Vec<Option<String>>>,
    code: Option<String>,
    sql_state: Option<String>,
    message: Option<String>,
    statement_handle: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct ResultSetMetaData {
    row_type: Vec<Column>,
    partition_info: Vec<serde_json::Value>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct Column {
    name: String,
}

/// Wrapper struct for http functionality
pub struct SnowflakeRestClient {
    /// The credentials used to authenticate into Snowflake.
    config: ProviderConfig,
    http_client: ClientWithMiddleware,
}

impl SnowflakeRestClient {
    /// Build a client. Fails when the config is incomplete.
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let mut client_builder = ClientBuilder::new(reqwest::Client::new());
        if config.retry {
            client_builder =
                client_builder.with(RetryTransientMiddleware::new_with_policy(retry_policy))
        }
        let client = client_builder.build();
        Ok(Self {
            config,
            http_client: client,
        })
    }

    async fn run(&self, sql: &str) -> Result<Vec<Row>> {
        let request = self.get_request(sql)?;
        let mut response = send(request).await?;

        let mut polls = 0;
        while let Some(handle) = response.running_handle() {
            polls += 1;
            if polls > MAX_POLLS {
                return Err(Error::Transient(format!(
                    "statement {handle} still running after {polls} polls"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            response = send(self.get_status_request(&handle, None)?).await?;
        }

        let StatementPage {
            columns,
            data,
            partitions,
            handle,
        } = response.into_page();
        let mut rows = data;
        if partitions > 1 {
            let handle = handle.ok_or_else(|| Error::Other {
                sql_state: String::new(),
                message: "partitioned result without a statement handle".to_owned(),
            })?;
            debug!("fetching {} more partitions of {handle}", partitions - 1);
            let pages = try_join_all((1..partitions).map(|p| self.fetch_partition(&handle, p))).await?;
            for page in pages {
                rows.extend(page);
            }
        }

        Ok(rows
            .into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect())
            .collect())
    }

    async fn fetch_partition(&self, handle: &str, partition: usize) -> Result<Vec<Vec<Option<String>>>> {
        let response = send(self.get_status_request(handle, Some(partition))?).await?;
        Ok(response.data)
    }

    fn get_request(&self, sql: &str) -> Result<RequestBuilder> {
        let token = self.get_jwt()?;
        Ok(self
            .with_headers(self.http_client.post(self.config.statements_url()), &token)
            .json(&self.get_body(sql)))
    }

    fn get_status_request(&self, handle: &str, partition: Option<usize>) -> Result<RequestBuilder> {
        let token = self.get_jwt()?;
        let url = format!("{}/{handle}", self.config.statements_url());
        let mut request = self.with_headers(self.http_client.get(url), &token);
        if let Some(partition) = partition {
            request = request.query(&[("partition", partition)]);
        }
        Ok(request)
    }

    fn with_headers(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header(consts::AUTH_HEADER, format!["Bearer {}", token])
            .header(consts::CONTENT_TYPE_HEADER, "application/json")
            .header(consts::ACCEPT_HEADER, "application/json")
            .header(consts::SNOWFLAKE_AUTH_HEADER, "KEYPAIR_JWT")
            .header(consts::USER_AGENT_HEADER, consts::USER_AGENT)
    }

    fn get_body(&self, sql: &str) -> serde_json::Value {
        json!({
            "statement": sql,
            "warehouse": self.config.warehouse,
            "role": self.config.role,
            "timeout": consts::STATEMENT_TIMEOUT_SECS,
        })
    }

    fn get_jwt(&self) -> Result<String> {
        #[cfg(not(test))]
        {
            let qualified_username = format![
                "{}.{}",
                self.config.account.to_uppercase(),
                self.config.user.to_uppercase()
            ];

            // Generate jwt
            let claims = JwtClaims {
                exp: (get_current_timestamp() + 3600) as usize,
                iat: get_current_timestamp() as usize,
                iss: format!["{}.{}", qualified_username, self.config.public_key_fp],
                sub: qualified_username,
            };

            let key = EncodingKey::from_rsa_pem(
                self.config
                    .private_key
                    .replace(' ', "")
                    .replace("ENDPRIVATEKEY", "END PRIVATE KEY")
                    .replace("BEGINPRIVATEKEY", "BEGIN PRIVATE KEY")
                    .as_bytes(),
            )
            .map_err(|e| Error::Invalid(format!("couldn't read the private key: {e}")))?;
            encode(&Header::new(Algorithm::RS256), &claims, &key)
                .map_err(|e| Error::Invalid(format!("couldn't sign the session token: {e}")))
        }
        #[cfg(test)]
        Ok("FAKE_JWT".to_owned())
    }
}

struct StatementPage {
    columns: Vec<String>,
    data: Vec<Vec<Option<String>>>,
    partitions: usize,
    handle: Option<String>,
}

impl StatementResponse {
    /// The handle of a statement Snowflake is still executing.
    fn running_handle(&self) -> Option<String> {
        match (&self.result_set_meta_data, &self.statement_handle) {
            (None, Some(handle)) if self.code.as_deref() == Some("333334") => Some(handle.clone()),
            _ => None,
        }
    }

    fn into_page(self) -> StatementPage {
        let meta = self.result_set_meta_data.unwrap_or_default();
        StatementPage {
            columns: meta.row_type.into_iter().map(|c| c.name).collect(),
            data: self.data,
            partitions: meta.partition_info.len(),
            handle: self.statement_handle,
        }
    }
}

/// Send a request, turning every failure into a typed error.
async fn send(request: RequestBuilder) -> Result<StatementResponse> {
    let response = log_runtime!(
        "snowflake round-trip",
        request.send().await.map_err(|e| Error::Transient(format!("couldn't send request: {e}")))?
    );
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::Transient(format!("couldn't read response body ({status}): {e}")))?;
    let parsed = serde_json::from_str::<StatementResponse>(&text);

    if status.is_success() {
        return parsed.map_err(|e| Error::Other {
            sql_state: String::new(),
            message: format!("unexpected response body: {e}"),
        });
    }
    // error bodies aren't always JSON (e.g. from a proxy)
    let body = parsed.unwrap_or_default();
    let message = body
        .message
        .clone()
        .unwrap_or_else(|| format!("request failed with status {status}"));
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => Err(Error::Transient(message)),
        s if s.is_server_error() => Err(Error::Transient(message)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Forbidden(message)),
        _ => {
            let err = Error::from_sql_failure(
                body.code.as_deref().unwrap_or_default(),
                body.sql_state.as_deref().unwrap_or_default(),
                &message,
            );
            debug!("statement failed: {err}");
            Err(err)
        }
    }
}

#[async_trait]
impl SqlExecutor for SnowflakeRestClient {
    /// Execute a query, dropping the result.
    async fn execute(&self, sql: &str) -> Result<()> {
        self.run(sql).await.map(|_| ())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.run(sql).await
    }
}
