use crate::member::{Member, MemberUpdate};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

const USER_AGENT_VALUE: &str = concat!("ztctl/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(
        "not found ({status}) at {url}{}; check the member address and network id",
        detail(.body)
    )]
    NotFound { status: u16, url: String, body: String },
    #[error(
        "access denied ({status}) at {url}{}; check the API token and its access to the network",
        detail(.body)
    )]
    Unauthorized { status: u16, url: String, body: String },
    #[error("controller error ({status}) at {url}: {body}")]
    Server { status: u16, url: String, body: String },
    #[error("request rejected ({status}) at {url}: {body}")]
    Status { status: u16, url: String, body: String },
    #[error("could not reach {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid controller URL: {0}")]
    InvalidUrl(String),
    #[error("member address must not be empty")]
    EmptyAddress,
    #[error("nothing to update; give --name/--description with --edit, or --auth")]
    EmptyUpdate,
}

impl ApiError {
    fn from_status(status: StatusCode, url: &Url, body: String) -> Self {
        let url = url.to_string();
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound {
                status: status.as_u16(),
                url,
                body,
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized {
                status: status.as_u16(),
                url,
                body,
            },
            s if s.is_server_error() => ApiError::Server {
                status: s.as_u16(),
                url,
                body,
            },
            s => ApiError::Status {
                status: s.as_u16(),
                url,
                body,
            },
        }
    }
}

/// Response body appended to an error message, when there is one.
fn detail(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

/// Client for the member endpoints of one network.
#[derive(Debug, Clone)]
pub struct ApiClient {
    members_url: Url,
    http: Client,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, network: &str, token: &str) -> Result<Self, ApiError> {
        let mut members_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        members_url
            .path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?
            .pop_if_empty()
            .extend(["network", network, "member"]);

        let http = Client::builder()
            .user_agent(HeaderValue::from_static(USER_AGENT_VALUE))
            .build()
            .map_err(|source| ApiError::Connection {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            members_url,
            http,
            token: token.to_string(),
        })
    }

    pub fn list_members(&self) -> Result<Vec<Member>, ApiError> {
        let url = self.members_url.clone();
        let response = self.send(Method::GET, url.clone(), None)?;
        decode(response, &url)
    }

    pub fn get_member(&self, address: &str) -> Result<Member, ApiError> {
        let url = self.member_url(address)?;
        let response = self.send(Method::GET, url.clone(), None)?;
        decode(response, &url)
    }

    /// Sends only the fields set in `update`; an empty update never reaches the network.
    pub fn update_member(&self, address: &str, update: &MemberUpdate) -> Result<(), ApiError> {
        if update.is_empty() {
            return Err(ApiError::EmptyUpdate);
        }
        let url = self.member_url(address)?;
        self.send(Method::POST, url, Some(update))?;
        info!(%address, "member updated");
        Ok(())
    }

    pub fn delete_member(&self, address: &str) -> Result<(), ApiError> {
        let url = self.member_url(address)?;
        self.send(Method::DELETE, url, None)?;
        info!(%address, "member deleted");
        Ok(())
    }

    /// An empty address would address the member collection itself.
    fn member_url(&self, address: &str) -> Result<Url, ApiError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ApiError::EmptyAddress);
        }
        let mut url = self.members_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.members_url.to_string()))?
            .push(address);
        Ok(url)
    }

    fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&MemberUpdate>,
    ) -> Result<Response, ApiError> {
        debug!(%method, %url, "sending request");

        let mut request = self
            .http
            .request(method, url.clone())
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|source| ApiError::Connection {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        warn!(status = status.as_u16(), %url, "request failed");
        Err(ApiError::from_status(status, &url, body))
    }
}

fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, ApiError> {
    let text = response.text().map_err(|source| ApiError::Connection {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.base_url(), "net1", "secret").unwrap()
    }

    #[test]
    fn lists_members_with_token_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/network/net1/member")
                .header("Authorization", "token secret");
            then.status(200).json_body(json!([
                { "nodeId": "aaaa", "config": { "authorized": true } },
                { "nodeId": "bbbb" }
            ]));
        });

        let members = client(&server).list_members().unwrap();

        mock.assert();
        let ids: Vec<_> = members.iter().map(|m| m.node_id.as_str()).collect();
        assert_eq!(ids, ["aaaa", "bbbb"]);
    }

    #[test]
    fn identifies_itself_with_crate_user_agent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/network/net1/member")
                .header("user-agent", USER_AGENT_VALUE);
            then.status(200).json_body(json!([]));
        });

        client(&server).list_members().unwrap();
        mock.assert();
    }

    #[test]
    fn keeps_base_path_prefix() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/network/net1/member/abcd");
            then.status(200).json_body(json!({ "nodeId": "abcd", "name": "nas" }));
        });

        let client = ApiClient::new(&server.url("/api/v1"), "net1", "secret").unwrap();
        let member = client.get_member("abcd").unwrap();

        mock.assert();
        assert_eq!(member.name.as_deref(), Some("nas"));
    }

    #[test]
    fn posts_only_authorization_flag() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/network/net1/member/abcd")
                .json_body(json!({ "config": { "authorized": false } }));
            then.status(200).json_body(json!({ "nodeId": "abcd" }));
        });

        client(&server)
            .update_member("abcd", &MemberUpdate::authorization(false))
            .unwrap();

        mock.assert();
    }

    #[test]
    fn refuses_empty_update_without_request() {
        let server = MockServer::start();
        let mock = server.mock(|_when, then| {
            then.status(200);
        });

        let err = client(&server)
            .update_member("abcd", &MemberUpdate::default())
            .unwrap_err();

        assert!(matches!(err, ApiError::EmptyUpdate));
        mock.assert_hits(0);
    }

    #[test]
    fn empty_address_never_reaches_the_collection() {
        let server = MockServer::start();
        let mock = server.mock(|_when, then| {
            then.status(200).json_body(json!([]));
        });

        let client = client(&server);
        assert!(matches!(
            client.delete_member("").unwrap_err(),
            ApiError::EmptyAddress
        ));
        assert!(matches!(
            client.get_member("  ").unwrap_err(),
            ApiError::EmptyAddress
        ));
        assert!(matches!(
            client
                .update_member("", &MemberUpdate::authorization(true))
                .unwrap_err(),
            ApiError::EmptyAddress
        ));
        mock.assert_hits(0);
    }

    #[test]
    fn error_message_omits_blank_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/network/net1/member/gone");
            then.status(404);
        });

        let message = client(&server).get_member("gone").unwrap_err().to_string();
        assert!(message.contains("/network/net1/member/gone; check the member address"));
    }

    #[test]
    fn deletes_member() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/network/net1/member/abcd");
            then.status(200);
        });

        client(&server).delete_member("abcd").unwrap();
        mock.assert();
    }

    #[test]
    fn classifies_error_statuses() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/network/net1/member/missing");
            then.status(404).body(r#"{"message":"member not found"}"#);
        });
        server.mock(|when, then| {
            when.path("/network/net1/member/locked");
            then.status(403)
                .body(r#"{"message":"token lacks access to network"}"#);
        });
        server.mock(|when, then| {
            when.path("/network/net1/member/broken");
            then.status(502).body("bad gateway");
        });
        server.mock(|when, then| {
            when.path("/network/net1/member/odd");
            then.status(409).body("conflict");
        });

        let client = client(&server);
        let missing = client.get_member("missing").unwrap_err();
        let message = missing.to_string();
        assert!(message.starts_with("not found (404) at "));
        assert!(message.contains(r#": {"message":"member not found"}; check"#));
        match missing {
            ApiError::NotFound { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, r#"{"message":"member not found"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match client.delete_member("locked").unwrap_err() {
            ApiError::Unauthorized { status, body, .. } => {
                assert_eq!(status, 403);
                assert!(body.contains("token lacks access"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match client.get_member("broken").unwrap_err() {
            ApiError::Server { status, body, .. } => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            client
                .update_member("odd", &MemberUpdate::authorization(true))
                .unwrap_err(),
            ApiError::Status { status: 409, .. }
        ));
    }

    #[test]
    fn list_failure_is_an_error_not_an_empty_list() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/network/net1/member");
            then.status(401);
        });

        assert!(matches!(
            client(&server).list_members().unwrap_err(),
            ApiError::Unauthorized { status: 401, .. }
        ));
    }

    #[test]
    fn reports_connection_failure() {
        let client = ApiClient::new("http://127.0.0.1:9", "net1", "secret").unwrap();
        assert!(matches!(
            client.list_members().unwrap_err(),
            ApiError::Connection { .. }
        ));
    }

    #[test]
    fn rejects_malformed_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/network/net1/member");
            then.status(200).body("<html>maintenance</html>");
        });

        assert!(matches!(
            client(&server).list_members().unwrap_err(),
            ApiError::Decode { .. }
        ));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", "net1", "secret").unwrap_err(),
            ApiError::InvalidUrl(_)
        ));
    }
}
