use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Deserialize;
use thiserror::Error;

use crate::remote::discovery::ServiceHandle;

/// Scalar type a parameter declares via its OSC type-tag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Text,
    Unknown,
}

impl ParamType {
    /// The first tag of a type-tag string is authoritative; the rest would
    /// only matter for multi-argument messages, which are not sent here.
    pub fn from_tags(tags: &str) -> ParamType {
        match tags.chars().next() {
            Some('i') => ParamType::Int,
            Some('f') | Some('d') => ParamType::Float,
            Some('s') => ParamType::Text,
            Some('T') | Some('F') => ParamType::Bool,
            _ => ParamType::Unknown,
        }
    }
}

/// OSCQuery ACCESS attribute of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    NoValue,
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn from_code(code: u8) -> Option<AccessMode> {
        match code {
            0 => Some(AccessMode::NoValue),
            1 => Some(AccessMode::ReadOnly),
            2 => Some(AccessMode::WriteOnly),
            3 => Some(AccessMode::ReadWrite),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AccessMode::NoValue => "no-value",
            AccessMode::ReadOnly => "read-only",
            AccessMode::WriteOnly => "write-only",
            AccessMode::ReadWrite => "read-write",
        }
    }

    pub fn forbids_write(self) -> bool {
        matches!(self, AccessMode::NoValue | AccessMode::ReadOnly)
    }
}

/// One node of the OSCQuery namespace, as served over HTTP.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterNode {
    #[serde(rename = "FULL_PATH", default)]
    pub full_path: String,
    #[serde(rename = "TYPE")]
    pub type_tags: Option<String>,
    #[serde(rename = "ACCESS")]
    pub access: Option<u8>,
    #[serde(rename = "VALUE")]
    pub value: Option<Vec<serde_json::Value>>,
    #[serde(rename = "CONTENTS")]
    pub contents: Option<BTreeMap<String, ParameterNode>>,
}

impl ParameterNode {
    /// Declared scalar type, if the node declares a non-empty tag string.
    pub fn param_type(&self) -> Option<ParamType> {
        self.type_tags
            .as_deref()
            .filter(|tags| !tags.is_empty())
            .map(ParamType::from_tags)
    }

    /// Unknown access codes count as absent metadata.
    pub fn access_mode(&self) -> Option<AccessMode> {
        self.access.and_then(AccessMode::from_code)
    }

    pub fn child_count(&self) -> usize {
        self.contents.as_ref().map_or(0, |children| children.len())
    }

    /// Current value for display, if the server reported one.
    pub fn display_value(&self) -> String {
        match self.value.as_ref().and_then(|values| values.first()) {
            Some(value) => value.to_string(),
            None => "none".to_string(),
        }
    }
}

/// HOST_INFO reply: where the OSC/UDP side of the peer listens.
#[derive(Debug, Clone, Deserialize)]
pub struct HostInfo {
    #[serde(rename = "NAME", default)]
    pub name: String,
    #[serde(rename = "OSC_IP")]
    pub osc_ip: Option<String>,
    #[serde(rename = "OSC_PORT")]
    pub osc_port: u16,
    #[serde(rename = "OSC_TRANSPORT", default = "default_transport")]
    pub osc_transport: String,
}

fn default_transport() -> String {
    "UDP".to_string()
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("malformed reply from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read side of the OSCQuery protocol, one HTTP GET per lookup. Every call
/// returns a fresh snapshot; nothing is cached.
pub trait ParameterQuery {
    fn query_node(&self, path: &str) -> Result<Option<ParameterNode>, QueryError>;
}

pub struct OscQueryClient {
    http: reqwest::blocking::Client,
    base: String,
}

impl OscQueryClient {
    pub fn new(service: &ServiceHandle) -> OscQueryClient {
        OscQueryClient::for_endpoint(service.address, service.port)
    }

    pub fn for_endpoint(address: IpAddr, port: u16) -> OscQueryClient {
        let host = match address {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{}]", v6),
        };
        OscQueryClient {
            http: reqwest::blocking::Client::new(),
            base: format!("http://{}:{}", host, port),
        }
    }

    /// GET `url`, mapping 404 to `None` and anything else non-2xx to an error.
    fn fetch(&self, url: &str) -> Result<Option<String>, QueryError> {
        let response = self.http.get(url).send().map_err(|source| QueryError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(QueryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(|source| QueryError::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok(Some(body))
    }

    /// Fetch the HOST_INFO document describing the peer's OSC endpoint.
    pub fn host_info(&self) -> Result<HostInfo, QueryError> {
        let url = format!("{}/?HOST_INFO", self.base);
        match self.fetch(&url)? {
            Some(body) => {
                serde_json::from_str(&body).map_err(|source| QueryError::Malformed { url, source })
            }
            None => Err(QueryError::Status { url, status: 404 }),
        }
    }
}

impl ParameterQuery for OscQueryClient {
    fn query_node(&self, path: &str) -> Result<Option<ParameterNode>, QueryError> {
        let url = format!("{}{}", self.base, path);
        match self.fetch(&url)? {
            Some(body) => serde_json::from_str(&body)
                .map(Some)
                .map_err(|source| QueryError::Malformed { url, source }),
            None => Ok(None),
        }
    }
}

/// Outcome of a metadata lookup. Lookup problems are reported here and do
/// not propagate further.
#[derive(Debug)]
pub enum Fetched {
    Node(ParameterNode),
    NotFound,
    Failed(QueryError),
}

pub fn fetch_parameter(query: &dyn ParameterQuery, path: &str) -> Fetched {
    match query.query_node(path) {
        Ok(Some(node)) => Fetched::Node(node),
        Ok(None) => {
            println!("Parameter '{}' not found.", path);
            Fetched::NotFound
        }
        Err(err) => {
            eprintln!("Error querying parameter '{}': {}", path, err);
            Fetched::Failed(err)
        }
    }
}
