//! Harvesting records from an OAI-PMH endpoint.
use std::collections::VecDeque;

use cmdi_record::{Namespaces, Record};
use thiserror::Error;
use tracing::{debug, info};

const RECORDS_XPATH: &str = "oai:ListRecords/oai:record";
const DELETED_XPATH: &str = "oai:header[@status = 'deleted']";
const TOKEN_XPATH: &str = "oai:ListRecords/oai:resumptionToken";
const ERROR_XPATH: &str = "oai:error";
const NO_RECORDS_MATCH: &str = "noRecordsMatch";

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("OAI-PMH error {code}: {message}")]
    Oai { code: String, message: String },
    #[error("Cannot read harvested XML: {0}")]
    Record(#[from] cmdi_record::Error),
}

// One ListRecords response, split up.
#[derive(Debug)]
struct Page {
    records: Vec<String>,
    resumption_token: Option<String>,
}

/// Iterates over the records of one set, fetching pages as they are needed.
///
/// Deleted records carry no metadata and are passed over. A failed request
/// ends the iteration.
pub struct OaiPmhHarvester {
    client: reqwest::blocking::Client,
    endpoint: String,
    set: String,
    pending: VecDeque<String>,
    next: Option<Request>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    Initial,
    Resume(String),
}

impl OaiPmhHarvester {
    pub fn new(endpoint: &str, set: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            set: set.to_string(),
            pending: VecDeque::new(),
            next: Some(Request::Initial),
        }
    }

    fn query(&self, request: &Request) -> Vec<(&'static str, String)> {
        match request {
            Request::Initial => vec![
                ("verb", "ListRecords".to_string()),
                ("metadataPrefix", "cmdi".to_string()),
                ("set", self.set.clone()),
            ],
            // a resumption token is exclusive with all other arguments
            Request::Resume(token) => vec![
                ("verb", "ListRecords".to_string()),
                ("resumptionToken", token.clone()),
            ],
        }
    }

    fn fetch(&self, request: &Request) -> Result<Page, HarvestError> {
        let url = self.endpoint.clone();
        debug!(url = url.as_str(), ?request, "fetching ListRecords page");
        let response = self
            .client
            .get(&url)
            .query(&self.query(request))
            .send()
            .map_err(|source| HarvestError::Http {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response
            .text()
            .map_err(|source| HarvestError::Http { url, source })?;
        parse_page(&body)
    }
}

impl Iterator for OaiPmhHarvester {
    type Item = Result<Record, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(xml) = self.pending.pop_front() {
                return Some(Record::parse(&xml, Namespaces::cmdi()).map_err(HarvestError::from));
            }
            let request = self.next.take()?;
            match self.fetch(&request) {
                Ok(page) => {
                    info!(records = page.records.len(), "harvested page");
                    self.pending.extend(page.records);
                    self.next = page.resumption_token.map(Request::Resume);
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

fn parse_page(xml: &str) -> Result<Page, HarvestError> {
    let mut response = Record::parse(xml, Namespaces::cmdi())?;
    if let Some(&error) = response.select_all(ERROR_XPATH)?.first() {
        let code = match response.select(error, "@code")?.first() {
            Some(&code) => response.text(code),
            None => String::new(),
        };
        if code == NO_RECORDS_MATCH {
            return Ok(Page {
                records: Vec::new(),
                resumption_token: None,
            });
        }
        return Err(HarvestError::Oai {
            code,
            message: response.text(error).trim().to_string(),
        });
    }

    let mut records = Vec::new();
    for record in response.select_all(RECORDS_XPATH)? {
        if response.exists(record, DELETED_XPATH)? {
            debug!("skipping deleted record");
            continue;
        }
        records.push(response.node_xml(record)?);
    }
    let resumption_token = match response.select_all(TOKEN_XPATH)?.first() {
        Some(&token) => Some(response.text(token).trim().to_string()),
        None => None,
    }
    .filter(|token| !token.is_empty());
    Ok(Page {
        records,
        resumption_token,
    })
}
