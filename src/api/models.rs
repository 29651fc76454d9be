use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub keyphrase: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterDomainsRequest {
    #[serde(default)]
    pub domains: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterDomainsResponse {
    pub success: bool,
    pub registered: Vec<String>,
    pub failed: Vec<String>,
}
