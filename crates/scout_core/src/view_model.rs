use crate::{OfferRecord, SessionState};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub base_url: String,
    pub request_input: String,
    pub info_fields: Vec<String>,
    pub status: Option<String>,
    pub percent: Option<u8>,
    pub error: Option<String>,
    pub offers: Vec<OfferRecord>,
    pub sites: Vec<String>,
    pub awaiting_endpoint: bool,
    pub dirty: bool,
}
