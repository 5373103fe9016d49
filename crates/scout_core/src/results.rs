use crate::{Chunk, OfferRecord};

/// Offers and useful sites accumulated over one session.
///
/// Offers are unique by `url` and sites are unique; both keep insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccumulatedResult {
    offers: Vec<OfferRecord>,
    sites: Vec<String>,
}

impl AccumulatedResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offers(&self) -> &[OfferRecord] {
        &self.offers
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty() && self.sites.is_empty()
    }

    fn merge_offer(&mut self, offer: &OfferRecord) {
        if !self.offers.iter().any(|existing| existing.url == offer.url) {
            self.offers.push(offer.clone());
        }
        if !offer.url.is_empty() && !self.sites.iter().any(|site| *site == offer.url) {
            self.sites.push(offer.url.clone());
        }
    }
}

/// Fold one chunk's result fields into the accumulation.
///
/// An incremental `offer` is merged with dedup. A terminal snapshot
/// (`percent == 100` plus `offers` and/or `useful_sites`) replaces whichever
/// sequences it carries, even when they are empty, and leaves the others alone.
pub fn apply(chunk: &Chunk, mut accumulated: AccumulatedResult) -> AccumulatedResult {
    if let Some(offer) = &chunk.offer {
        accumulated.merge_offer(offer);
    }

    if chunk.is_authoritative_terminal() {
        if let Some(offers) = &chunk.offers {
            accumulated.offers = offers.clone();
        }
        if let Some(sites) = &chunk.useful_sites {
            accumulated.sites = sites.clone();
        }
    }

    accumulated
}
