use scout_core::{AppViewModel, OfferRecord, SessionState};

pub(crate) fn session_label(session: SessionState) -> &'static str {
    match session {
        SessionState::Idle => "Idle",
        SessionState::Running => "Running",
        SessionState::Done => "Done",
        SessionState::Stopped => "Stopped",
        SessionState::Error => "Error",
    }
}

/// One status line, e.g. `[ 40%] Running | Scraping: https://...`.
pub(crate) fn progress_line(view: &AppViewModel) -> String {
    let percent = match view.percent {
        Some(p) => format!("{p:>3}%"),
        None => "  --".to_string(),
    };
    match &view.status {
        Some(status) => format!("[{percent}] {} | {status}", session_label(view.session)),
        None => format!("[{percent}] {}", session_label(view.session)),
    }
}

pub(crate) fn format_offer(index: usize, offer: &OfferRecord) -> String {
    let supplier = offer.supplier.as_deref().unwrap_or("Unknown supplier");
    let part = match (&offer.part_number, &offer.equivalent) {
        (Some(part), Some(eq)) => format!("{part} (equivalent {eq})"),
        (Some(part), None) => part.clone(),
        (None, Some(eq)) => format!("equivalent {eq}"),
        (None, None) => "-".to_string(),
    };
    let price = match (offer.price, &offer.currency) {
        (Some(price), Some(currency)) => format!("{price:.2} {currency}"),
        (Some(price), None) => format!("{price:.2}"),
        _ => "price n/a".to_string(),
    };
    let quantity = offer
        .quantity
        .map(|q| format!("qty {q}"))
        .unwrap_or_else(|| "qty n/a".to_string());

    let mut out = format!(
        "{n:>2}. {supplier} | {part} | {price} | {quantity}\n    {url}",
        n = index + 1,
        url = offer.url
    );
    if let Some(context) = offer.context.as_deref().filter(|c| !c.trim().is_empty()) {
        out.push_str(&format!("\n    {}", context.trim()));
    }
    if !offer.images.is_empty() {
        out.push_str(&format!("\n    images: {}", offer.images.join(", ")));
        if let Some(description) = offer.images_description.as_deref() {
            out.push_str(&format!(" ({description})"));
        }
    }
    out
}

/// Final block printed once the session settles.
pub(crate) fn summary(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![format!(
        "Session {}: {} offer(s), {} useful site(s)",
        session_label(view.session).to_lowercase(),
        view.offers.len(),
        view.sites.len()
    )];
    if let Some(error) = &view.error {
        lines.push(format!("Error: {error}"));
    }
    for (i, offer) in view.offers.iter().enumerate() {
        lines.push(format_offer(i, offer));
    }
    if !view.sites.is_empty() {
        lines.push("Useful sites:".to_string());
        lines.extend(view.sites.iter().map(|site| format!("  - {site}")));
    }
    lines
}
