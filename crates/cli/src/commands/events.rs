//! `events list|book`.

use stagedoor_client::AppError;
use stagedoor_client::discovery::EventSummary;

use super::Context;
use crate::output;

pub async fn list(ctx: &Context, page: u32) -> Result<(), AppError> {
    let events = ctx.discovery.events(page).await?;

    if events.is_empty() {
        output::line("No events on this page");
        return Ok(());
    }
    for event in &events {
        output::line(&describe(event));
    }
    Ok(())
}

pub async fn book(ctx: &Context, page: u32, event_id: &str) -> Result<(), AppError> {
    ctx.require_identity().await?;

    let event = ctx
        .discovery
        .find(page, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event {event_id} on page {page}")))?;

    ctx.booking().book(&event).await?;
    output::line(&format!(
        "Booked {} for {}",
        event.name,
        event.price_range.min.display()
    ));
    Ok(())
}

fn describe(event: &EventSummary) -> String {
    let range = &event.price_range;
    let mut line = format!(
        "{}  {}  {} - {}{}",
        event.id,
        event.name,
        range.min.display(),
        range.max.display(),
        if range.estimated { " (est.)" } else { "" }
    );
    if let Some(date) = &event.date {
        line.push_str("  ");
        line.push_str(date);
    }
    match (&event.venue, &event.city) {
        (Some(venue), Some(city)) => line.push_str(&format!("  @ {venue}, {city}")),
        (Some(place), None) | (None, Some(place)) => line.push_str(&format!("  @ {place}")),
        (None, None) => {}
    }
    line
}
