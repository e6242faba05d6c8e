//! `orders list|create|delete|summary`.

use stagedoor_client::AppError;
use stagedoor_core::types::order::parse_price;
use stagedoor_core::{NewOrder, Order, OrderId};

use super::Context;
use crate::output;

/// Order fields as typed on the command line.
pub struct Draft {
    pub title: String,
    pub price: String,
    pub date: Option<String>,
    pub venue: Option<String>,
    pub location: Option<String>,
    pub event_id: Option<String>,
}

pub async fn list(ctx: &Context, all: bool) -> Result<(), AppError> {
    let orders = if all {
        ctx.require_admin().await?;
        ctx.orders().list_all().await?
    } else {
        ctx.orders().list_for_session().await?
    };

    if orders.is_empty() {
        output::line("No orders");
        return Ok(());
    }
    for order in &orders {
        output::line(&describe(order));
    }
    Ok(())
}

pub async fn create(ctx: &Context, draft: Draft) -> Result<(), AppError> {
    let price = parse_price(&draft.price)?;

    let mut order = NewOrder::new(draft.title, price, None);
    order.event_date = draft.date;
    order.venue = draft.venue;
    order.location = draft.location;
    order.event_id = draft.event_id;

    let created = ctx.orders().create(order).await?;
    output::line("Order created");
    output::json(&created);
    Ok(())
}

pub async fn delete(ctx: &Context, id: OrderId) -> Result<(), AppError> {
    ctx.orders().delete(id).await?;
    output::line(&format!("Order {id} deleted"));
    Ok(())
}

pub async fn summary(ctx: &Context) -> Result<(), AppError> {
    ctx.require_admin().await?;
    let summary = ctx.orders().summary().await?;

    output::line(&format!("Orders:  {}", summary.count));
    output::line(&format!("Revenue: {}", summary.revenue.display()));
    output::line(&format!("Average: {}", summary.average.display()));
    Ok(())
}

fn describe(order: &Order) -> String {
    let id = order
        .id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    let title = order.title.as_deref().unwrap_or("(untitled)");
    let price = order
        .price()
        .map_or_else(|| "n/a".to_string(), |p| p.display());

    let mut line = format!("#{id}  {title}  {price}");
    if let Some(date) = &order.event_date {
        line.push_str("  ");
        line.push_str(date);
    }
    if let Some(venue) = &order.venue {
        line.push_str("  @ ");
        line.push_str(venue);
    }
    line
}
