//! Plays one trading day against an in-memory market.
//!
//! Seeds a small catalog and the player "Kevin", opens today's market, buys
//! the cheapest item and sells part of it back, then prints the player view.

use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

use tradepost_infra::{
    InMemoryCatalog, InMemoryEventStore, MarketConfig, MarketService, SystemClock,
};

fn main() -> Result<()> {
    tradepost_observability::init();

    let config = MarketConfig::from_env().context("invalid market configuration")?;
    tracing::info!(
        starting_balance = %config.starting_balance,
        policy = ?config.balance_policy,
        seed = ?config.price_seed,
        "starting simulation"
    );

    let service = MarketService::new(
        Arc::new(InMemoryEventStore::new()),
        Arc::new(InMemoryCatalog::new()),
        SystemClock,
        config,
    );

    let catalog: [(&str, &str, Decimal, Decimal); 4] = [
        ("Sword", "A sturdy blade", dec!(100), dec!(0.2)),
        ("Axe", "A chopping tool", dec!(50), dec!(0.1)),
        ("Dagger", "A small weapon", dec!(5), dec!(0.1)),
        ("Legendary Sword", "A powerful artifact", dec!(10000), dec!(0.5)),
    ];
    for (name, description, base, vol) in catalog {
        service
            .create_item(name, description, base, vol)
            .with_context(|| format!("failed to create item {name}"))?;
    }

    let player = service
        .create_player("Kevin", None)
        .context("failed to seed player")?;
    let market = service.enter_market(player.id)?;

    let cheapest = market
        .daily_prices
        .iter()
        .min_by_key(|p| p.price)
        .context("market has no prices")?;
    let item = cheapest.item.as_ref().context("priced item missing from catalog")?;

    let affordable = (market.balance / cheapest.price).floor();
    let quantity = affordable.min(Decimal::TEN).to_i64().unwrap_or(0);
    if quantity > 0 {
        let bought = service.buy(player.id, item.id, quantity)?;
        tracing::info!(item = %item.name, quantity = bought.line.quantity, "holding after buy");

        let sold = service.sell(player.id, item.id, quantity / 2 + 1)?;
        tracing::info!(item = %item.name, quantity = sold.quantity, "holding after sell");
    } else {
        tracing::warn!(item = %item.name, price = %cheapest.price, "cannot afford any units");
    }

    // Selling more than is held is rejected and leaves the player untouched.
    if let Err(err) = service.sell(player.id, item.id, 1_000) {
        tracing::info!(code = ?err.domain_code(), error = %err, "oversell rejected");
    }

    let summary = service.player_by_name("Kevin")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
