use alloy::primitives::{Address, U256};
use anyhow::Context;
use colored::Colorize;
use fund_value_sdk::{
    num::Converter,
    release::Release,
    state::{ChainState, Snapshot},
};
use tabled::{Table, builder::Builder, settings::Style};

pub(crate) fn render_value(
    release: &Release,
    state: &Snapshot,
    asset: Address,
    amount: &str,
    quote: Address,
) -> anyhow::Result<()> {
    let asset_converter = converter(state, asset)?;
    let quote_converter = converter(state, quote)?;
    let amount = asset_converter.parse(amount).with_context(|| format!("parsing amount of {asset}"))?;

    let value = release
        .value_interpreter()
        .calc_canonical_asset_value(state, asset, amount, quote)
        .with_context(|| format!("valuing {asset} in {quote}"))?;

    println!("{}", state.instant().to_string().dimmed());
    println!(
        "{} {} = {} {}",
        asset_converter.format(amount),
        asset,
        quote_converter.format(value).green().bold(),
        quote,
    );
    Ok(())
}

pub(crate) fn render_underlying(
    release: &Release,
    state: &Snapshot,
    asset: Address,
    amount: &str,
) -> anyhow::Result<()> {
    let asset_converter = converter(state, asset)?;
    let amount = asset_converter.parse(amount).with_context(|| format!("parsing amount of {asset}"))?;

    let aggregated = release.aggregated_derivative_price_feed();
    let feed = aggregated
        .get_price_feed_for_derivative(asset)
        .with_context(|| format!("{asset} is not a registered derivative"))?;
    let underlying_values = aggregated
        .calc_underlying_values(state, asset, amount)
        .with_context(|| format!("resolving underlyings of {asset}"))?;

    println!("{}", state.instant().to_string().dimmed());
    println!("{} {} via {}", asset_converter.format(amount), asset, feed.name().yellow());

    let mut builder = Builder::default();
    builder.push_record(["Underlying", "Amount"]);
    for (underlying, underlying_amount) in underlying_values.iter() {
        let formatted = match state.decimals(underlying) {
            Some(decimals) => Converter::new(decimals)?.format(underlying_amount),
            None => underlying_amount.to_string(),
        };
        builder.push_record([underlying.to_string(), formatted]);
    }
    let mut table: Table = builder.build();
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}

pub(crate) fn render_gav(
    release: &Release,
    state: &Snapshot,
    holdings: &[(Address, String)],
    quote: Address,
) -> anyhow::Result<()> {
    let quote_converter = converter(state, quote)?;
    let vi = release.value_interpreter();

    let mut assets = Vec::with_capacity(holdings.len());
    let mut amounts = Vec::with_capacity(holdings.len());
    let mut builder = Builder::default();
    builder.push_record(["Asset", "Amount", "Value"]);
    for (asset, amount) in holdings {
        let asset_converter = converter(state, *asset)?;
        let amount = asset_converter.parse(amount).with_context(|| format!("parsing amount of {asset}"))?;
        let value = vi
            .calc_canonical_asset_value(state, *asset, amount, quote)
            .with_context(|| format!("valuing {asset} in {quote}"))?;
        builder.push_record([asset.to_string(), asset_converter.format(amount), quote_converter.format(value)]);
        assets.push(*asset);
        amounts.push(amount);
    }

    let gav: U256 = vi
        .calc_canonical_assets_total_value(state, &assets, &amounts, quote)
        .context("calculating gross asset value")?;

    println!("{}", state.instant().to_string().dimmed());
    let mut table: Table = builder.build();
    table.with(Style::sharp());
    println!("{table}");
    println!("GAV: {} {}", quote_converter.format(gav).green().bold(), quote);
    Ok(())
}

fn converter(state: &Snapshot, asset: Address) -> anyhow::Result<Converter> {
    let decimals = state.decimals(asset).with_context(|| format!("unknown decimals of {asset}"))?;
    Ok(Converter::new(decimals)?)
}
