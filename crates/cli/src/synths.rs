use colored::Colorize;
use fund_value_sdk::{
    num::Converter,
    release::Release,
    state::{ChainState, Snapshot},
    types::currency_key_symbol,
};
use tabled::{Table, builder::Builder, settings::Style};

pub(crate) fn render(release: &Release, state: &Snapshot) -> anyhow::Result<()> {
    let feed = release.synthetix_price_feed();
    let rate_converter = Converter::new(18)?;

    let mut synths = feed.synths();
    synths.sort();

    let mut builder = Builder::default();
    builder.push_record(["Synth", "Currency key", "Rate (sUSD)", "Valid"]);
    for synth in synths {
        let Some(key) = feed.get_currency_key_for_synth(synth) else { continue };
        let (rate, valid) = match state.exchange_rate(key) {
            Some(rate) => (rate_converter.format(rate.rate()), rate.is_valid()),
            None => ("-".to_string(), false),
        };
        // Registered key lags behind Synthetix until resynced
        let symbol = if state.synth_currency_key(synth).is_some_and(|current| current != key) {
            format!("{} (outdated)", currency_key_symbol(&key)).yellow().to_string()
        } else {
            currency_key_symbol(&key)
        };
        builder.push_record([
            synth.to_string(),
            symbol,
            rate,
            if valid { "yes".green().to_string() } else { "no".red().to_string() },
        ]);
    }

    println!("{}", state.instant().to_string().dimmed());
    println!("{} sUSD {}", "Synthetix".blue(), feed.susd());
    let mut table: Table = builder.build();
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}
