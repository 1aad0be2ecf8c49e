use average::Mean;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    core::aggregate::aggregate_all,
    quantity::price::MegawattHourPrice,
    render::Dashboard,
};

const MONTHS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Yearly and monthly means of every configured country, marking those missing from the map.
pub fn build_summary_table(dashboard: &Dashboard, year: i32) -> Table {
    let aggregates = aggregate_all(dashboard.store(), dashboard.countries(), year);
    let overall_mean = {
        let estimate: Mean =
            aggregates.iter().filter_map(|aggregate| aggregate.average_price).map(|price| price.0).collect();
        if estimate.is_empty() { MegawattHourPrice::ZERO } else { MegawattHourPrice(estimate.mean()) }
    };

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(["Country", "Map", "Mean"].into_iter().chain(MONTHS).collect_vec());

    for aggregate in &aggregates {
        let on_map = dashboard.boundaries().contains(&aggregate.country);
        let mut row = vec![
            Cell::new(&aggregate.country),
            if on_map {
                Cell::new("✓").fg(Color::Green)
            } else {
                Cell::new("✗").fg(Color::Red)
            },
            price_cell(aggregate.average_price, overall_mean).add_attribute(Attribute::Bold),
        ];
        if let Some(series) = dashboard.store().get(&aggregate.country) {
            row.extend(
                series
                    .mean_monthly_prices(year)
                    .into_iter()
                    .map(|price| price_cell(price, overall_mean)),
            );
        }
        table.add_row(row);
    }
    table
}

fn price_cell(price: Option<MegawattHourPrice>, mean: MegawattHourPrice) -> Cell {
    match price {
        Some(price) => Cell::new(format!("{:.2}", price.0))
            .set_alignment(CellAlignment::Right)
            .fg(if price >= mean { Color::Red } else { Color::Green }),
        None => Cell::new("n/a").set_alignment(CellAlignment::Right).add_attribute(Attribute::Dim),
    }
}
