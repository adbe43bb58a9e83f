//! Card components for the dashboard's headline statistics and the
//! per-category breakdown list.

use maud::{Markup, html};

use crate::{
    dashboard::stats::{AggregateStats, CategoryTotal},
    html::format_currency,
};

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";

/// Formats a percentage with one decimal place, avoiding "-0.0%" display.
fn format_percentage(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.abs() < 0.05 {
        "0".to_string()
    } else {
        format!("{:.1}", rounded)
    }
}

/// Renders the grid of headline statistic cards.
///
/// `all_time_total` is the unfiltered total for comparison; it is shown under
/// the total-spent card when a date range filter is active.
pub(super) fn stat_cards_view(stats: &AggregateStats, all_time_total: Option<f64>) -> Markup {
    html! {
        section class="w-full mx-auto mb-4" {
            div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-4" {
                (stat_card(
                    "Total Spent",
                    &format_currency(stats.total_spent),
                    all_time_total.map(|total| format!("of {} all time", format_currency(total))),
                ))
                (stat_card(
                    "Daily Average",
                    &format_currency(stats.avg_daily),
                    None,
                ))
                (stat_card(
                    "Monthly Average",
                    &format_currency(stats.avg_monthly),
                    Some("Last 3 months".to_string()),
                ))
                (stat_card(
                    "Highest Expense",
                    &format_currency(stats.highest_expense),
                    None,
                ))
            }
        }
    }
}

fn stat_card(title: &str, value: &str, subtitle: Option<String>) -> Markup {
    html! {
        div class=(CARD_STYLE) {
            h4 class="text-sm font-medium text-gray-600 dark:text-gray-400 mb-1" {
                (title)
            }
            div class="text-3xl font-bold" {
                (value)
            }
            @if let Some(subtitle) = subtitle {
                div class="text-sm text-gray-600 dark:text-gray-400 mt-1" {
                    (subtitle)
                }
            }
        }
    }
}

/// Renders the per-category breakdown list with percentage bars.
pub(super) fn category_breakdown_view(breakdown: &[CategoryTotal]) -> Markup {
    if breakdown.is_empty() {
        return html! {};
    }

    html! {
        div class=(CARD_STYLE) {
            h3 class="text-xl font-semibold mb-4" { "Spending by Category" }

            div class="space-y-3" {
                @for entry in breakdown {
                    div {
                        div class="flex justify-between items-baseline text-sm mb-1" {
                            span class="font-medium truncate" title=(entry.category) {
                                (entry.category)
                            }
                            span class="text-gray-600 dark:text-gray-400" {
                                (format_currency(entry.amount))
                                " · "
                                (format_percentage(entry.percentage)) "%"
                            }
                        }
                        (progress_bar(entry.percentage))
                    }
                }
            }
        }
    }
}

/// Renders a horizontal progress bar showing percentage of total spending.
fn progress_bar(percentage: f64) -> Markup {
    let clamped = percentage.clamp(0.0, 100.0);

    // Ensure minimum 3% width so rounded corners are visible
    let display_percentage = if clamped > 0.0 && clamped < 3.0 {
        3.0
    } else {
        clamped
    };

    html! {
        div
            class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-2.5"
            role="progressbar"
            aria-valuenow=(format_percentage(clamped))
            aria-valuemin="0"
            aria-valuemax="100"
        {
            @if clamped > 0.0 {
                div
                    class="bg-blue-600 dark:bg-blue-500 h-2.5 rounded-full transition-all"
                    style=(format!("width: {:.1}%", display_percentage))
                {}
            }
        }
    }
}
