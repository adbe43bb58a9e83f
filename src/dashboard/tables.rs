//! The recent-expenses table shown on the dashboard.

use maud::{Markup, html};
use time::{
    Date,
    format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{
    dashboard::{query::ExpenseRow, stats::UNCATEGORIZED_LABEL},
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        format_currency,
    },
};

/// Display format for expense dates, e.g. "Jan 5, 2024".
const DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[month repr:short] [day padding:none], [year]");

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Renders the table of recent expenses with category badges and per-row
/// delete buttons.
pub(super) fn recent_expenses_table(expenses: &[ExpenseRow]) -> Markup {
    html! {
        div class="w-full" {
            h3 class="text-xl font-semibold mb-1" { "Recent Expenses" }
            p class="text-sm text-gray-600 dark:text-gray-400 mb-4" { "Your expense history" }

            div class="overflow-x-auto rounded-lg shadow" {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                    thead class=(TABLE_HEADER_STYLE) {
                        tr {
                            th scope="col" class="px-6 py-3" { "Date" }
                            th scope="col" class="px-6 py-3" { "Description" }
                            th scope="col" class="px-6 py-3" { "Category" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                            th scope="col" class="px-6 py-3 text-right" { "Actions" }
                        }
                    }
                    tbody {
                        @for expense in expenses {
                            (expense_row(expense))
                        }
                    }
                }
            }
        }
    }
}

fn expense_row(expense: &ExpenseRow) -> Markup {
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_EXPENSE, expense.id);

    html! {
        tr class=(TABLE_ROW_STYLE) {
            td class={(TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white whitespace-nowrap"} {
                (format_date(expense.date))
            }
            td class=(TABLE_CELL_STYLE) {
                (expense.description)
            }
            td class=(TABLE_CELL_STYLE) {
                (category_badge(expense.category.as_deref(), expense.color.as_deref()))
            }
            td class={(TABLE_CELL_STYLE) " text-right font-medium"} {
                (format_currency(expense.amount))
            }
            td class={(TABLE_CELL_STYLE) " text-right"} {
                button
                    hx-delete=(delete_url)
                    hx-target="closest tr"
                    hx-swap="outerHTML"
                    hx-target-error="#alert-container"
                    hx-confirm="Delete this expense?"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

/// A colored pill showing the expense's category.
///
/// The badge is tinted with the category's color: a translucent background
/// and border with the full color for the text, matching how the category
/// list renders swatches.
fn category_badge(category: Option<&str>, color: Option<&str>) -> Markup {
    let label = category.unwrap_or(UNCATEGORIZED_LABEL);

    match color {
        Some(color) => html! {
            span
                class="inline-flex items-center px-2.5 py-0.5 text-xs font-semibold rounded-full"
                style=(format!(
                    "background-color: {color}20; color: {color}; border: 1px solid {color}40"
                ))
            {
                (label)
            }
        },
        None => html! {
            span
                class="inline-flex items-center px-2.5 py-0.5 text-xs font-semibold
                    text-gray-800 bg-gray-100 rounded-full dark:bg-gray-700 dark:text-gray-300"
            {
                (label)
            }
        },
    }
}
