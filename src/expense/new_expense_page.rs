//! The page with the form for recording a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
        dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed to display the add-expense page.
#[derive(Debug, Clone)]
pub struct NewExpensePageState {
    /// The database connection for fetching categories.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for NewExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the page for recording a new expense.
pub async fn get_new_expense_page(
    State(state): State<NewExpensePageState>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    let nav_bar = NavBar::new(endpoints::NEW_EXPENSE_VIEW);

    Ok(new_expense_view(nav_bar, &categories, today).into_response())
}

fn new_expense_view(nav_bar: NavBar, categories: &[Category], today: Date) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md"
            {
                h2 class="text-xl font-bold mb-1" { "Add Expense" }
                p class="text-gray-600 dark:text-gray-400 mb-4" { "Record a new expense entry" }

                form
                    hx-post=(endpoints::EXPENSES_API)
                    hx-indicator="#indicator"
                    hx-disabled-elt="#amount, #description, #date, #category_id, #submit-button"
                    hx-target-error="#alert-container"
                    class="space-y-4"
                {
                    div
                    {
                        label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                        div class="input-wrapper w-full"
                        {
                            input
                                type="number"
                                name="amount"
                                id="amount"
                                step="0.01"
                                min="0.01"
                                placeholder="0.00"
                                class=(FORM_TEXT_INPUT_STYLE)
                                required
                                autofocus;
                        }
                    }

                    div
                    {
                        label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                        textarea
                            name="description"
                            id="description"
                            rows="3"
                            placeholder="What did you spend money on?"
                            class=(FORM_TEXT_INPUT_STYLE)
                            required
                        {}
                    }

                    div
                    {
                        label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                        input
                            type="date"
                            name="date"
                            id="date"
                            value=(today)
                            max=(today)
                            class=(FORM_TEXT_INPUT_STYLE)
                            required;
                    }

                    div
                    {
                        label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                        select
                            name="category_id"
                            id="category_id"
                            class=(FORM_TEXT_INPUT_STYLE)
                        {
                            option value="" { "Uncategorized" }

                            @for category in categories {
                                option value=(category.id) { (category.name) }
                            }
                        }
                    }

                    button
                        type="submit" id="submit-button" tabindex="0"
                        class=(BUTTON_PRIMARY_STYLE)
                    {
                        span class="inline htmx-indicator" id="indicator"
                        {
                            (loading_spinner())
                        }
                        "Add Expense"
                    }
                }
            }
        }
    );

    base("Add Expense", &[dollar_input_styles()], &content)
}
