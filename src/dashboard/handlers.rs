//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for displaying the dashboard
//! - HTML view functions for rendering the dashboard UI
//! - The state and query types used by the handler

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id},
    dashboard::{
        cards::{category_breakdown_view, stat_cards_view},
        charts::{DashboardChart, build_dashboard_charts, charts_script},
        query::{ExpenseRow, get_expenses},
        stats::{AggregateStats, DateRangeFilter, compute},
        tables::recent_expenses_table,
    },
    endpoints,
    html::{HeadElement, PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
    timezone::local_today,
};

/// The pinned CDN URL for the ECharts library, loaded only on this page.
const ECHARTS_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@5.5.1/dist/echarts.min.js";

/// The state needed for displaying the dashboard page.
///
/// Contains the database connection and timezone information required
/// by the dashboard handler.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters accepted by the dashboard page.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// The selected date range filter, e.g. "week" or "3months".
    #[serde(default)]
    pub filter: Option<String>,
}

/// Display a page with an overview of the user's spending.
///
/// The date range filter from the query string bounds which expenses are
/// aggregated; the aggregation itself is the pure [compute] function. When a
/// filter is active, a second unfiltered aggregation supplies the all-time
/// comparison figure.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let filter = DateRangeFilter::from_query(query.filter.as_deref().unwrap_or("all"));

    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get user {user_id}: {error}"))?;

    let expenses = get_expenses(user_id, filter.start_date(today), &connection)
        .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    if expenses.is_empty() && filter == DateRangeFilter::All {
        return Ok(dashboard_no_data_view(nav_bar, user.email.as_ref()).into_response());
    }

    let stats = compute(&expenses, today);

    // The filtered window gets an unfiltered comparison figure; for the
    // all-time view the comparison would just repeat the total.
    let all_time_total = if filter == DateRangeFilter::All {
        None
    } else {
        let all_expenses = get_expenses(user_id, None, &connection)
            .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;
        Some(compute(&all_expenses, today).total_spent)
    };

    let charts = build_dashboard_charts(&stats.monthly_series, &stats.category_breakdown);

    Ok(dashboard_view(
        nav_bar,
        user.email.as_ref(),
        filter,
        &stats,
        all_time_total,
        &charts,
        &expenses,
    )
    .into_response())
}

/// Renders the row of date range filter buttons.
///
/// Each button is a plain link carrying the filter in the query string, so
/// the selected range is explicit in the URL rather than held in any
/// client-side state.
fn filter_bar(active: DateRangeFilter) -> Markup {
    html! {
        div class="flex flex-wrap items-center gap-2 mb-4" {
            span class="text-sm font-medium text-gray-600 dark:text-gray-400" {
                "Filter by:"
            }

            @for filter in DateRangeFilter::all_variants() {
                @let style = if filter == active {
                    "px-3 py-1.5 text-xs font-medium rounded bg-blue-600 text-white"
                } else {
                    "px-3 py-1.5 text-xs font-medium rounded bg-white text-gray-900 \
                    border border-gray-200 hover:bg-gray-100 dark:bg-gray-800 \
                    dark:text-gray-300 dark:border-gray-700 dark:hover:bg-gray-700"
                };

                a
                    href={(endpoints::DASHBOARD_VIEW) "?filter=" (filter.query_value())}
                    class=(style)
                {
                    (filter.label())
                }
            }
        }
    }
}

/// Renders the dashboard page when the user has no expenses at all.
fn dashboard_no_data_view(nav_bar: NavBar, email: &str) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_expense_link = link(endpoints::NEW_EXPENSE_VIEW, "recording your first expense");

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Hello " (email) ". Charts and statistics will show up here
                once you add some expenses. Start by " (new_expense_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

/// Renders the main dashboard page with stat cards, charts, the category
/// breakdown, and the recent-expenses table.
fn dashboard_view(
    nav_bar: NavBar,
    email: &str,
    filter: DateRangeFilter,
    stats: &AggregateStats,
    all_time_total: Option<f64>,
    charts: &[DashboardChart],
    expenses: &[ExpenseRow],
) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            div class="w-full mb-4"
            {
                h2 class="text-3xl font-bold" { "Dashboard" }
                p class="text-gray-600 dark:text-gray-400"
                {
                    "Hello " (email)
                }
                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    (stats.expense_count)
                    @if stats.expense_count == 1 { " expense recorded" }
                    @else { " expenses recorded" }
                }
            }

            (filter_bar(filter))

            (stat_cards_view(stats, all_time_total))

            section
                id="charts"
                class="w-full mx-auto mb-4"
            {
                div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    @for chart in charts {
                        div
                            id=(chart.id)
                            class="min-h-[380px] rounded dark:bg-gray-100"
                        {}
                    }
                }
            }

            div class="w-full mb-4"
            {
                (category_breakdown_view(&stats.category_breakdown))
            }

            @if expenses.is_empty() {
                p class="text-gray-600 dark:text-gray-400 mb-8"
                {
                    "No expenses in this date range."
                }
            } @else {
                (recent_expenses_table(expenses))
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
        charts_script(charts),
    ];

    base("Dashboard", &scripts, &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        body::Body,
        extract::{Query, State},
        http::{Response, StatusCode},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::{Duration, OffsetDateTime};

    use crate::{
        auth::{Email, PasswordHash, UserID, create_user},
        category::{CategoryName, create_category},
        db::initialize,
        expense::{Amount, Expense, create_expense},
    };

    use super::{DashboardQuery, DashboardState, get_dashboard_page};

    fn get_test_state() -> (DashboardState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user(
            Email::new_unchecked("jane@example.com"),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (
            DashboardState {
                db_connection: Arc::new(Mutex::new(conn)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
        )
    }

    fn add_expense(
        state: &DashboardState,
        user_id: UserID,
        amount: f64,
        date: time::Date,
        category_id: Option<i64>,
    ) {
        let connection = state.db_connection.lock().unwrap();
        create_expense(
            Expense::build(Amount::new(amount).unwrap(), date, "test").category_id(category_id),
            user_id,
            &connection,
        )
        .unwrap();
    }

    fn filter_query(filter: Option<&str>) -> Query<DashboardQuery> {
        Query(DashboardQuery {
            filter: filter.map(str::to_string),
        })
    }

    async fn parse_html(response: Response<Body>) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[track_caller]
    fn assert_chart_exists(html: &Html, chart_id: &str) {
        let selector = Selector::parse(&format!("#{}", chart_id)).unwrap();
        assert!(
            html.select(&selector).next().is_some(),
            "Chart with id '{}' not found",
            chart_id
        );
    }

    #[tokio::test]
    async fn dashboard_page_loads_successfully() {
        let (state, user_id) = get_test_state();
        let today = OffsetDateTime::now_utc().date();

        let category_id = {
            let connection = state.db_connection.lock().unwrap();
            create_category(CategoryName::new_unchecked("Food"), "#ef4444", &connection)
                .unwrap()
                .id
        };
        add_expense(&state, user_id, 100.0, today, Some(category_id));
        add_expense(&state, user_id, 50.0, today - Duration::days(15), None);

        let response = get_dashboard_page(State(state), Extension(user_id), filter_query(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;

        assert_chart_exists(&html, "monthly-trend-chart");
        assert_chart_exists(&html, "category-chart");

        let table_selector = Selector::parse("table").unwrap();
        assert!(
            html.select(&table_selector).next().is_some(),
            "Recent expenses table not found"
        );
    }

    #[tokio::test]
    async fn displays_prompt_text_on_no_data() {
        let (state, user_id) = get_test_state();

        let response = get_dashboard_page(State(state), Extension(user_id), filter_query(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;

        let table_selector = Selector::parse("table").unwrap();
        assert!(html.select(&table_selector).next().is_none());

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Nothing here yet"));
    }

    #[tokio::test]
    async fn greets_user_by_email() {
        let (state, user_id) = get_test_state();
        let today = OffsetDateTime::now_utc().date();
        add_expense(&state, user_id, 10.0, today, None);

        let response = get_dashboard_page(State(state), Extension(user_id), filter_query(None))
            .await
            .unwrap();
        let html = parse_html(response).await;

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Hello jane@example.com"));
    }

    #[tokio::test]
    async fn filter_excludes_old_expenses() {
        let (state, user_id) = get_test_state();
        let today = OffsetDateTime::now_utc().date();
        add_expense(&state, user_id, 10.0, today, None);
        add_expense(&state, user_id, 500.0, today - Duration::days(60), None);

        let response = get_dashboard_page(
            State(state),
            Extension(user_id),
            filter_query(Some("week")),
        )
        .await
        .unwrap();
        let html = parse_html(response).await;

        let row_selector = Selector::parse("tbody tr").unwrap();
        assert_eq!(html.select(&row_selector).count(), 1);

        // The all-time comparison shows up when a filter is active.
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("all time"));
    }

    #[tokio::test]
    async fn unknown_filter_falls_back_to_all_time() {
        let (state, user_id) = get_test_state();
        let today = OffsetDateTime::now_utc().date();
        add_expense(&state, user_id, 10.0, today, None);
        add_expense(&state, user_id, 500.0, today - Duration::days(400), None);

        let response = get_dashboard_page(
            State(state),
            Extension(user_id),
            filter_query(Some("bogus")),
        )
        .await
        .unwrap();
        let html = parse_html(response).await;

        let row_selector = Selector::parse("tbody tr").unwrap();
        assert_eq!(html.select(&row_selector).count(), 2);
    }

    #[tokio::test]
    async fn filtered_view_with_no_rows_still_renders() {
        let (state, user_id) = get_test_state();
        let today = OffsetDateTime::now_utc().date();
        add_expense(&state, user_id, 500.0, today - Duration::days(60), None);

        let response = get_dashboard_page(
            State(state),
            Extension(user_id),
            filter_query(Some("week")),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("No expenses in this date range."));
    }
}
