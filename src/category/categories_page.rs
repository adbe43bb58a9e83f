//! The page for listing and managing categories.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    category::{Category, db::get_all_categories, domain::DEFAULT_CATEGORY_COLOR},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed to display the categories page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the category management page.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    Ok(categories_view(NavBar::new(endpoints::CATEGORIES_VIEW), &categories).into_response())
}

fn categories_view(nav_bar: NavBar, categories: &[Category]) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl"
            {
                h2 class="text-xl font-bold mb-4" { "Categories" }

                (new_category_form())

                @if categories.is_empty() {
                    p class="text-gray-600 dark:text-gray-400"
                    {
                        "No categories yet. Create one above to start grouping your expenses."
                    }
                } @else {
                    div class="overflow-x-auto rounded-lg shadow"
                    {
                        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr {
                                    th scope="col" class="px-6 py-3" { "Name" }
                                    th scope="col" class="px-6 py-3" { "Color" }
                                    th scope="col" class="px-6 py-3" { "Actions" }
                                }
                            }
                            tbody {
                                @for category in categories {
                                    (category_row(category))
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &[], &content)
}

fn new_category_form() -> Markup {
    html!(
        form
            hx-post=(endpoints::CATEGORIES_API)
            hx-target-error="#alert-container"
            class="flex flex-wrap items-end gap-4 mb-6 bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
        {
            div class="grow"
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }
                input
                    type="text"
                    name="name"
                    id="name"
                    placeholder="e.g. Groceries"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            div
            {
                label for="color" class=(FORM_LABEL_STYLE) { "Color" }
                input
                    type="color"
                    name="color"
                    id="color"
                    value=(DEFAULT_CATEGORY_COLOR)
                    class="h-10 w-16 cursor-pointer rounded border border-gray-300 dark:border-gray-600";
            }

            button type="submit" class={"w-auto " (BUTTON_PRIMARY_STYLE)}
            {
                "Add Category"
            }
        }
    )
}

fn category_row(category: &Category) -> Markup {
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_CATEGORY, category.id);

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class={(TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white"}
            {
                (category.name)
            }
            td class=(TABLE_CELL_STYLE)
            {
                span
                    class="inline-block w-4 h-4 rounded-full align-middle"
                    style=(format!("background-color: {}", category.color))
                {}
            }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(delete_url)
                    hx-target="closest tr"
                    hx-swap="outerHTML"
                    hx-target-error="#alert-container"
                    hx-confirm="Delete this category? Its expenses will become uncategorized."
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    )
}

#[cfg(test)]
mod categories_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        category::{CategoryName, create_category},
        db::initialize,
    };

    use super::{CategoriesPageState, get_categories_page};

    fn get_test_state() -> CategoriesPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        CategoriesPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    async fn parse_html(response: Response<Body>) -> Html {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[tokio::test]
    async fn page_lists_categories() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_category(CategoryName::new_unchecked("Food"), "#ef4444", &connection).unwrap();
            create_category(
                CategoryName::new_unchecked("Transport"),
                "#3b82f6",
                &connection,
            )
            .unwrap();
        }

        let response = get_categories_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;

        let row_selector = Selector::parse("tbody tr").unwrap();
        assert_eq!(html.select(&row_selector).count(), 2);
    }

    #[tokio::test]
    async fn page_shows_empty_state_without_categories() {
        let state = get_test_state();

        let response = get_categories_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;

        let table_selector = Selector::parse("table").unwrap();
        assert!(html.select(&table_selector).next().is_none());
    }

    #[tokio::test]
    async fn page_contains_create_form() {
        let state = get_test_state();

        let response = get_categories_page(State(state)).await.unwrap();
        let html = parse_html(response).await;

        let name_input = Selector::parse("input[name='name']").unwrap();
        let color_input = Selector::parse("input[name='color']").unwrap();
        assert!(html.select(&name_input).next().is_some());
        assert!(html.select(&color_input).next().is_some());
    }
}
