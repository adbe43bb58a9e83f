//! Defines the endpoint for creating a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryId,
    endpoints,
    expense::{Amount, Expense, core::create_expense},
    timezone::local_today,
};

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating an expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    /// The value of the expense in dollars.
    pub amount: f64,
    /// The date when the money was spent.
    pub date: Date,
    /// Text detailing the expense.
    pub description: String,
    /// The ID of the category to file this expense under.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// A route handler for creating a new expense, redirects to the dashboard on
/// success.
///
/// The owning user is taken from the request extension inserted by the auth
/// middleware, so an expense can only ever be created for the logged-in user.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExpenseForm>,
) -> impl IntoResponse {
    let amount = match Amount::new(form.amount) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let description = form.description.trim();
    if description.is_empty() {
        return Error::EmptyDescription.into_alert_response();
    }

    let today = match local_today(&state.local_timezone) {
        Some(today) => today,
        None => {
            return Error::InvalidTimezoneError(state.local_timezone.clone())
                .into_alert_response();
        }
    };
    if form.date > today {
        return Error::FutureDate(form.date).into_alert_response();
    }

    let expense =
        Expense::build(amount, form.date, description).category_id(form.category_id);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_expense(expense, user_id, &connection) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, body::Body, extract::State, http::Response, response::IntoResponse};
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        auth::{Email, PasswordHash, UserID, create_user},
        category::{CategoryName, create_category},
        db::initialize,
        expense::{count_expenses, get_expense},
    };

    use super::{CreateExpenseState, ExpenseForm, create_expense_endpoint};

    fn get_test_state() -> (CreateExpenseState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let user = create_user(
            Email::new_unchecked("jane@example.com"),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        (
            CreateExpenseState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
        )
    }

    #[track_caller]
    fn assert_redirects_to_dashboard(response: Response<Body>) {
        let location = response
            .headers()
            .get(HX_REDIRECT)
            .expect("expected response to have the header hx-redirect");
        assert_eq!(
            location, "/dashboard",
            "got redirect to {location:?}, want redirect to /dashboard"
        );
    }

    #[tokio::test]
    async fn can_create_expense() {
        let (state, user_id) = get_test_state();

        let form = ExpenseForm {
            amount: 12.3,
            date: OffsetDateTime::now_utc().date(),
            description: "test expense".to_string(),
            category_id: None,
        };

        let response =
            create_expense_endpoint(State(state.clone()), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_redirects_to_dashboard(response);

        // Verify the expense was actually created by getting it by ID
        // We know the first expense will have ID 1
        let connection = state.db_connection.lock().unwrap();
        let expense = get_expense(1, &connection).unwrap();
        assert_eq!(expense.amount, 12.3);
        assert_eq!(expense.description, "test expense");
        assert_eq!(expense.user_id, user_id);
    }

    #[tokio::test]
    async fn can_create_expense_with_category() {
        let (state, user_id) = get_test_state();
        let category = {
            let connection = state.db_connection.lock().unwrap();
            create_category(CategoryName::new_unchecked("Groceries"), "#ef4444", &connection)
                .unwrap()
        };

        let form = ExpenseForm {
            amount: 25.50,
            date: OffsetDateTime::now_utc().date(),
            description: "test expense with category".to_string(),
            category_id: Some(category.id),
        };
        let response =
            create_expense_endpoint(State(state.clone()), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_redirects_to_dashboard(response);

        let connection = state.db_connection.lock().unwrap();
        let expense = get_expense(1, &connection).unwrap();
        assert_eq!(expense.category_id, Some(category.id));
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let (state, user_id) = get_test_state();

        for amount in [0.0, -12.3] {
            let form = ExpenseForm {
                amount,
                date: OffsetDateTime::now_utc().date(),
                description: "bad amount".to_string(),
                category_id: None,
            };

            let response =
                create_expense_endpoint(State(state.clone()), Extension(user_id), Form(form))
                    .await
                    .into_response();

            assert_eq!(response.status(), 400, "amount {amount} should be rejected");
        }

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_expenses(user_id, &connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_empty_description() {
        let (state, user_id) = get_test_state();

        let form = ExpenseForm {
            amount: 12.3,
            date: OffsetDateTime::now_utc().date(),
            description: "   ".to_string(),
            category_id: None,
        };

        let response =
            create_expense_endpoint(State(state.clone()), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), 400);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_expenses(user_id, &connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_future_date() {
        let (state, user_id) = get_test_state();

        let form = ExpenseForm {
            amount: 12.3,
            date: OffsetDateTime::now_utc().date() + Duration::days(2),
            description: "time travel".to_string(),
            category_id: None,
        };

        let response =
            create_expense_endpoint(State(state.clone()), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), 400);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_expenses(user_id, &connection).unwrap(), 0);
    }

    #[test]
    fn form_parses_empty_category_as_none() {
        let form: ExpenseForm = serde_html_form::from_str(
            "amount=12.3&date=2024-01-05&description=coffee&category_id=",
        )
        .unwrap();

        assert_eq!(form.category_id, None);

        let form: ExpenseForm = serde_html_form::from_str(
            "amount=12.3&date=2024-01-05&description=coffee&category_id=2",
        )
        .unwrap();

        assert_eq!(form.category_id, Some(2));
    }
}
