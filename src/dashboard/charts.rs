//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations for spending data:
//! - **Monthly Trend Chart**: Spending per month over the selected range
//! - **Category Chart**: Total spending per category
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization
//! code.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger,
    },
    series::{Line, bar},
};
use maud::PreEscaped;
use time::{Date, Month};

use crate::{
    dashboard::stats::{CategoryTotal, MonthlyTotal},
    html::HeadElement,
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Creates the array of dashboard charts from aggregated statistics.
pub(super) fn build_dashboard_charts(
    monthly_series: &[MonthlyTotal],
    category_breakdown: &[CategoryTotal],
) -> [DashboardChart; 2] {
    [
        DashboardChart {
            id: "monthly-trend-chart",
            options: monthly_trend_chart(monthly_series).to_string(),
        },
        DashboardChart {
            id: "category-chart",
            options: category_chart(category_breakdown).to_string(),
        },
    ]
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Formats month dates as three-letter abbreviations, e.g. "Jan", "Feb".
fn format_month_labels(months: impl Iterator<Item = Date>) -> Vec<String> {
    let month_to_str = |date: Date| {
        match date.month() {
            Month::January => "Jan",
            Month::February => "Feb",
            Month::March => "Mar",
            Month::April => "Apr",
            Month::May => "May",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Aug",
            Month::September => "Sep",
            Month::October => "Oct",
            Month::November => "Nov",
            Month::December => "Dec",
        }
        .to_string()
    };

    months.map(month_to_str).collect()
}

fn monthly_trend_chart(monthly_series: &[MonthlyTotal]) -> Chart {
    let labels = format_month_labels(monthly_series.iter().map(|entry| entry.month));
    let values: Vec<f64> = monthly_series.iter().map(|entry| entry.amount).collect();

    Chart::new()
        .title(Title::new().text("Monthly Trend").subtext("Spending per month"))
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Spending").data(values))
}

fn category_chart(category_breakdown: &[CategoryTotal]) -> Chart {
    let labels: Vec<String> = category_breakdown
        .iter()
        .map(|entry| entry.category.clone())
        .collect();
    let values: Vec<f64> = category_breakdown
        .iter()
        .map(|entry| entry.amount)
        .collect();

    Chart::new()
        .title(
            Title::new()
                .text("By Category")
                .subtext("Total spending per category"),
        )
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(bar::Bar::new().name("Spending").data(values))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
