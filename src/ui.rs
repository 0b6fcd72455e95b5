use crate::calendar::{CalendarCell, CalendarWidget, DayCell, MonthGrid, RUN_MARKER};
use crate::controller::{Controller, DayDetail, StatusKind};
use crate::dates::date_key;
use crate::store::RunStore;
use chrono::{Datelike, TimeZone, Utc};
use std::fmt::Write;
use std::time::Instant;

pub fn render_index<S: RunStore, Tz: TimeZone>(
    controller: &Controller<S, MonthGrid<Tz>>,
    now: Instant,
) -> String {
    let grid = controller.widget();
    let today = Utc::now().with_timezone(grid.timezone()).date_naive();

    let (status, status_type) = match controller.status(now) {
        Some(status) => (
            escape_html(&status.message),
            match status.kind {
                StatusKind::Info => "info",
                StatusKind::Success => "ok",
                StatusKind::Error => "error",
            },
        ),
        None => (String::new(), ""),
    };
    let sticky = if controller.form_enabled() { "false" } else { "true" };
    let form_hidden = if controller.form_enabled() { "" } else { "hidden" };
    let selected = controller.selected().map(DayDetail::date);

    INDEX_HTML
        .replace("{{TODAY}}", &date_key(today))
        .replace("{{FORM_HIDDEN}}", form_hidden)
        .replace("{{STATUS_TYPE}}", status_type)
        .replace("{{STATUS_STICKY}}", sticky)
        .replace("{{STATUS_TTL_MS}}", &controller.status_ttl().as_millis().to_string())
        .replace("{{MONTH_TITLE}}", &escape_html(&grid.title()))
        .replace("{{CALENDAR}}", &render_calendar(grid, selected))
        .replace("{{DETAIL}}", &render_detail(controller.selected()))
        .replace("{{STATUS}}", &status)
}

fn render_calendar<Tz: TimeZone>(grid: &MonthGrid<Tz>, selected: Option<&str>) -> String {
    let mut html = String::from("<table class=\"calendar\"><thead><tr>");
    for day in ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"] {
        let _ = write!(html, "<th>{day}</th>");
    }
    html.push_str("</tr></thead><tbody>");
    for week in grid.weeks() {
        html.push_str("<tr>");
        for cell in week {
            render_cell(&mut html, cell, selected);
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn render_cell(html: &mut String, cell: &DayCell, selected: Option<&str>) {
    let key = date_key(cell.date());
    let mut classes: Vec<&str> = vec!["day"];
    classes.extend(cell.classes());
    if !cell.in_month() {
        classes.push("other-month");
    }
    if selected == Some(key.as_str()) {
        classes.push("selected");
    }

    let _ = write!(html, "<td class=\"{}\"", classes.join(" "));
    if let Some(run_date) = cell.run_date() {
        let _ = write!(html, " data-run-date=\"{}\"", escape_html(run_date));
    }
    if cell.in_month() {
        let title = if cell.has_marker(RUN_MARKER) { " title=\"Run logged\"" } else { "" };
        let _ = write!(
            html,
            "><a href=\"/calendar/select?date={key}\"{title}>{}</a></td>",
            cell.date().day()
        );
    } else {
        let _ = write!(html, ">{}</td>", cell.date().day());
    }
}

fn render_detail(detail: Option<&DayDetail>) -> String {
    let Some(detail) = detail else {
        return "Click on a date with a run (marked) to see details.".to_string();
    };

    match detail.total_line() {
        None => escape_html(&detail.heading()),
        Some(total) => {
            let mut html = format!("<strong>{}</strong><ul>", escape_html(&detail.heading()));
            for line in detail.item_lines() {
                let _ = write!(html, "<li>{line}</li>");
            }
            let _ = write!(html, "</ul><strong>{total}</strong>");
            html
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Running Log</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef5ef;
      --bg-2: #b9e0c6;
      --ink: #23302a;
      --accent: #2f8f5b;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e3f1e7 60%, #f4f8f4 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(760px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    form.run-form {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: end;
    }

    form.run-form[hidden] {
      display: none;
    }

    label {
      display: grid;
      gap: 6px;
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #6f7a73;
    }

    input {
      font: inherit;
      padding: 10px 14px;
      border-radius: 14px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    .nav {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    .nav form {
      margin: 0;
    }

    .nav button {
      background: var(--accent-2);
      padding: 8px 14px;
    }

    .nav h2 {
      margin: 0;
      font-size: 1.3rem;
    }

    table.calendar {
      width: 100%;
      border-collapse: separate;
      border-spacing: 6px;
      text-align: center;
    }

    .calendar th {
      font-size: 0.8rem;
      color: #7a746d;
    }

    .calendar td {
      background: white;
      border-radius: 12px;
      padding: 10px 0;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .calendar td a {
      color: inherit;
      text-decoration: none;
      display: block;
    }

    .calendar td.other-month {
      color: #b5b0aa;
      background: transparent;
    }

    .calendar td.has-run {
      background: var(--accent);
      color: white;
      font-weight: 600;
    }

    .calendar td.selected {
      outline: 2px solid var(--accent-2);
    }

    .detail {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .status {
      font-size: 0.95rem;
      color: #6b645d;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Running Log</h1>
    </header>

    <form class="run-form" id="run-form" method="post" action="/runs" {{FORM_HIDDEN}}>
      <label>Date
        <input id="run-date" name="date" type="date" value="{{TODAY}}" required />
      </label>
      <label>Kilometers
        <input id="run-km" name="kilometers" type="number" step="0.1" min="0.1" required />
      </label>
      <button type="submit">Log run</button>
    </form>

    <div class="status" id="status" data-type="{{STATUS_TYPE}}" data-sticky="{{STATUS_STICKY}}">{{STATUS}}</div>

    <section>
      <div class="nav">
        <form method="post" action="/calendar/prev"><button type="submit">&larr;</button></form>
        <h2>{{MONTH_TITLE}}</h2>
        <form method="post" action="/calendar/today"><button type="submit">Today</button></form>
        <form method="post" action="/calendar/next"><button type="submit">&rarr;</button></form>
      </div>
      <div id="calendar">{{CALENDAR}}</div>
    </section>

    <section class="detail" id="selected-day-info">{{DETAIL}}</section>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    if (statusEl.textContent && statusEl.dataset.sticky !== 'true') {
      const shown = statusEl.textContent;
      setTimeout(() => {
        if (statusEl.textContent === shown) {
          statusEl.textContent = '';
          statusEl.dataset.type = '';
        }
      }, {{STATUS_TTL_MS}});
    }
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Run;
    use crate::store::StoreError;
    use chrono::FixedOffset;
    use std::time::Duration;

    struct FixedStore(Vec<Run>);

    impl RunStore for FixedStore {
        async fn query(&self) -> Result<Vec<Run>, StoreError> {
            Ok(self.0.clone())
        }

        async fn insert(&self, run: Run) -> Result<Run, StoreError> {
            Ok(run)
        }
    }

    async fn loaded(runs: Vec<Run>) -> Controller<FixedStore, MonthGrid<FixedOffset>> {
        let grid = MonthGrid::new(FixedOffset::east_opt(0).unwrap(), 2024, 3).unwrap();
        let mut controller = Controller::new(FixedStore(runs), grid, Duration::from_secs(3));
        controller.load().await.unwrap();
        controller
    }

    #[tokio::test]
    async fn index_marks_days_with_runs() {
        let controller = loaded(vec![Run::new("2024-03-01", 5.0)]).await;
        let html = render_index(&controller, Instant::now());

        assert!(html.contains(r#"<td class="day has-run" data-run-date="2024-03-01">"#));
        assert!(html.contains("March 2024"));
        assert!(html.contains("Click on a date with a run"));
        assert!(!html.contains("{{"));
    }

    #[tokio::test]
    async fn index_shows_selected_day_detail() {
        let mut controller =
            loaded(vec![Run::new("2024-03-01", 5.0), Run::new("2024-03-01", 3.5)]).await;
        controller.select_date("2024-03-01").unwrap();

        let html = render_index(&controller, Instant::now());

        assert!(html.contains("<strong>Runs on 2024-03-01:</strong>"));
        assert!(html.contains("<li>5.0 km</li><li>3.5 km</li>"));
        assert!(html.contains("<strong>Total: 8.5 km</strong>"));
        assert!(html.contains("day has-run selected"));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom's" & co</b>"#),
            "&lt;b&gt;&quot;Tom&#39;s&quot; &amp; co&lt;/b&gt;"
        );
    }
}
