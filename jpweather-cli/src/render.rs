//! Plain-text views of a session: day summary, hourly table, weekly chart.

use chrono::NaiveDate;
use std::fmt::Write;

use jpweather_core::{
    DailySummary, HourlyRecord, Session,
    dates::{HorizonStatus, day_label},
    session::{AnalysisState, LoadState},
};

const BAR_WIDTH: usize = 24;

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.clamp(1, width))
}

/// Bar length for `value` on a scale starting at `lo`; never empty.
fn scaled_len(value: f64, lo: f64, span: f64, width: usize) -> usize {
    (((value - lo) / span) * width as f64).round() as usize + 1
}

pub fn horizon_notice(date: NaiveDate, horizon: HorizonStatus) -> Option<String> {
    (horizon == HorizonStatus::BeyondHorizon).then(|| {
        format!(
            "⚠ 選択された日付({date})は16日より先の未来のため、予報データがまだ生成されていません。\
             16日以内の日付を選択してください。"
        )
    })
}

pub fn day_summary(session: &Session, today: NaiveDate) -> String {
    let mut out = String::new();
    let horizon = session.horizon(today);
    let summary = session.selected_day_summary();

    let _ = writeln!(out, "{}  {}", session.location().label, session.date());
    let _ = writeln!(out, "  座標: {}", session.location().coordinate);

    match &summary {
        Some(s) => {
            let condition = s.condition.map_or("-", |c| c.label());
            let badge = if horizon.is_future() { "  [予報]" } else { "" };
            let _ = writeln!(out, "  天気: {condition}{badge}");
        }
        None => {
            let _ = writeln!(out, "  天気: No Data");
        }
    }

    let max = summary.as_ref().map_or("--.-".to_string(), |s| format!("{:.1}", s.max_temp));
    let min = summary.as_ref().map_or("--.-".to_string(), |s| format!("{:.1}", s.min_temp));
    let precip = summary.as_ref().map_or("-.-".to_string(), |s| format!("{:.1}", s.precipitation));
    let _ = writeln!(out, "  最高気温: {max}°C  最低気温: {min}°C  降水量: {precip}mm");

    if let Some(notice) = horizon_notice(session.date(), horizon) {
        let _ = writeln!(out, "{notice}");
    }
    out
}

pub fn hourly_table(records: &[HourlyRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<5} {:<8} {:>6} {:>6} {:>6} {:>5} {:>6} {:>5}",
        "時刻", "天気", "気温", "体感", "降水", "湿度", "風速", "降確"
    );
    for r in records {
        let _ = writeln!(
            out,
            "{:<5} {:<8} {:>6} {:>6} {:>6} {:>5} {:>6} {:>5}",
            r.time.format("%H:%M"),
            r.weather_code.map_or("-", |c| c.label()),
            fmt_opt(r.temperature_2m, 1),
            fmt_opt(r.apparent_temperature, 1),
            fmt_opt(r.precipitation, 1),
            fmt_opt(r.relative_humidity_2m, 0),
            fmt_opt(r.wind_speed_10m, 1),
            fmt_opt(r.precipitation_probability, 0),
        );
    }
    out
}

/// Temperature trace for the day, one bar per hour.
pub fn hourly_chart(records: &[HourlyRecord]) -> String {
    let mut out = String::new();
    let temps: Vec<f64> = records.iter().filter_map(|r| r.temperature_2m).collect();
    let (Some(lo), Some(hi)) = (
        temps.iter().copied().reduce(f64::min),
        temps.iter().copied().reduce(f64::max),
    ) else {
        return out;
    };
    let span = (hi - lo).max(1.0);

    for r in records {
        let temp = r.temperature_2m;
        let len = temp.map_or(0, |t| scaled_len(t, lo, span, BAR_WIDTH));
        let rain = r.precipitation.filter(|p| *p > 0.0).map_or(String::new(), |p| format!(" ☂{p:.1}"));
        let _ = writeln!(
            out,
            "{} {:<width$} {:>5}°C{rain}",
            r.time.format("%H"),
            "▆".repeat(len),
            fmt_opt(temp, 1),
            width = BAR_WIDTH + 1,
        );
    }
    out
}

pub fn weekly_chart(summaries: &[DailySummary], selected: NaiveDate) -> String {
    let mut out = String::new();
    if summaries.is_empty() {
        return out;
    }
    // Bars start at the week's low so sub-zero weeks still draw.
    let lo = summaries.iter().map(|s| s.min_temp).fold(f64::INFINITY, f64::min);
    let hi = summaries.iter().map(|s| s.max_temp).fold(f64::NEG_INFINITY, f64::max);
    let span = (hi - lo).max(1.0);
    let half = BAR_WIDTH / 2;
    let max_precip = summaries.iter().map(|s| s.precipitation).fold(0.0, f64::max);

    let _ = writeln!(out, "週間サマリー");
    for s in summaries {
        let marker = if s.date == selected { "▶" } else { " " };
        let condition = s.condition.map_or("-", |c| c.label());
        let _ = writeln!(
            out,
            "{marker}{:<8} {:<6} {:>5.1}/{:>5.1}°C {:<width$} {:>5.1}mm {}",
            day_label(s.date),
            condition,
            s.max_temp,
            s.min_temp,
            "█".repeat(scaled_len(s.max_temp, lo, span, half - 1)),
            s.precipitation,
            bar(s.precipitation, max_precip, half),
            width = half,
        );
    }
    out
}

pub fn analysis(state: &AnalysisState) -> Option<String> {
    match state {
        AnalysisState::Idle => None,
        AnalysisState::Analyzing => Some("生成中...".to_string()),
        AnalysisState::Succeeded(text) => Some(format!("Climate Intelligence Report\n\n{text}")),
        AnalysisState::Failed(text) => Some(text.clone()),
    }
}

/// Everything the dashboard shows for the current state.
pub fn session_view(session: &Session, today: NaiveDate) -> String {
    match session.load_state() {
        LoadState::Idle | LoadState::Loading => "気象情報を取得中...\n".to_string(),
        LoadState::Failed(message) => {
            format!("エラーが発生しました\n{message}\n(再読み込みで再試行できます)\n")
        }
        LoadState::Loaded => {
            let mut out = day_summary(session, today);
            let hourly = session.hourly_for_selected_day();
            out.push('\n');
            if hourly.is_empty() {
                if session.horizon(today) != HorizonStatus::BeyondHorizon {
                    out.push_str("この日の詳細データは見つかりませんでした。\n");
                }
            } else {
                out.push_str(&hourly_chart(&hourly));
                out.push('\n');
                out.push_str(&hourly_table(&hourly));
            }
            let weekly = weekly_chart(&session.daily_summaries(), session.date());
            if !weekly.is_empty() {
                out.push('\n');
                out.push_str(&weekly);
            }
            if let Some(text) = analysis(session.analysis_state()) {
                out.push('\n');
                out.push_str(&text);
                out.push('\n');
            }
            out
        }
    }
}
