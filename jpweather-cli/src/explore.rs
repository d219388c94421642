//! Interactive dashboard loop driven by the session reducer.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Weekday};
use inquire::{CustomType, DateSelect, Select};
use std::fmt;

use jpweather_core::{
    Coordinate, Event, Location, Session,
    cities::JAPANESE_CITIES,
    session::LoadState,
};

use crate::{app::App, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ChangeCity,
    PickPoint,
    ChangeDate,
    Analyze,
    Retry,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::ChangeCity => "地点を選択",
            Action::PickPoint => "座標を指定",
            Action::ChangeDate => "日付を変更",
            Action::Analyze => "AI分析を実行",
            Action::Retry => "再読み込み",
            Action::Quit => "終了",
        })
    }
}

/// Actions offered for the current state; analyze only when it would run.
fn available_actions(session: &Session, can_narrate: bool) -> Vec<Action> {
    let mut actions = vec![Action::ChangeCity, Action::PickPoint, Action::ChangeDate];
    if can_narrate && session.can_analyze() {
        actions.push(Action::Analyze);
    }
    if matches!(session.load_state(), LoadState::Failed(_)) {
        actions.insert(0, Action::Retry);
    }
    actions.push(Action::Quit);
    actions
}

/// Pick-point event, or `None` when the coordinate is off the globe.
fn point_event(latitude: f64, longitude: f64) -> Option<Event> {
    let coordinate = Coordinate::new(latitude, longitude);
    coordinate.is_valid().then_some(Event::PickPoint(coordinate))
}

pub async fn run(app: &App, location: Location, date: NaiveDate) -> Result<()> {
    let (session, effect) = Session::start(location, date);
    let mut session = app.settle(session, Some(effect)).await;

    loop {
        println!();
        print!("{}", render::session_view(&session, app.today()));
        println!();

        let actions = available_actions(&session, app.can_narrate());
        let action = Select::new("操作を選択:", actions)
            .prompt()
            .context("Failed to read action")?;

        let event = match action {
            Action::Quit => return Ok(()),
            Action::Retry => Event::Retry,
            Action::Analyze => Event::AnalyzeRequested,
            Action::ChangeCity => {
                let labels: Vec<&str> = JAPANESE_CITIES.iter().map(|c| c.label).collect();
                let label = Select::new("地点:", labels)
                    .prompt()
                    .context("Failed to read city")?;
                Event::SelectCity(label.to_string())
            }
            Action::PickPoint => {
                let current = session.location().coordinate;
                let latitude = CustomType::<f64>::new("緯度:")
                    .with_default(current.latitude)
                    .with_error_message("数値を入力してください")
                    .prompt()
                    .context("Failed to read latitude")?;
                let longitude = CustomType::<f64>::new("経度:")
                    .with_default(current.longitude)
                    .with_error_message("数値を入力してください")
                    .prompt()
                    .context("Failed to read longitude")?;
                match point_event(latitude, longitude) {
                    Some(event) => event,
                    None => {
                        println!("座標が範囲外です: {latitude}, {longitude}");
                        continue;
                    }
                }
            }
            Action::ChangeDate => {
                let date = DateSelect::new("日付:")
                    .with_default(session.date())
                    .with_week_start(Weekday::Sun)
                    .prompt()
                    .context("Failed to read date")?;
                Event::SelectDate(date)
            }
        };

        if action == Action::Analyze {
            println!("生成中...");
        }
        let (next, effect) = session.update(event);
        session = app.settle(next, effect).await;
    }
}
