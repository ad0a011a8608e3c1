use std::cell::Cell;
use std::rc::Rc;

use leptos::leptos_dom::helpers::{set_interval_with_handle, IntervalHandle};
use leptos::{
    component, create_memo, create_rw_signal, on_cleanup, spawn_local, store_value, view, For,
    IntoView, SignalGet, SignalSet, SignalUpdate, SignalWith,
};

use crate::api::{fetch_with_retry, HttpTrainSource};
use crate::config::AppConfig;
use crate::controller::{clip_path, FetchOutcome, RunId, TickOutcome, ViewState, VisualizationController};
use crate::dev_log;
use crate::models::TrainRecord;

type Controller = VisualizationController<IntervalHandle>;

/// Train buttons plus the layered background/foreground plot of the selected train
#[component]
#[must_use]
pub fn TrainViewer(config: AppConfig) -> impl IntoView {
    let poll_interval = config.poll_interval;
    let tick_interval = config.tick_interval;
    let refresh_on_select = config.refresh_on_select;

    let controller = store_value(Controller::new(&config));
    let source = store_value(HttpTrainSource::from_config(&config));
    let config = store_value(config);
    let view_state = create_rw_signal(ViewState::default());

    let trains = create_memo(move |_| view_state.with(|v| v.trains.clone()));
    let selected = create_memo(move |_| view_state.with(|v| v.selected.clone()));
    let hidden_percent = create_memo(move |_| view_state.with(|v| v.hidden_percent));

    let publish = move || {
        if let Some(snapshot) = controller.try_with_value(Controller::view_state) {
            view_state.set(snapshot);
        }
    };

    let refresh = move || {
        let Some(ticket) = controller.try_update_value(Controller::begin_fetch) else {
            return;
        };
        let Some(source) = source.try_get_value() else {
            return;
        };
        let policy = config.with_value(|c| c.retry);

        spawn_local(async move {
            let result = fetch_with_retry(&source, policy).await;
            let outcome = controller.try_update_value(|c| c.apply_fetch(ticket, result));
            if matches!(
                outcome,
                Some(FetchOutcome::Initialized { .. } | FetchOutcome::Replaced { .. })
            ) {
                publish();
            }
        });
    };

    let on_tick = move |run: RunId| {
        let Some(outcome) = controller.try_update_value(|c| c.tick(run)) else {
            return;
        };
        if outcome == TickOutcome::Ignored {
            return;
        }
        let Some((percent, animating)) =
            controller.try_with_value(|c| (c.hidden_percent(), c.is_animating()))
        else {
            return;
        };
        view_state.update(|v| {
            v.hidden_percent = percent;
            v.is_animating = animating;
        });
    };

    let on_animate = move |_| {
        let run = controller.try_update_value(|c| {
            c.animate(|run| set_interval_with_handle(move || on_tick(run), tick_interval).ok())
        });
        if let Some(Some(run)) = run {
            dev_log!("Started reveal run {:?}", run);
        }
        publish();
    };

    let on_select = move |train_id: String| {
        let changed = controller
            .try_update_value(|c| c.select(&train_id))
            .unwrap_or(false);
        publish();
        if changed && refresh_on_select {
            refresh();
        }
    };

    let alive = Rc::new(Cell::new(true));
    {
        let alive = Rc::clone(&alive);
        on_cleanup(move || {
            alive.set(false);
            controller.try_update_value(Controller::cancel_animation);
        });
    }

    spawn_local(async move {
        while alive.get() {
            refresh();
            gloo_timers::future::sleep(poll_interval).await;
        }
    });

    let image_url = move |path: &str| config.with_value(|c| c.image_url(path));

    view! {
        <div class="app-container">
            <div class="train-links">
                <button class="animate-button" on:click=on_animate>
                    "Animate"
                </button>
                <For
                    each=move || trains.get()
                    key=|train| train.id.clone()
                    children=move |train: TrainRecord| {
                        let id = train.id.clone();
                        let is_selected = move || {
                            selected.with(|s| s.as_ref().is_some_and(|t| t.id == id))
                        };
                        let click_id = train.id.clone();
                        view! {
                            <button
                                class="train-button"
                                class:highlighted=is_selected
                                on:click=move |_| on_select(click_id.clone())
                            >
                                {train.id}
                            </button>
                        }
                    }
                />
            </div>

            <div class="image-container">
                {move || selected.get().map(|train| view! {
                    <img
                        src=image_url(&train.background_img)
                        alt="Background Plot"
                        class="background-image"
                    />
                    <img
                        src=image_url(&train.foreground_img)
                        alt="Foreground Plot"
                        class="foreground-image"
                        style=move || format!("clip-path: {}", clip_path(hidden_percent.get()))
                    />
                })}
            </div>
        </div>
    }
}
