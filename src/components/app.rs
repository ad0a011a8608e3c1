use leptos::{component, view, IntoView};
use leptos_meta::{provide_meta_context, Stylesheet, Title};

use crate::components::train_viewer::TrainViewer;
use crate::config::AppConfig;

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = AppConfig::from_build_env();

    view! {
        <Stylesheet id="leptos" href="/pkg/train_reveal.css"/>
        <Title text="Train Reveal"/>

        <TrainViewer config=config />
    }
}
