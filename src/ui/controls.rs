use iced::widget::{button, column, container, pick_list, row, slider, text, text_input};
use iced::{Alignment, Element, Length};
use std::fmt;

use crate::state::{OverlayState, Preset};
use crate::Message;

/// Entry of the preset picker, with "None" as the no-selection sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetChoice {
    None,
    Saved(usize, Preset),
}

impl PresetChoice {
    pub fn index(&self) -> Option<usize> {
        match self {
            PresetChoice::None => None,
            PresetChoice::Saved(index, _) => Some(*index),
        }
    }
}

impl fmt::Display for PresetChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetChoice::None => f.write_str("None"),
            PresetChoice::Saved(_, preset) => write!(f, "{}", preset),
        }
    }
}

/// Picker entries for the current preset list
pub fn preset_choices(presets: &[Preset]) -> Vec<PresetChoice> {
    std::iter::once(PresetChoice::None)
        .chain(
            presets
                .iter()
                .enumerate()
                .map(|(i, preset)| PresetChoice::Saved(i, *preset)),
        )
        .collect()
}

/// Side panel with dimensions, opacity and presets
pub fn panel<'a>(
    state: &'a OverlayState,
    width_input: &'a str,
    height_input: &'a str,
) -> Element<'a, Message> {
    let active = state.active_preset();
    let selected = active
        .map(|i| PresetChoice::Saved(i, state.presets[i]))
        .unwrap_or(PresetChoice::None);

    let remove = button("Delete").on_press_maybe(active.map(Message::RemovePreset));

    column![
        column![
            text("Width"),
            text_input("1920", width_input).on_input(Message::WidthChanged),
        ]
        .spacing(4),
        column![
            text("Height"),
            text_input("1080", height_input).on_input(Message::HeightChanged),
        ]
        .spacing(4),
        column![
            text("Opacity"),
            row![
                slider(0..=100, state.opacity, Message::OpacityChanged),
                text(format!("{}%", state.opacity)).width(Length::Fixed(44.0)),
            ]
            .spacing(8)
            .align_y(Alignment::Center),
        ]
        .spacing(4),
        column![
            text("Presets"),
            pick_list(
                preset_choices(&state.presets),
                Some(selected),
                Message::PresetSelected
            )
            .width(Length::Fill),
            row![button("Save current").on_press(Message::AddPreset), remove].spacing(8),
        ]
        .spacing(4),
    ]
    .spacing(16)
    .padding(16)
    .width(Length::Fixed(260.0))
    .into()
}

/// URL entry under the stage, or the active URL with a remove button
pub fn url_bar<'a>(overlay_url: Option<&'a str>, url_input: &'a str) -> Element<'a, Message> {
    let content: Element<'a, Message> = match overlay_url {
        Some(url) => row![
            text(url),
            button("Remove URL").on_press(Message::ClearUrl),
        ]
        .spacing(12)
        .align_y(Alignment::Center)
        .into(),
        None => row![
            text_input("http://localhost:3000/screenshot.png", url_input)
                .on_input(Message::UrlInputChanged)
                .on_submit(Message::SubmitUrl)
                .width(Length::Fixed(420.0)),
            button("Add url").on_press(Message::SubmitUrl),
        ]
        .spacing(8)
        .align_y(Alignment::Center)
        .into(),
    };

    container(content).padding([12, 0]).into()
}
