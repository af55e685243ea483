use iced::widget::{button, column, container, row, text, Space};
use iced::{Alignment, Element, Length, Theme};

use crate::state::sync::{MetaPanel, StatusLevel, StatusPill};
use crate::Message;

/// Title row with the status pill, plus the aggregate meta line.
pub fn header<'a>(status: &'a StatusPill, meta: &'a MetaPanel) -> Element<'a, Message> {
    let refresh = button(text("Refresh").size(13))
        .on_press(Message::RefreshRequested)
        .padding([5.0, 12.0])
        .style(button::secondary);

    let top = row![
        text("Pinboard").size(30),
        Space::with_width(Length::Fill),
        status_pill(status),
        refresh,
    ]
    .spacing(12.0)
    .align_y(Alignment::Center);

    let meta_row = row![
        meta_entry("Pieces", meta.count.to_string()),
        meta_entry("Started", meta.started.value().to_string()),
        meta_entry("Updated", meta.modified.value().to_string()),
        meta_entry("Library", meta.length.value().to_string()),
    ]
    .spacing(24.0);

    column![top, meta_row].spacing(10.0).into()
}

fn status_pill(status: &StatusPill) -> Element<'_, Message> {
    let level = status.level;

    container(text(&status.message).size(13))
        .padding([5.0, 12.0])
        .style(move |theme: &Theme| {
            let palette = theme.extended_palette();
            let pair = match level {
                StatusLevel::Live => palette.success.base,
                StatusLevel::Error => palette.danger.base,
                StatusLevel::Loading => palette.background.strong,
            };
            container::Style {
                text_color: Some(pair.text),
                background: Some(pair.color.into()),
                border: iced::border::rounded(999.0),
                ..container::Style::default()
            }
        })
        .into()
}

fn meta_entry<'a>(label: &'a str, value: String) -> Element<'a, Message> {
    row![
        text(label).size(12).style(|theme: &Theme| text::Style {
            color: Some(theme.extended_palette().background.strong.color),
        }),
        text(value).size(13),
    ]
    .spacing(6.0)
    .align_y(Alignment::Center)
    .into()
}
