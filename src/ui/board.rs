use iced::widget::{button, column, container, image, scrollable, stack, text};
use iced::{alignment, Alignment, ContentFit, Element, Length, Theme};
use iced_aw::Wrap;

use crate::state::cards::RenderedCard;
use crate::state::loader::{LoadState, MediaElement};
use crate::state::viewport::{GRID_SPACING, TILE_HEIGHT, TILE_WIDTH};
use crate::Message;

/// Media area inside the tile; the rest is caption and padding.
const MEDIA_SLOT_HEIGHT: f32 = 240.0;

/// The scrollable card grid. Tiles have a fixed pitch so the wrap layout
/// and the visibility geometry in `state::viewport` agree on where every
/// card sits.
pub fn board<'a>(cards: impl Iterator<Item = &'a RenderedCard>) -> Element<'a, Message> {
    let tiles: Vec<Element<'a, Message>> = cards.map(card_view).collect();

    let grid = Wrap::with_elements(tiles)
        .spacing(GRID_SPACING)
        .line_spacing(GRID_SPACING);

    scrollable(grid)
        .on_scroll(Message::GridScrolled)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

pub fn empty_state<'a>() -> Element<'a, Message> {
    let body = column![
        text("Nothing pinned yet").size(22),
        text("Media will appear here as soon as the library syncs.").size(14),
    ]
    .spacing(8.0)
    .align_x(Alignment::Center);

    container(body)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

pub fn error_state(message: &str) -> Element<'_, Message> {
    let body = column![
        text("The library is unreachable").size(22),
        text(message).size(14).style(|theme: &Theme| text::Style {
            color: Some(theme.extended_palette().danger.base.color),
        }),
    ]
    .spacing(8.0)
    .align_x(Alignment::Center);

    container(body)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

fn card_view(card: &RenderedCard) -> Element<'_, Message> {
    let media: Element<Message> = match &card.media {
        MediaElement::Image(element) => match (&element.handle, element.state) {
            (Some(handle), _) => image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Cover)
                .into(),
            (None, LoadState::Ready) => media_placeholder("unavailable"),
            _ => media_placeholder("…"),
        },
        MediaElement::Video(element) => {
            let poster: Element<Message> = match (&element.poster, element.state) {
                (Some(handle), _) => image(handle.clone())
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .content_fit(ContentFit::Cover)
                    .into(),
                (None, LoadState::Ready) => media_placeholder("video"),
                _ => media_placeholder("…"),
            };

            let badge = container(text(if element.playing { "▶" } else { "❚❚" }).size(13))
                .padding([2.0, 8.0])
                .style(badge_style);

            stack![
                poster,
                container(badge)
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .align_x(alignment::Horizontal::Left)
                    .align_y(alignment::Vertical::Bottom)
                    .padding(8.0),
            ]
            .into()
        }
    };

    let body = column![
        container(media)
            .width(Length::Fill)
            .height(Length::Fixed(MEDIA_SLOT_HEIGHT))
            .clip(true)
            .style(slot_style),
        text(&card.label).size(13),
    ]
    .spacing(8.0);

    let is_new = card.is_new;
    button(body)
        .on_press(Message::CardPressed(card.name.clone()))
        .padding(10.0)
        .width(Length::Fixed(TILE_WIDTH))
        .height(Length::Fixed(TILE_HEIGHT))
        .style(move |theme: &Theme, _status| card_style(theme, is_new))
        .into()
}

fn media_placeholder(label: &str) -> Element<'_, Message> {
    container(text(label).size(14))
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

fn card_style(theme: &Theme, is_new: bool) -> button::Style {
    let palette = theme.extended_palette();
    let border_color = if is_new {
        palette.primary.strong.color
    } else {
        palette.background.strong.color
    };

    button::Style {
        background: Some(palette.background.weak.color.into()),
        text_color: palette.background.weak.text,
        border: iced::Border {
            color: border_color,
            width: if is_new { 2.0 } else { 1.0 },
            radius: 12.0.into(),
        },
        ..button::Style::default()
    }
}

fn slot_style(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style {
        background: Some(palette.background.base.color.into()),
        border: iced::border::rounded(8.0),
        ..container::Style::default()
    }
}

fn badge_style(_theme: &Theme) -> container::Style {
    container::Style {
        text_color: Some(iced::Color::WHITE),
        background: Some(iced::Color::from_rgba(0.0, 0.0, 0.0, 0.55).into()),
        border: iced::border::rounded(999.0),
        ..container::Style::default()
    }
}
