use iced::widget::{button, column, container, image, row, stack, text, Space};
use iced::{Alignment, ContentFit, Element, Length, Theme};

use crate::media::descriptor;
use crate::state::lightbox::{LightboxDisplay, LightboxSession};
use crate::Message;

const FRAME_WIDTH: f32 = 860.0;
const FRAME_HEIGHT: f32 = 560.0;

/// The modal panel shown over the board while a session is open. The
/// caller wraps it in the dimmed, click-to-close backdrop.
pub fn overlay<'a>(session: &'a LightboxSession, can_navigate: bool) -> Element<'a, Message> {
    let close = button(text("✕").size(15))
        .on_press(Message::LightboxClosed)
        .padding([5.0, 11.0])
        .style(button::secondary);

    let title_row = row![
        text(descriptor::display_label(&session.name)).size(16),
        Space::with_width(Length::Fill),
        close,
    ]
    .spacing(12.0)
    .align_y(Alignment::Center);

    let media = container(media_view(&session.display))
        .width(Length::Fixed(FRAME_WIDTH))
        .height(Length::Fixed(FRAME_HEIGHT))
        .clip(true)
        .style(|theme: &Theme| container::Style {
            background: Some(theme.extended_palette().background.base.color.into()),
            border: iced::border::rounded(10.0),
            ..container::Style::default()
        });

    let mut body = column![title_row, media].spacing(12.0);

    // Prev/next only exist when there is somewhere to go.
    if can_navigate {
        let prev = button(text("‹").size(20))
            .on_press(Message::LightboxNavigate(-1))
            .padding([4.0, 14.0])
            .style(button::secondary);
        let next = button(text("›").size(20))
            .on_press(Message::LightboxNavigate(1))
            .padding([4.0, 14.0])
            .style(button::secondary);

        body = body.push(
            row![prev, Space::with_width(Length::Fill), next].align_y(Alignment::Center),
        );
    }

    container(body)
        .padding(16.0)
        .style(|theme: &Theme| container::Style {
            background: Some(theme.extended_palette().background.weak.color.into()),
            border: iced::border::rounded(14.0),
            ..container::Style::default()
        })
        .into()
}

fn media_view(display: &LightboxDisplay) -> Element<'_, Message> {
    match display {
        LightboxDisplay::Image { handle: Some(handle), loading } => {
            let picture: Element<Message> = image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Contain)
                .into();
            if *loading {
                stack![picture, corner_badge("Loading…")].into()
            } else {
                picture
            }
        }
        LightboxDisplay::Image { handle: None, .. } => centered_note("Loading…"),
        LightboxDisplay::Video {
            poster, playing, ..
        } => {
            let backdrop: Element<Message> = match poster {
                Some(handle) => image(handle.clone())
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .content_fit(ContentFit::Contain)
                    .into(),
                None => centered_note("video"),
            };
            let label = if *playing { "▶ playing • muted loop" } else { "❚❚ paused" };
            stack![backdrop, corner_badge(label)].into()
        }
    }
}

fn corner_badge(label: &str) -> Element<'_, Message> {
    container(
        container(text(label).size(13))
            .padding([3.0, 10.0])
            .style(|_theme: &Theme| container::Style {
                text_color: Some(iced::Color::WHITE),
                background: Some(iced::Color::from_rgba(0.0, 0.0, 0.0, 0.55).into()),
                border: iced::border::rounded(999.0),
                ..container::Style::default()
            }),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .align_x(iced::alignment::Horizontal::Left)
    .align_y(iced::alignment::Vertical::Bottom)
    .padding(10.0)
    .into()
}

fn centered_note(label: &str) -> Element<'_, Message> {
    container(text(label).size(15))
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
